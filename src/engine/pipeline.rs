use crate::error::ProbeError;
use crate::model::{ProbeConfig, ProbeTarget, ProxyData, Stage};
use crate::probe::{self, http};
use std::future::Future;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use super::reader::ResponseReader;

/// Runs `fut` until `deadline`; expiry is reported as a timeout in `stage`.
pub(crate) async fn within<T, F>(deadline: Instant, stage: Stage, fut: F) -> Result<T, ProbeError>
where
    F: Future<Output = Result<T, ProbeError>>,
{
    timeout_at(deadline, fut)
        .await
        .map_err(|_| ProbeError::Timeout { stage })?
}

/// Connect, handshake, request, response, parse. Strictly in that order.
pub(crate) async fn run(
    target: &ProbeTarget,
    cfg: &ProbeConfig,
    start: Instant,
) -> Result<ProxyData, ProbeError> {
    let deadline = start + cfg.overall_timeout;
    let connect_deadline = (start + cfg.connect_timeout).min(deadline);

    let stream = within(connect_deadline, Stage::Connect, connect(target)).await?;
    debug!(target = %target, ms = start.elapsed().as_millis() as u64, "tcp connected");

    let mut tls_stream = within(
        deadline,
        Stage::Tls,
        probe::handshake(stream, &cfg.reference_host),
    )
    .await?;
    let info = probe::extract_tls_info(&tls_stream);
    debug!(
        version = %info.version,
        cipher = %info.cipher,
        subject = %info.cert_subject,
        issuer = %info.cert_issuer,
        "tls established"
    );

    within(deadline, Stage::Request, send_request(&mut tls_stream, cfg)).await?;

    let mut reader = ResponseReader::new(cfg.max_bytes);
    let raw = within(deadline, Stage::Response, reader.read(&mut tls_stream)).await?;
    drop(tls_stream);
    debug!(bytes = raw.bytes.len(), reason = ?raw.reason, "response received");

    let response = http::parse_response(&raw.bytes)?;
    debug!(status = response.status, body = %crate::util::excerpt(&response.body, 256), "parsed response");
    probe::classify(&cfg.reference_host, &response.body)
}

async fn connect(target: &ProbeTarget) -> Result<TcpStream, ProbeError> {
    let stream = TcpStream::connect((target.address.as_str(), target.port))
        .await
        .map_err(ProbeError::Connect)?;
    let _ = stream.set_nodelay(true);
    Ok(stream)
}

async fn send_request<S>(stream: &mut S, cfg: &ProbeConfig) -> Result<(), ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = http::build_request(&cfg.reference_host, &cfg.reference_path, &cfg.user_agent);
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|err| ProbeError::tls(Stage::Request, err))?;
    stream
        .flush()
        .await
        .map_err(|err| ProbeError::tls(Stage::Request, err))
}
