use crate::error::ProbeError;
use crate::model::Stage;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use openssl::x509::X509NameRef;
use std::pin::Pin;
use std::sync::OnceLock;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_openssl::SslStream;

/// Negotiated session details, logged after the handshake.
#[derive(Debug, Clone, Default)]
pub struct TlsInfo {
    pub version: String,
    pub cipher: String,
    pub cert_subject: String,
    pub cert_issuer: String,
}

fn connector() -> Result<&'static SslConnector, ProbeError> {
    static CONNECTOR: OnceLock<Result<SslConnector, String>> = OnceLock::new();

    CONNECTOR
        .get_or_init(|| {
            let mut builder =
                SslConnector::builder(SslMethod::tls()).map_err(|err| err.to_string())?;
            // Candidates are untrusted infrastructure; their certificates say
            // nothing about whether they relay to the reference host.
            builder.set_verify(SslVerifyMode::NONE);
            Ok(builder.build())
        })
        .as_ref()
        .map_err(|err| ProbeError::tls(Stage::Tls, format!("failed to create TLS connector: {err}")))
}

/// Runs a client handshake over `stream`, presenting `server_name` as SNI.
pub async fn handshake<S>(stream: S, server_name: &str) -> Result<SslStream<S>, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ssl = connector()?
        .configure()
        .map_err(|err| ProbeError::tls(Stage::Tls, err))?
        .verify_hostname(false)
        .into_ssl(server_name)
        .map_err(|err| ProbeError::tls(Stage::Tls, err))?;
    let mut tls_stream =
        SslStream::new(ssl, stream).map_err(|err| ProbeError::tls(Stage::Tls, err))?;
    Pin::new(&mut tls_stream)
        .connect()
        .await
        .map_err(|err| ProbeError::tls(Stage::Tls, err))?;
    Ok(tls_stream)
}

pub fn extract_tls_info<S>(stream: &SslStream<S>) -> TlsInfo
where
    S: AsyncRead + AsyncWrite,
{
    let ssl = stream.ssl();
    let mut info = TlsInfo {
        cipher: ssl
            .current_cipher()
            .map(|cipher| cipher.name().to_string())
            .unwrap_or_default(),
        version: ssl.version_str().to_string(),
        ..TlsInfo::default()
    };

    if let Some(cert) = ssl.peer_certificate() {
        info.cert_subject = format_x509_name(cert.subject_name());
        info.cert_issuer = format_x509_name(cert.issuer_name());
    }

    info
}

fn format_x509_name(name: &X509NameRef) -> String {
    let mut parts = Vec::new();
    for entry in name.entries() {
        let key = entry.object().nid().short_name().unwrap_or("UNKNOWN");
        let value = entry
            .data()
            .as_utf8()
            .map(|val| val.to_string())
            .unwrap_or_default();
        if !value.is_empty() {
            parts.push(format!("{key}={value}"));
        }
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_is_shared() {
        let first = connector().unwrap() as *const SslConnector;
        let second = connector().unwrap() as *const SslConnector;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn handshake_against_plaintext_fails_as_tls() {
        let (client, mut server) = tokio::io::duplex(1024);
        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            let _ = server.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").await;
        });

        let Err(err) = handshake(client, "speed.cloudflare.com").await else {
            panic!("handshake with a plaintext peer succeeded");
        };
        assert_eq!(err.stage(), Stage::Tls);
        assert!(err.to_string().starts_with("TLS socket error:"));
    }
}
