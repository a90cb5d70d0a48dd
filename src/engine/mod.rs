pub mod pipeline;
pub mod reader;

use crate::model::{ProbeConfig, ProbeResult, ProbeTarget};
use tokio::time::Instant;
use tracing::{info, instrument, warn};

/// Probes one candidate endpoint. Always returns a result; every connect,
/// TLS, timeout and parse failure becomes [`ProbeResult::Failed`].
#[instrument(skip(target, cfg), fields(target = %target))]
pub async fn check_proxy(target: &ProbeTarget, cfg: &ProbeConfig) -> ProbeResult {
    let start = Instant::now();

    match pipeline::run(target, cfg, start).await {
        Ok(data) => {
            let elapsed = start.elapsed().as_millis() as u64;
            info!(client_ip = %data.client_ip, colo = %data.colo, ms = elapsed, "candidate relays to reference host");
            ProbeResult::proxy(target, elapsed, data)
        }
        Err(err) => {
            warn!(kind = ?err.kind(), stage = %err.stage(), error = %err, "probe failed");
            ProbeResult::failed(target, &err)
        }
    }
}
