use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const REFERENCE_HOST: &str = "speed.cloudflare.com";
pub const REFERENCE_PATH: &str = "/meta";
pub const USER_AGENT: &str = "Mozilla/5.0";
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTarget {
    pub address: String,
    pub port: u16,
}

impl ProbeTarget {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.address.contains(':') {
            write!(f, "[{}]:{}", self.address, self.port)
        } else {
            write!(f, "{}:{}", self.address, self.port)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Hostname sent as SNI and in the `Host` header.
    pub reference_host: String,
    pub reference_path: String,
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Deadline for the whole probe, measured from the first connect attempt.
    pub overall_timeout: Duration,
    pub max_bytes: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            reference_host: REFERENCE_HOST.into(),
            reference_path: REFERENCE_PATH.into(),
            user_agent: USER_AGENT.into(),
            connect_timeout: Duration::from_millis(5000),
            overall_timeout: Duration::from_millis(15000),
            max_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub target: ProbeTarget,
    pub probe: ProbeConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Pretty,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Pretty => write!(f, "pretty"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Parameters,
    Connect,
    Tls,
    Request,
    Response,
    Parse,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Parameters => "parameters",
            Stage::Connect => "connect",
            Stage::Tls => "tls",
            Stage::Request => "request",
            Stage::Response => "response",
            Stage::Parse => "parse",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyView {
    pub address: String,
    pub port: u16,
}

impl From<&ProbeTarget> for ProxyView {
    fn from(target: &ProbeTarget) -> Self {
        Self {
            address: target.address.clone(),
            port: target.port,
        }
    }
}

/// Metadata the reference service reported back through the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyData {
    pub hostname: String,
    pub client_ip: String,
    pub http_protocol: String,
    pub asn: u64,
    pub as_organization: String,
    pub colo: String,
    pub country: String,
    #[serde(rename = "country_name")]
    pub country_name: String,
    #[serde(rename = "country_flag")]
    pub country_flag: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub latitude: String,
    pub longitude: String,
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySuccess {
    pub success: bool,
    pub proxy: ProxyView,
    pub is_proxy: bool,
    pub response_time_ms: u64,
    pub data: ProxyData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyFailure {
    pub success: bool,
    pub proxy: ProxyView,
    pub is_proxy: bool,
    pub message: String,
    pub stage: Stage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeResult {
    Proxy(ProxySuccess),
    Failed(ProxyFailure),
}

impl ProbeResult {
    pub fn proxy(target: &ProbeTarget, response_time_ms: u64, data: ProxyData) -> Self {
        ProbeResult::Proxy(ProxySuccess {
            success: true,
            proxy: target.into(),
            is_proxy: true,
            response_time_ms,
            data,
        })
    }

    pub fn failed(target: &ProbeTarget, err: &ProbeError) -> Self {
        ProbeResult::Failed(ProxyFailure {
            success: false,
            proxy: target.into(),
            is_proxy: false,
            message: err.to_string(),
            stage: err.stage(),
        })
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, ProbeResult::Proxy(_))
    }

    pub fn proxy_view(&self) -> &ProxyView {
        match self {
            ProbeResult::Proxy(ok) => &ok.proxy,
            ProbeResult::Failed(failed) => &failed.proxy,
        }
    }

    pub fn data(&self) -> Option<&ProxyData> {
        match self {
            ProbeResult::Proxy(ok) => Some(&ok.data),
            ProbeResult::Failed(_) => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ProbeResult::Proxy(_) => None,
            ProbeResult::Failed(failed) => Some(&failed.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_display_brackets_ipv6() {
        assert_eq!(ProbeTarget::new("::1", 443).to_string(), "[::1]:443");
        assert_eq!(ProbeTarget::new("10.0.0.1", 8443).to_string(), "10.0.0.1:8443");
    }

    #[test]
    fn failure_serializes_flat() {
        let target = ProbeTarget::new("10.0.0.1", 443);
        let result = ProbeResult::failed(&target, &ProbeError::MissingClientIp);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["is_proxy"], false);
        assert_eq!(json["message"], "Invalid JSON response");
        assert_eq!(json["stage"], "parse");
        assert_eq!(json["proxy"]["address"], "10.0.0.1");
        assert_eq!(json["proxy"]["port"], 443);
    }

    #[test]
    fn data_keeps_reference_field_names() {
        let data = ProxyData {
            hostname: REFERENCE_HOST.into(),
            client_ip: "1.2.3.4".into(),
            http_protocol: "HTTP/1.1".into(),
            asn: 13335,
            as_organization: "Cloudflare".into(),
            colo: "AMS".into(),
            country: "NL".into(),
            country_name: "Netherlands".into(),
            country_flag: "\u{1F1F3}\u{1F1F1}".into(),
            city: "Amsterdam".into(),
            region: "North Holland".into(),
            postal_code: "1012".into(),
            latitude: "52.37".into(),
            longitude: "4.89".into(),
            ip: "1.2.3.4".into(),
        };
        let result = ProbeResult::proxy(&ProbeTarget::new("1.2.3.4", 443), 12, data);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["response_time_ms"], 12);
        assert_eq!(json["data"]["clientIp"], "1.2.3.4");
        assert_eq!(json["data"]["asOrganization"], "Cloudflare");
        assert_eq!(json["data"]["postalCode"], "1012");
        assert_eq!(json["data"]["country_name"], "Netherlands");

        let back: ProbeResult = serde_json::from_value(json).unwrap();
        assert!(back.is_proxy());
    }
}
