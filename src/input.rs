use crate::error::ProbeError;
use crate::model::ProbeTarget;

/// Port as supplied by the caller; must be a decimal in 1..=65535.
pub fn parse_port(raw: &str) -> Result<u16, ProbeError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ProbeError::InvalidPort(raw.to_string())),
    }
}

/// Builds a target from the two caller parameters, rejecting blanks.
pub fn target_from_params(ip: Option<&str>, port: Option<&str>) -> Result<ProbeTarget, ProbeError> {
    let ip = ip.map(str::trim).filter(|ip| !ip.is_empty());
    let port = port.map(str::trim).filter(|port| !port.is_empty());
    match (ip, port) {
        (Some(ip), Some(port)) => Ok(ProbeTarget::new(ip, parse_port(port)?)),
        _ => Err(ProbeError::MissingParameter),
    }
}

/// Parses `host:port` or `[v6]:port`.
pub fn parse_target(line: &str) -> Result<ProbeTarget, ProbeError> {
    let (host_part, port_part) = line
        .trim()
        .rsplit_once(':')
        .ok_or(ProbeError::MissingParameter)?;
    let host = host_part
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']');
    target_from_params(Some(host), Some(port_part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines() {
        let target = parse_target("[::1]:443").unwrap();
        assert_eq!(target.port, 443);
        assert_eq!(target.address, "::1");

        let target = parse_target(" 203.0.113.7:8443 ").unwrap();
        assert_eq!(target, ProbeTarget::new("203.0.113.7", 8443));
    }

    #[test]
    fn rejects_bad_ports() {
        assert!(matches!(parse_port("0"), Err(ProbeError::InvalidPort(_))));
        assert!(matches!(parse_port("65536"), Err(ProbeError::InvalidPort(_))));
        assert!(matches!(parse_port("80abc"), Err(ProbeError::InvalidPort(_))));
        assert_eq!(parse_port(" 443 ").unwrap(), 443);
    }

    #[test]
    fn missing_params() {
        assert!(matches!(
            target_from_params(None, Some("443")),
            Err(ProbeError::MissingParameter)
        ));
        assert!(matches!(
            target_from_params(Some("1.2.3.4"), Some("  ")),
            Err(ProbeError::MissingParameter)
        ));
        assert!(matches!(parse_target("1.2.3.4"), Err(ProbeError::MissingParameter)));
    }
}
