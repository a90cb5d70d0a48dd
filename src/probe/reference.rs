//! Turns the reference service's JSON body into [`ProxyData`].

use crate::error::ProbeError;
use crate::model::{ProxyData, UNKNOWN};
use crate::util::region::{country_flag, country_name};
use serde_json::{Map, Value};

pub fn classify(hostname: &str, body: &[u8]) -> Result<ProxyData, ProbeError> {
    let text = String::from_utf8_lossy(body);
    let json: Value = serde_json::from_str(text.trim()).map_err(ProbeError::Json)?;
    let meta = json.as_object().ok_or(ProbeError::MissingClientIp)?;
    let client_ip = field_text(meta, "clientIp").ok_or(ProbeError::MissingClientIp)?;
    let country = field_text(meta, "country");

    Ok(ProxyData {
        hostname: hostname.to_string(),
        ip: client_ip.clone(),
        client_ip,
        http_protocol: text_or_unknown(meta, "httpProtocol"),
        asn: meta.get("asn").map(parse_asn).unwrap_or(0),
        as_organization: text_or_unknown(meta, "asOrganization"),
        colo: text_or_unknown(meta, "colo"),
        country_name: country_name(country.as_deref().unwrap_or_default()),
        country_flag: country_flag(country.as_deref().unwrap_or_default()),
        country: country.unwrap_or_else(|| UNKNOWN.to_string()),
        city: text_or_unknown(meta, "city"),
        region: text_or_unknown(meta, "region"),
        postal_code: text_or_unknown(meta, "postalCode"),
        latitude: text_or_unknown(meta, "latitude"),
        longitude: text_or_unknown(meta, "longitude"),
    })
}

/// Field as text. Empty strings, `null`, `false` and zero count as absent.
fn field_text(meta: &Map<String, Value>, key: &str) -> Option<String> {
    match meta.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".into()),
        _ => None,
    }
}

fn text_or_unknown(meta: &Map<String, Value>, key: &str) -> String {
    field_text(meta, key).unwrap_or_else(|| UNKNOWN.to_string())
}

/// Numbers are truncated; strings contribute their leading decimal digits.
fn parse_asn(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => {
            let trimmed = s.trim_start();
            let digits = trimmed
                .find(|c: char| !c.is_ascii_digit())
                .map(|end| &trimmed[..end])
                .unwrap_or(trimmed);
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HOST: &str = "speed.cloudflare.com";

    #[test]
    fn minimal_payload_defaults_everything_else() {
        let data = classify(HOST, br#"{"clientIp":"1.2.3.4","country":"US"}"#).unwrap();
        assert_eq!(data.client_ip, "1.2.3.4");
        assert_eq!(data.ip, "1.2.3.4");
        assert_eq!(data.hostname, HOST);
        assert_eq!(data.asn, 0);
        assert_eq!(data.city, "Unknown");
        assert_eq!(data.colo, "Unknown");
        assert_eq!(data.country, "US");
        assert_eq!(data.country_name, "United States");
        assert_eq!(data.country_flag, "\u{1F1FA}\u{1F1F8}");
    }

    #[test]
    fn full_payload_is_copied_verbatim() {
        let body = json!({
            "clientIp": "203.0.113.9",
            "httpProtocol": "HTTP/1.1",
            "asn": 13335,
            "asOrganization": "Cloudflare, Inc.",
            "colo": "FRA",
            "country": "de",
            "city": "Frankfurt am Main",
            "region": "Hesse",
            "postalCode": "60313",
            "latitude": "50.11",
            "longitude": 8.68
        })
        .to_string();
        let data = classify(HOST, format!("\r\n  {body}\n").as_bytes()).unwrap();
        assert_eq!(data.http_protocol, "HTTP/1.1");
        assert_eq!(data.asn, 13335);
        assert_eq!(data.as_organization, "Cloudflare, Inc.");
        assert_eq!(data.country, "de");
        assert_eq!(data.country_name, "Germany");
        assert_eq!(data.postal_code, "60313");
        assert_eq!(data.latitude, "50.11");
        assert_eq!(data.longitude, "8.68");
    }

    #[test]
    fn missing_country_has_no_flag() {
        let data = classify(HOST, br#"{"clientIp":"1.2.3.4","country":""}"#).unwrap();
        assert_eq!(data.country, "Unknown");
        assert_eq!(data.country_name, "Unknown");
        assert_eq!(data.country_flag, "");
    }

    #[test]
    fn asn_accepts_prefixed_strings() {
        assert_eq!(parse_asn(&json!("13335")), 13335);
        assert_eq!(parse_asn(&json!(" 64512 ")), 64512);
        assert_eq!(parse_asn(&json!("64512abc")), 64512);
        assert_eq!(parse_asn(&json!("AS13335")), 0);
        assert_eq!(parse_asn(&json!(12.9)), 12);
        assert_eq!(parse_asn(&json!(null)), 0);
    }

    #[test]
    fn rejects_payload_without_client_ip() {
        let err = classify(HOST, br#"{"country":"US"}"#).unwrap_err();
        assert!(matches!(err, ProbeError::MissingClientIp));
        let err = classify(HOST, br#"{"clientIp":""}"#).unwrap_err();
        assert!(matches!(err, ProbeError::MissingClientIp));
        let err = classify(HOST, b"[1,2,3]").unwrap_err();
        assert!(matches!(err, ProbeError::MissingClientIp));
    }

    #[test]
    fn rejects_non_json() {
        let err = classify(HOST, b"<html>blocked</html>").unwrap_err();
        assert!(matches!(err, ProbeError::Json(_)));
        assert_eq!(err.to_string(), "Failed to parse JSON");
        assert!(matches!(classify(HOST, b"   "), Err(ProbeError::Json(_))));
    }
}
