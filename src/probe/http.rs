//! Just enough HTTP/1.1 to frame one GET and read its answer back.

use crate::error::ProbeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub fn build_request(host: &str, path: &str, user_agent: &str) -> String {
    format!(
        "GET {path} HTTP/1.1\r\nHost: {host}\r\nUser-Agent: {user_agent}\r\nConnection: close\r\n\r\n"
    )
}

/// Offset of the first body byte, if the header block has been terminated.
pub fn find_header_end(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

/// True once `bytes` holds a full response according to its own framing.
/// Responses framed only by connection close are never complete here.
pub fn is_complete(bytes: &[u8]) -> bool {
    let Some(header_end) = find_header_end(bytes) else {
        return false;
    };
    let head = &bytes[..header_end];
    let body = &bytes[header_end..];

    if is_chunked(head) {
        return matches!(decode_chunked(body), Ok(Some(_)));
    }

    match parse_content_length(head) {
        Some(len) => body.len() >= len,
        None => false,
    }
}

pub fn parse_response(bytes: &[u8]) -> Result<HttpResponse, ProbeError> {
    let (head, body) = match find_header_end(bytes) {
        Some(end) => (&bytes[..end], &bytes[end..]),
        None => (bytes, &[][..]),
    };
    let head = std::str::from_utf8(head)
        .map_err(|_| ProbeError::Http("header block is not valid UTF-8".into()))?;
    let mut lines = head.lines();

    let status_line = lines
        .next()
        .filter(|line| !line.is_empty())
        .ok_or_else(|| ProbeError::Http("empty response".into()))?;
    let (version, status, reason) = parse_status_line(status_line)?;

    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect::<Vec<_>>();

    let mut response = HttpResponse {
        version,
        status,
        reason,
        headers,
        body: Vec::new(),
    };

    let chunked = response
        .header("Transfer-Encoding")
        .map(|value| value.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false);

    response.body = if chunked {
        decode_chunked(body)
            .map_err(ProbeError::Http)?
            .ok_or_else(|| ProbeError::Http("truncated chunked body".into()))?
    } else if let Some(len) = response
        .header("Content-Length")
        .and_then(|value| value.parse::<usize>().ok())
    {
        body[..len.min(body.len())].to_vec()
    } else {
        body.to_vec()
    };

    Ok(response)
}

fn parse_status_line(line: &str) -> Result<(String, u16, String), ProbeError> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(ProbeError::Http(format!(
            "unexpected status line: {}",
            crate::util::excerpt(line.as_bytes(), 64)
        )));
    }
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| ProbeError::Http(format!("invalid status code in: {line}")))?;
    let reason = parts.next().unwrap_or_default().trim().to_string();
    Ok((version.to_string(), status, reason))
}

fn parse_content_length(bytes: &[u8]) -> Option<usize> {
    header_value(bytes, b"Content-Length:").and_then(|value| value.parse::<usize>().ok())
}

fn is_chunked(bytes: &[u8]) -> bool {
    header_value(bytes, b"Transfer-Encoding:")
        .map(|value| value.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false)
}

fn header_value<'a>(bytes: &'a [u8], name: &[u8]) -> Option<&'a str> {
    for line in bytes.split(|b| *b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            break;
        }

        if line
            .get(..name.len())
            .map(|prefix| prefix.eq_ignore_ascii_case(name))
            .unwrap_or(false)
        {
            return std::str::from_utf8(&line[name.len()..])
                .ok()
                .map(str::trim);
        }
    }

    None
}

/// Decodes a chunked body. `Ok(None)` means more bytes are needed.
fn decode_chunked(mut bytes: &[u8]) -> Result<Option<Vec<u8>>, String> {
    let mut body = Vec::new();
    loop {
        let Some(line_end) = bytes.windows(2).position(|w| w == b"\r\n") else {
            return Ok(None);
        };
        let size_line = std::str::from_utf8(&bytes[..line_end])
            .map_err(|_| "chunk size is not valid UTF-8".to_string())?;
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| format!("invalid chunk size: {size_hex:?}"))?;
        bytes = &bytes[line_end + 2..];

        if size == 0 {
            // Trailers are ignored.
            return Ok(Some(body));
        }
        let framed = size
            .checked_add(2)
            .ok_or_else(|| format!("chunk size overflows: {size_hex:?}"))?;
        if bytes.len() < framed {
            return Ok(None);
        }
        body.extend_from_slice(&bytes[..size]);
        if &bytes[size..framed] != b"\r\n" {
            return Err("chunk not terminated by CRLF".into());
        }
        bytes = &bytes[framed..];
    }
}
