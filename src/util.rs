pub mod region;

/// Renders raw bytes as text, replacing anything unprintable with `.`.
pub fn sanitize_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| match b {
            0x20..=0x7e => *b as char,
            b'\n' => '\n',
            b'\r' => '\r',
            _ => '.',
        })
        .collect()
}

/// Like [`sanitize_text`] but cut to `limit` bytes, for log lines.
pub fn excerpt(bytes: &[u8], limit: usize) -> String {
    let end = bytes.len().min(limit);
    let mut text = sanitize_text(&bytes[..end]);
    if bytes.len() > limit {
        text.push_str("...");
    }
    text
}
