use crate::error::ProbeError;
use crate::model::Stage;
use crate::probe::http;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStopReason {
    /// Peer closed the stream cleanly.
    ConnectionClosed,
    /// The response's own framing says it is finished.
    Complete,
    /// The transport failed after some of the response had arrived.
    TransportError,
}

#[derive(Debug, Clone)]
pub struct ReadResult {
    pub bytes: Vec<u8>,
    pub reason: ReadStopReason,
}

/// Accumulates one HTTP response, bounded by `max_bytes`.
pub struct ResponseReader {
    max_bytes: usize,
}

impl ResponseReader {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes: max_bytes.max(1),
        }
    }

    pub async fn read<T: AsyncRead + Unpin>(
        &mut self,
        stream: &mut T,
    ) -> Result<ReadResult, ProbeError> {
        let mut bytes = Vec::new();
        let mut chunk = [0u8; 4096];

        let reason = loop {
            match stream.read(&mut chunk).await {
                Ok(0) => break ReadStopReason::ConnectionClosed,
                Ok(n) => {
                    if bytes.len() + n > self.max_bytes {
                        return Err(ProbeError::TooLarge {
                            limit: self.max_bytes,
                        });
                    }
                    bytes.extend_from_slice(&chunk[..n]);
                    if http::is_complete(&bytes) {
                        break ReadStopReason::Complete;
                    }
                }
                // Plenty of peers drop the socket without a close_notify.
                Err(err) if !bytes.is_empty() => {
                    debug!(error = %err, bytes = bytes.len(), "read failed mid-response, keeping what arrived");
                    break ReadStopReason::TransportError;
                }
                Err(err) => return Err(ProbeError::tls(Stage::Response, err)),
            }
        };

        Ok(ReadResult { bytes, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    struct Reset;

    impl AsyncRead for Reset {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )))
        }
    }

    #[tokio::test]
    async fn reads_until_close() {
        let mut reader = ResponseReader::new(1024);
        let mut data: &[u8] = b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n{\"clientIp\":\"1.2.3.4\"}";
        let res = reader.read(&mut data).await.unwrap();
        assert_eq!(res.reason, ReadStopReason::ConnectionClosed);
        assert!(res.bytes.ends_with(b"}"));
    }

    #[tokio::test]
    async fn stops_when_content_length_satisfied() {
        let mut reader = ResponseReader::new(1024);
        let mut data: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}";
        let res = reader.read(&mut data).await.unwrap();
        assert_eq!(res.reason, ReadStopReason::Complete);
    }

    #[tokio::test]
    async fn enforces_size_limit() {
        let mut reader = ResponseReader::new(8);
        let mut data: &[u8] = b"HTTP/1.1 200 OK\r\n\r\n";
        let err = reader.read(&mut data).await.unwrap_err();
        assert!(matches!(err, ProbeError::TooLarge { limit: 8 }));
    }

    #[tokio::test]
    async fn hostile_chunk_size_does_not_stop_accumulation() {
        let mut reader = ResponseReader::new(1024);
        let mut data: &[u8] =
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nffffffffffffffff\r\nxx";
        let res = reader.read(&mut data).await.unwrap();
        assert_eq!(res.reason, ReadStopReason::ConnectionClosed);
        assert!(matches!(
            crate::probe::parse_response(&res.bytes),
            Err(ProbeError::Http(_))
        ));
    }

    #[tokio::test]
    async fn error_after_data_ends_the_read() {
        let mut reader = ResponseReader::new(1024);
        let mut stream = (&b"HTTP/1.1 200 OK\r\n\r\n{}"[..]).chain(Reset);
        let res = reader.read(&mut stream).await.unwrap();
        assert_eq!(res.reason, ReadStopReason::TransportError);
        assert_eq!(res.bytes, b"HTTP/1.1 200 OK\r\n\r\n{}");
    }

    #[tokio::test]
    async fn error_before_data_is_a_tls_failure() {
        let mut reader = ResponseReader::new(1024);
        let err = reader.read(&mut Reset).await.unwrap_err();
        assert_eq!(err.stage(), Stage::Response);
        assert_eq!(err.to_string(), "TLS socket error: connection reset by peer");
    }
}
