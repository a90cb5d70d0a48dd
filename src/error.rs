use crate::model::Stage;
use std::fmt;
use thiserror::Error;

/// Every way a single probe can fail. The engine never lets one of these
/// escape; they are folded into a failure [`crate::model::ProbeResult`].
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Missing ip or port parameter")]
    MissingParameter,

    #[error("Invalid port parameter: {0}")]
    InvalidPort(String),

    #[error("TCP socket error: {0}")]
    Connect(#[source] std::io::Error),

    #[error("Connection timed out")]
    Timeout { stage: Stage },

    #[error("TLS socket error: {detail}")]
    Tls { stage: Stage, detail: String },

    #[error("Malformed HTTP response: {0}")]
    Http(String),

    #[error("Response exceeded {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Failed to parse JSON")]
    Json(#[source] serde_json::Error),

    #[error("Invalid JSON response")]
    MissingClientIp,
}

/// Coarse error classes callers can branch on without matching variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parameter,
    Connect,
    Timeout,
    Tls,
    Parse,
}

impl ProbeError {
    pub fn tls(stage: Stage, err: impl fmt::Display) -> Self {
        ProbeError::Tls {
            stage,
            detail: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProbeError::MissingParameter | ProbeError::InvalidPort(_) => ErrorKind::Parameter,
            ProbeError::Connect(_) => ErrorKind::Connect,
            ProbeError::Timeout { .. } => ErrorKind::Timeout,
            ProbeError::Tls { .. } => ErrorKind::Tls,
            ProbeError::Http(_)
            | ProbeError::TooLarge { .. }
            | ProbeError::Json(_)
            | ProbeError::MissingClientIp => ErrorKind::Parse,
        }
    }

    /// The pipeline phase the error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            ProbeError::MissingParameter | ProbeError::InvalidPort(_) => Stage::Parameters,
            ProbeError::Connect(_) => Stage::Connect,
            ProbeError::Timeout { stage } | ProbeError::Tls { stage, .. } => *stage,
            ProbeError::TooLarge { .. } => Stage::Response,
            ProbeError::Http(_) | ProbeError::Json(_) | ProbeError::MissingClientIp => {
                Stage::Parse
            }
        }
    }
}
