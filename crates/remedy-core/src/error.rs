use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemedyError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported order item type: {0}")]
    UnsupportedOrderType(String),

    #[error("cannot read {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("remedy api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification of a [`RemedyError`], for callers that branch on
/// the failure without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    NotFound,
    UnsupportedOrderType,
    FileUnreadable,
    InvalidInput,
    Unauthorized,
    Api,
    Decode,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UnsupportedOrderType => "unsupported_order_type",
            ErrorKind::FileUnreadable => "file_unreadable",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Api => "api",
            ErrorKind::Decode => "decode",
            ErrorKind::Config => "config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RemedyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RemedyError::Transport(_) => ErrorKind::Transport,
            RemedyError::NotFound(_) => ErrorKind::NotFound,
            RemedyError::UnsupportedOrderType(_) => ErrorKind::UnsupportedOrderType,
            RemedyError::FileUnreadable { .. } => ErrorKind::FileUnreadable,
            RemedyError::InvalidInput(_) => ErrorKind::InvalidInput,
            RemedyError::Unauthorized(_) => ErrorKind::Unauthorized,
            RemedyError::Api { .. } => ErrorKind::Api,
            RemedyError::Decode(_) => ErrorKind::Decode,
            RemedyError::Config(_) => ErrorKind::Config,
        }
    }
}
