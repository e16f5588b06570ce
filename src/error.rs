//! Error types.
//!
//! Nothing in the marker layer is fatal: a missing anchor, a blocked gate, or a
//! stale load simply renders fewer markers. The errors here cover the edges
//! where the crate talks to the outside world (environment, comment sources,
//! fixture files).

/// Stable machine-readable code attached to log events.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The variable is set but is not a number.
    #[error("{var} is not a number: {value:?}")]
    InvalidNumber { var: String, value: String },

    /// The variable parsed but is negative or not finite.
    #[error("{var} must be a finite, non-negative number: {value:?}")]
    OutOfRange { var: String, value: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidNumber { .. } => "E_CONFIG_NUMBER",
            Self::OutOfRange { .. } => "E_CONFIG_RANGE",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The backing service could not be reached or refused the request.
    #[error("comment source unavailable: {0}")]
    Unavailable(String),

    /// The payload did not decode into comment records.
    #[error("comment payload rejected: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ErrorCode for SourceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "E_SOURCE_UNAVAILABLE",
            Self::Decode(_) => "E_SOURCE_DECODE",
        }
    }
}

/// Top-level error for the demo binary.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("fixture read failed: {0}")]
    Fixture(#[from] std::io::Error),

    #[error("view encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ErrorCode for OverlayError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Source(e) => e.error_code(),
            Self::Fixture(_) => "E_FIXTURE",
            Self::Encode(_) => "E_ENCODE",
        }
    }
}
