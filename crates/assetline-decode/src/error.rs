//! Error types for decoding operations.

/// Errors that can occur while decoding a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The body was empty where content was required.
    #[error("empty body")]
    EmptyBody,
    /// The body was not valid JSON.
    #[error("invalid json at line {line}, column {column}: {detail}")]
    InvalidJson {
        line: usize,
        column: usize,
        detail: String,
    },
    /// The body was not valid UTF-8.
    #[error("invalid utf-8 at byte {valid_up_to}")]
    InvalidUtf8 { valid_up_to: usize },
    /// The image data could not be decoded.
    #[error("invalid {kind} image: {detail}")]
    InvalidImage { kind: &'static str, detail: String },
    /// A user supplied decoder rejected the payload.
    #[error("{0}")]
    Custom(String),
}

impl DecodeError {
    /// Build a [`DecodeError::Custom`] from any displayable message.
    pub fn custom(message: impl std::fmt::Display) -> Self {
        Self::Custom(message.to_string())
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidJson {
            line: e.line(),
            column: e.column(),
            detail: e.to_string(),
        }
    }
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
