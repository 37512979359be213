//! Error types for the assetline crate.

use assetline_decode::DecodeError;

/// Result type for assetline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading assets.
///
/// Errors are `Clone` because one failed fetch is reported to every caller
/// waiting on that URI.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The fetch reported a non-success response or a transport error.
    #[error("fetch of {uri} failed: {message}")]
    Fetch {
        /// The URI that failed, without the asset prefix.
        uri: String,
        /// What went wrong.
        message: String,
    },
    /// The decoder for the response's content type rejected it.
    #[error("decoding {uri} as {content_type} failed")]
    Decode {
        /// The URI whose body failed to decode.
        uri: String,
        /// The normalised content type the decoder was selected for.
        content_type: String,
        #[source]
        source: DecodeError,
    },
    /// A decoder is already registered for this content type.
    #[error("a decoder is already registered for {content_type}")]
    DuplicateHandler { content_type: String },
    /// The asset prefix has already been set.
    #[error("asset prefix is already set")]
    PrefixAlreadySet,
    /// The fetch operation ended without settling, e.g. a decoder panicked.
    #[error("loading {uri} was interrupted")]
    Interrupted { uri: String },
}

impl Error {
    /// The URI this error concerns, if any.
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::Fetch { uri, .. } | Self::Decode { uri, .. } | Self::Interrupted { uri } => {
                Some(uri.as_str())
            }
            Self::DuplicateHandler { .. } | Self::PrefixAlreadySet => None,
        }
    }

    /// Whether this error reverted its URI so that a later request may retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::Decode { .. } | Self::Interrupted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display() {
        let err = Error::Fetch {
            uri: "missing.png".to_string(),
            message: "status 404".to_string(),
        };
        assert_eq!(err.to_string(), "fetch of missing.png failed: status 404");
    }

    #[test]
    fn test_decode_source() {
        let err = Error::Decode {
            uri: "a.json".to_string(),
            content_type: "application/json".to_string(),
            source: DecodeError::EmptyBody,
        };
        assert_eq!(err.uri(), Some("a.json"));
        assert!(err.source().is_some());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_configuration_errors_have_no_uri() {
        let err = Error::DuplicateHandler {
            content_type: "text/plain".to_string(),
        };
        assert_eq!(err.uri(), None);
        assert!(!err.is_retryable());
    }
}
