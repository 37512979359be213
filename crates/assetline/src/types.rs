//! High-level types for fetched and decoded assets.

use std::{any::Any, fmt, sync::Arc};

use assetline_decode::{DecodeResult, DecodedImage};
use serde::de::DeserializeOwned;

/// Content type assumed when a response carries none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Normalise a content-type label for registry lookups.
///
/// Parameters after `;` are dropped, surrounding whitespace is trimmed and
/// the result is lower-cased: `"Text/HTML; charset=utf-8"` becomes
/// `"text/html"`.
#[must_use]
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// A raw response as delivered by a [`Fetcher`](crate::Fetcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Whether the fetch succeeded.
    pub ok: bool,
    /// The `Content-Type` header, verbatim.
    pub content_type: Option<String>,
    /// The response body.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// A successful response with status 200.
    #[must_use]
    pub fn ok(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            ok: true,
            content_type: Some(content_type.into()),
            body: body.into(),
        }
    }

    /// A failed response with the given status and no body.
    #[must_use]
    pub fn failed(status: u16) -> Self {
        Self {
            status,
            ok: false,
            content_type: None,
            body: Vec::new(),
        }
    }

    /// The normalised content type, or [`DEFAULT_CONTENT_TYPE`] if absent or blank.
    #[must_use]
    pub fn resolved_content_type(&self) -> String {
        self.content_type
            .as_deref()
            .map(normalize_content_type)
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
    }

    /// The body as raw bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> DecodeResult<String> {
        assetline_decode::decode_text(&self.body)
    }

    /// The body deserialized from JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> DecodeResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// The decoded payload of an asset.
#[derive(Clone)]
pub enum Content {
    /// A parsed JSON document.
    Json(serde_json::Value),
    /// UTF-8 text (plain text, HTML).
    Text(String),
    /// A decoded raster image.
    Image(DecodedImage),
    /// Raw bytes, as produced by the fallback decoder.
    Bytes(Vec<u8>),
    /// Anything a user-registered decoder produces.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl Content {
    /// Wrap a custom decoded value.
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Self::Custom(Arc::new(value))
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_image(&self) -> Option<&DecodedImage> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Borrow a custom payload as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(value) => value.downcast_ref(),
            _ => None,
        }
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Image(image) => f.debug_tuple("Image").field(image).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A fetched and decoded resource.
///
/// Created once per URI and never mutated; callers share it through an `Arc`.
#[derive(Debug, Clone)]
pub struct Asset {
    /// The URI the asset was requested by, without the asset prefix.
    pub uri: String,
    /// The normalised content type the asset was decoded as.
    pub content_type: String,
    /// The decoded payload.
    pub content: Content,
}

/// Where a URI is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UriState {
    /// Never requested, or the last attempt failed.
    Unknown,
    /// Enqueued for a later batch.
    Queued,
    /// A fetch is running.
    InFlight,
    /// Decoded and cached.
    Resolved,
}

/// Counts of tracked URIs by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub queued: usize,
    pub in_flight: usize,
    pub resolved: usize,
}

impl PipelineStats {
    /// URIs that have been asked for but are not yet resolved.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.queued + self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_content_type() {
        assert_eq!(normalize_content_type("application/json"), "application/json");
        assert_eq!(
            normalize_content_type(" Text/HTML; charset=UTF-8"),
            "text/html"
        );
        assert_eq!(normalize_content_type(""), "");
    }

    #[test]
    fn test_resolved_content_type_defaults() {
        let mut response = RawResponse::ok("image/PNG", vec![1]);
        assert_eq!(response.resolved_content_type(), "image/png");

        response.content_type = None;
        assert_eq!(response.resolved_content_type(), DEFAULT_CONTENT_TYPE);

        response.content_type = Some("  ".to_string());
        assert_eq!(response.resolved_content_type(), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_response_json() {
        #[derive(serde::Deserialize)]
        struct Level {
            width: u32,
        }

        let response = RawResponse::ok("application/json", r#"{"width": 64}"#);
        let level: Level = response.json().unwrap();
        assert_eq!(level.width, 64);
        assert!(response.json::<Vec<u8>>().is_err());
    }

    #[test]
    fn test_content_accessors() {
        let content = Content::Text("hi".to_string());
        assert_eq!(content.as_text(), Some("hi"));
        assert!(content.as_json().is_none());

        let content = Content::custom(42_u32);
        assert_eq!(content.downcast_ref::<u32>(), Some(&42));
        assert!(content.downcast_ref::<i64>().is_none());
        assert_eq!(format!("{content:?}"), "Custom(..)");
    }

    #[test]
    fn test_stats_outstanding() {
        let stats = PipelineStats {
            queued: 2,
            in_flight: 3,
            resolved: 7,
        };
        assert_eq!(stats.outstanding(), 5);
    }
}
