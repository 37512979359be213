//! Content-type to decoder dispatch.
//!
//! The registry is closed: each content type has at most one [`Decoder`],
//! registering a second one is an error, and anything unregistered falls
//! back to a pass-through decoder that keeps the raw bytes.

use std::{collections::HashMap, fmt, future::Future, pin::Pin, sync::Arc};

use assetline_decode::{DecodeError, DecodeResult, ImageKind};

use crate::{
    error::{Error, Result},
    types::{Content, RawResponse, normalize_content_type},
};

/// Future type for decode operations.
pub type DecodeFuture = Pin<Box<dyn Future<Output = DecodeResult<Content>> + Send + 'static>>;

type DecodeFn = dyn Fn(RawResponse) -> DecodeFuture + Send + Sync;

/// Turns a raw response into decoded [`Content`].
///
/// Cloning a decoder is cheap.
#[derive(Clone)]
pub struct Decoder(Arc<DecodeFn>);

impl Decoder {
    /// Create a decoder from an async function.
    pub fn new<F, Fut>(decode: F) -> Self
    where
        F: Fn(RawResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DecodeResult<Content>> + Send + 'static,
    {
        Self(Arc::new(move |response| -> DecodeFuture {
            Box::pin(decode(response))
        }))
    }

    /// Create a decoder from a synchronous function that runs inline.
    pub fn sync<F>(decode: F) -> Self
    where
        F: Fn(RawResponse) -> DecodeResult<Content> + Send + Sync + 'static,
    {
        let decode = Arc::new(decode);
        Self::new(move |response| {
            let result = decode(response);
            async move { result }
        })
    }

    /// Create a decoder from a synchronous function too heavy for the
    /// async executor.
    ///
    /// On a Tokio runtime the work moves to the blocking pool; elsewhere it
    /// runs inline.
    pub fn blocking<F>(decode: F) -> Self
    where
        F: Fn(RawResponse) -> DecodeResult<Content> + Send + Sync + 'static,
    {
        let decode = Arc::new(decode);
        Self::new(move |response| {
            let decode = Arc::clone(&decode);
            async move {
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => match handle.spawn_blocking(move || decode(response)).await {
                        Ok(result) => result,
                        // Re-raised here so the caller sees one kind of panic
                        // whichever thread the decoder ran on.
                        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                        Err(e) => Err(DecodeError::custom(format!("decoder task failed: {e}"))),
                    },
                    Err(_) => decode(response),
                }
            }
        })
    }

    /// The pass-through decoder: keeps the body as bytes.
    #[must_use]
    pub fn passthrough() -> Self {
        Self::sync(|response| Ok(Content::Bytes(response.body)))
    }

    /// Decode a response.
    pub fn decode(&self, response: RawResponse) -> DecodeFuture {
        (self.0)(response)
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Decoder(..)")
    }
}

fn json_decoder() -> Decoder {
    Decoder::sync(|response| assetline_decode::decode_json(&response.body).map(Content::Json))
}

fn text_decoder() -> Decoder {
    Decoder::sync(|response| assetline_decode::decode_text(&response.body).map(Content::Text))
}

fn image_decoder(kind: ImageKind) -> Decoder {
    Decoder::blocking(move |response| {
        assetline_decode::decode_image(&response.body, Some(kind)).map(Content::Image)
    })
}

/// Maps content types to decoders.
#[derive(Debug, Clone)]
pub struct ContentDecoderRegistry {
    handlers: HashMap<String, Decoder>,
    fallback: Decoder,
}

impl Default for ContentDecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentDecoderRegistry {
    /// Create a registry with no handlers, only the pass-through fallback.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Decoder::passthrough(),
        }
    }

    /// Create a registry with the built-in decoders for images, text and JSON.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for kind in [
            ImageKind::Jpeg,
            ImageKind::Gif,
            ImageKind::Png,
            ImageKind::WebP,
        ] {
            registry
                .handlers
                .insert(kind.content_type().to_string(), image_decoder(kind));
        }
        registry
            .handlers
            .insert("text/html".to_string(), text_decoder());
        registry
            .handlers
            .insert("text/plain".to_string(), text_decoder());
        registry
            .handlers
            .insert("application/json".to_string(), json_decoder());
        registry
    }

    /// Register a decoder for a content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateHandler`] if the content type already has a
    /// decoder. The existing registration is left untouched.
    pub fn register(&mut self, content_type: &str, decoder: Decoder) -> Result<()> {
        let content_type = normalize_content_type(content_type);
        if self.handlers.contains_key(&content_type) {
            return Err(Error::DuplicateHandler { content_type });
        }
        tracing::debug!(content_type, "registered decoder");
        self.handlers.insert(content_type, decoder);
        Ok(())
    }

    /// Look up the decoder for a content type, falling back to pass-through.
    #[must_use]
    pub fn resolve(&self, content_type: Option<&str>) -> Decoder {
        content_type
            .map(normalize_content_type)
            .and_then(|content_type| self.handlers.get(&content_type))
            .unwrap_or(&self.fallback)
            .clone()
    }

    /// Check whether a content type has its own decoder.
    #[must_use]
    pub fn contains(&self, content_type: &str) -> bool {
        self.handlers
            .contains_key(&normalize_content_type(content_type))
    }

    /// Registered content types, sorted.
    #[must_use]
    pub fn content_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(tag: &'static str) -> Decoder {
        Decoder::sync(move |_| Ok(Content::Text(tag.to_string())))
    }

    #[tokio::test]
    async fn test_unknown_type_uses_passthrough() {
        let registry = ContentDecoderRegistry::new();
        let response = RawResponse::ok("font/woff2", vec![1, 2, 3]);

        let content = registry.resolve(Some("font/woff2")).decode(response.clone()).await;
        assert_eq!(content.unwrap().as_bytes(), Some(&[1, 2, 3][..]));

        let content = registry.resolve(None).decode(response).await;
        assert_eq!(content.unwrap().as_bytes(), Some(&[1, 2, 3][..]));
    }

    #[tokio::test]
    async fn test_duplicate_registration_keeps_first() {
        let mut registry = ContentDecoderRegistry::new();
        registry.register("application/json", marker("first")).unwrap();

        let err = registry
            .register("application/json", marker("second"))
            .unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateHandler {
                content_type: "application/json".to_string()
            }
        );

        let content = registry
            .resolve(Some("application/json"))
            .decode(RawResponse::ok("application/json", "{}"))
            .await
            .unwrap();
        assert_eq!(content.as_text(), Some("first"));
    }

    #[test]
    fn test_registration_is_normalised() {
        let mut registry = ContentDecoderRegistry::new();
        registry.register("Text/CSV", marker("csv")).unwrap();

        assert!(registry.contains("text/csv; charset=utf-8"));
        assert!(matches!(
            registry.register("text/csv", marker("again")),
            Err(Error::DuplicateHandler { .. })
        ));
    }

    #[test]
    fn test_builtin_types() {
        let registry = ContentDecoderRegistry::with_builtin();
        assert_eq!(
            registry.content_types(),
            vec![
                "application/json",
                "image/gif",
                "image/jpeg",
                "image/png",
                "image/webp",
                "text/html",
                "text/plain",
            ]
        );
    }

    #[tokio::test]
    async fn test_builtin_json_and_text() {
        let registry = ContentDecoderRegistry::with_builtin();

        let json = registry
            .resolve(Some("application/json; charset=utf-8"))
            .decode(RawResponse::ok("application/json", r#"{"a":1}"#))
            .await
            .unwrap();
        assert_eq!(json.as_json(), Some(&serde_json::json!({ "a": 1 })));

        let html = registry
            .resolve(Some("text/html"))
            .decode(RawResponse::ok("text/html", "<b>hi</b>"))
            .await
            .unwrap();
        assert_eq!(html.as_text(), Some("<b>hi</b>"));
    }

    #[tokio::test]
    async fn test_builtin_image_rejects_garbage() {
        let registry = ContentDecoderRegistry::with_builtin();
        let err = registry
            .resolve(Some("image/png"))
            .decode(RawResponse::ok("image/png", "not a png"))
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidImage { .. }));
    }

    fn block_on<F: Future>(f: F) -> F::Output {
        // Simple polling executor for tests.
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        #[allow(unsafe_code)]
        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => result,
            Poll::Pending => panic!("Future unexpectedly pending"),
        }
    }

    #[test]
    fn test_blocking_decoder_runs_inline_without_runtime() {
        let decoder = Decoder::blocking(|response| Ok(Content::Bytes(response.body)));
        let content = block_on(decoder.decode(RawResponse::ok("x/y", vec![9]))).unwrap();
        assert_eq!(content.as_bytes(), Some(&[9][..]));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blocking_decoder_on_runtime() {
        let decoder = Decoder::blocking(|response| Ok(Content::Bytes(response.body)));
        let content = decoder
            .decode(RawResponse::ok("x/y", vec![4, 2]))
            .await
            .unwrap();
        assert_eq!(content.as_bytes(), Some(&[4, 2][..]));
    }
}
