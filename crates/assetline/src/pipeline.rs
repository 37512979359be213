//! The public asset pipeline handle.

use std::{fmt, future::Future, sync::Arc};

use crate::{
    coordinator::{AssetFuture, FetchCoordinator},
    error::Result,
    fetch::{Fetcher, HttpFetcher},
    registry::{ContentDecoderRegistry, Decoder},
    spawn::{Spawn, TokioSpawner},
    types::{Asset, PipelineStats, UriState},
};

/// Loads, decodes and caches assets by URI.
///
/// Each pipeline owns its own cache and request state; clones are handles
/// to the same pipeline. Create one per application context (or per test).
///
/// # Example
///
/// ```ignore
/// let pipeline = AssetPipeline::builder()
///     .asset_prefix("https://example.com/static/")
///     .with_builtin_decoders()
///     .build();
///
/// let config = pipeline.request_asset("config.json").await?;
/// ```
#[derive(Clone)]
pub struct AssetPipeline {
    coordinator: Arc<FetchCoordinator>,
}

impl AssetPipeline {
    /// Create a pipeline around `fetcher` with an empty decoder registry.
    #[must_use]
    pub fn new(fetcher: impl Fetcher + 'static) -> Self {
        Self::builder().fetcher(fetcher).build()
    }

    #[must_use]
    pub fn builder() -> AssetPipelineBuilder {
        AssetPipelineBuilder::default()
    }

    /// Request an asset.
    ///
    /// A cached asset is returned without I/O. Otherwise the URI joins the
    /// fetch already running for it, or starts one. The request is
    /// registered before this returns, so back-to-back calls share one
    /// fetch even if neither future has been polled yet.
    ///
    /// With the default spawner this must be called from within a Tokio
    /// runtime.
    pub fn request_asset(&self, uri: &str) -> AssetFuture {
        self.coordinator.request(uri)
    }

    /// Queue a URI for the next [`process_queue`](Self::process_queue)
    /// without starting any I/O.
    ///
    /// Returns `true` if the URI was newly queued, `false` if it was already
    /// queued, in flight or resolved.
    pub fn enqueue_asset(&self, uri: &str) -> bool {
        self.coordinator.enqueue(uri)
    }

    /// Fetch every queued URI and wait for all of them to settle.
    ///
    /// Assets come back in enqueue order. If any URI failed, the first
    /// failure is returned after all have settled; use
    /// [`process_queue_settled`](Self::process_queue_settled) to keep the
    /// successes.
    pub fn process_queue(&self) -> impl Future<Output = Result<Vec<Arc<Asset>>>> + Send + use<> {
        let pending = self.coordinator.flush_queued();
        async move {
            let mut assets = Vec::with_capacity(pending.len());
            let mut first_error = None;
            for (_, future) in pending {
                match future.await {
                    Ok(asset) => assets.push(asset),
                    Err(e) => {
                        first_error.get_or_insert(e);
                    }
                }
            }
            first_error.map_or(Ok(assets), Err)
        }
    }

    /// Fetch every queued URI and report each outcome separately, in
    /// enqueue order.
    pub fn process_queue_settled(
        &self,
    ) -> impl Future<Output = Vec<(String, Result<Arc<Asset>>)>> + Send + use<> {
        let pending = self.coordinator.flush_queued();
        async move {
            let mut settled = Vec::with_capacity(pending.len());
            for (uri, future) in pending {
                settled.push((uri, future.await));
            }
            settled
        }
    }

    /// Register a decoder for a content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateHandler`](crate::Error::DuplicateHandler)
    /// if the type already has one.
    pub fn register_content_type(&self, content_type: &str, decoder: Decoder) -> Result<()> {
        self.coordinator.register(content_type, decoder)
    }

    /// Set the prefix prepended to every URI before it is fetched.
    ///
    /// The prefix can be set once, here or through the builder. Fetches
    /// started before it is set use no prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PrefixAlreadySet`](crate::Error::PrefixAlreadySet)
    /// on a second attempt.
    pub fn set_asset_prefix(&self, prefix: impl Into<String>) -> Result<()> {
        self.coordinator.set_prefix(prefix.into())
    }

    #[must_use]
    pub fn asset_prefix(&self) -> &str {
        self.coordinator.prefix()
    }

    /// Get an already resolved asset without requesting it.
    #[must_use]
    pub fn cached_asset(&self, uri: &str) -> Option<Arc<Asset>> {
        self.coordinator.cached(uri)
    }

    #[must_use]
    pub fn state(&self, uri: &str) -> UriState {
        self.coordinator.state(uri)
    }

    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        self.coordinator.stats()
    }
}

impl fmt::Debug for AssetPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetPipeline")
            .field("prefix", &self.asset_prefix())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Configures an [`AssetPipeline`].
#[derive(Default)]
pub struct AssetPipelineBuilder {
    fetcher: Option<Arc<dyn Fetcher>>,
    spawner: Option<Arc<dyn Spawn>>,
    prefix: Option<String>,
    registry: ContentDecoderRegistry,
}

impl AssetPipelineBuilder {
    /// Fetch through `fetcher` instead of the default [`HttpFetcher`].
    #[must_use]
    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Run fetches on `spawner` instead of the current Tokio runtime.
    #[must_use]
    pub fn spawner(mut self, spawner: impl Spawn + 'static) -> Self {
        self.spawner = Some(Arc::new(spawner));
        self
    }

    /// Set the asset prefix. This uses up the pipeline's one prefix setting.
    #[must_use]
    pub fn asset_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Start from `registry` instead of an empty one.
    #[must_use]
    pub fn registry(mut self, registry: ContentDecoderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Start from the built-in image, text and JSON decoders. Replaces any
    /// registry set earlier.
    #[must_use]
    pub fn with_builtin_decoders(self) -> Self {
        self.registry(ContentDecoderRegistry::with_builtin())
    }

    #[must_use]
    pub fn build(self) -> AssetPipeline {
        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Arc::new(HttpFetcher::new()));
        let spawner = self
            .spawner
            .unwrap_or_else(|| Arc::new(TokioSpawner::new()));

        let coordinator = FetchCoordinator::new(fetcher, spawner, self.registry);
        if let Some(prefix) = self.prefix {
            // A fresh coordinator has no prefix yet.
            let _ = coordinator.set_prefix(prefix);
        }

        AssetPipeline {
            coordinator: Arc::new(coordinator),
        }
    }
}
