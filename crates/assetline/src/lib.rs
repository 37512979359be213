//! Async loader and cache for fetched, decoded assets.
//!
//! An [`AssetPipeline`] fetches resources by URI, decodes them according to
//! their content type and keeps the decoded [`Asset`] for the lifetime of
//! the pipeline. However many callers ask for a URI at once, at most one
//! fetch for it is ever outstanding, and every caller observes the same
//! outcome.
//!
//! # Design principles
//!
//! - **Single-flight**: Concurrent requests for a URI share one fetch
//! - **Sticky success, retryable failure**: Resolved assets are permanent;
//!   failed URIs can be requested again
//! - **Pluggable decoding**: Content types map to [`Decoder`]s in a closed
//!   [`ContentDecoderRegistry`] with a pass-through fallback
//! - **Transport-agnostic**: Fetching goes through the [`Fetcher`] trait
//!
//! # Example
//!
//! ```ignore
//! use assetline::{AssetPipeline, HttpFetcher};
//!
//! let pipeline = AssetPipeline::builder()
//!     .fetcher(HttpFetcher::new())
//!     .asset_prefix("https://example.com/assets/")
//!     .with_builtin_decoders()
//!     .build();
//!
//! // Batch-load a level, then pick individual assets out of the cache.
//! pipeline.enqueue_asset("level1.json");
//! pipeline.enqueue_asset("tiles.png");
//! let assets = pipeline.process_queue().await?;
//!
//! let tiles = pipeline.request_asset("tiles.png").await?;
//! ```

pub mod cache;
mod coordinator;
mod error;
pub mod fetch;
mod pipeline;
mod queue;
pub mod registry;
pub mod spawn;
pub mod types;

pub use cache::AssetCache;
pub use coordinator::AssetFuture;
pub use error::{Error, Result};
pub use fetch::{FetchFuture, Fetcher, HttpFetcher, TransportError};
pub use pipeline::{AssetPipeline, AssetPipelineBuilder};
pub use registry::{ContentDecoderRegistry, DecodeFuture, Decoder};
pub use spawn::{Spawn, TokioSpawner};
pub use types::{
    Asset, Content, DEFAULT_CONTENT_TYPE, PipelineStats, RawResponse, UriState,
    normalize_content_type,
};

// Re-export decode types for convenience.
pub use assetline_decode::{DecodeError, DecodeResult, DecodedImage, ImageKind};
