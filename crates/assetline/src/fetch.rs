//! The fetch capability the pipeline consumes.
//!
//! The pipeline never talks to the network itself. It hands a fully
//! prefixed URL to a [`Fetcher`] and gets headers and body back.
//!
//! # Implementations
//!
//! - [`HttpFetcher`]: HTTP(S) via `reqwest`

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use crate::types::RawResponse;

/// Future type for fetch operations.
pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + 'a>>;

/// A transport-level failure: the request could not be completed at all.
///
/// Timeouts are reported this way too.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Create a transport error from any displayable cause.
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Something that can fetch a URL.
///
/// A response with `ok == false` (e.g. a 404) is not a transport error; the
/// pipeline turns both into [`Error::Fetch`](crate::Error::Fetch).
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, returning its headers and body.
    fn fetch(&self, url: &str) -> FetchFuture<'_>;
}

impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    fn fetch(&self, url: &str) -> FetchFuture<'_> {
        (**self).fetch(url)
    }
}

/// Fetches over HTTP(S) using `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with default client settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher around a preconfigured client.
    #[must_use]
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Create a fetcher whose requests time out after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::new)?;
        Ok(Self { http })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> FetchFuture<'_> {
        let url = url.to_string();
        Box::pin(async move {
            let response = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(TransportError::new)?;

            let status = response.status();
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);

            if !status.is_success() {
                return Ok(RawResponse {
                    status: status.as_u16(),
                    ok: false,
                    content_type,
                    body: Vec::new(),
                });
            }

            let body = response.bytes().await.map_err(TransportError::new)?;

            Ok(RawResponse {
                status: status.as_u16(),
                ok: true,
                content_type,
                body: body.to_vec(),
            })
        })
    }
}
