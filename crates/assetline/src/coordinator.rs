//! Single-flight fetch coordination.
//!
//! Every URI the coordinator knows about is in exactly one of three places:
//! the deferred queue, the in-flight table, or the asset cache. All three are
//! read and written under one lock, so a check-then-mark never races with
//! another caller: the first request for a URI becomes its fetch, and every
//! later request joins that fetch's waiter list until it settles.

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    future::Future,
    panic::AssertUnwindSafe,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock},
    task::{Context, Poll},
};

use assetline_decode::DecodeError;
use futures::FutureExt;
use tokio::sync::oneshot;

use crate::{
    cache::AssetCache,
    error::{Error, Result},
    fetch::Fetcher,
    queue::DeferredQueue,
    registry::{ContentDecoderRegistry, Decoder},
    spawn::Spawn,
    types::{Asset, PipelineStats, UriState},
};

type Outcome = Result<Arc<Asset>>;
type Waiter = oneshot::Sender<Outcome>;

#[derive(Default)]
struct StateTable {
    /// Waiters per in-flight URI, in registration order.
    in_flight: HashMap<String, Vec<Waiter>>,
    queue: DeferredQueue,
}

pub(crate) struct FetchCoordinator {
    table: Mutex<StateTable>,
    cache: AssetCache,
    registry: RwLock<ContentDecoderRegistry>,
    fetcher: Arc<dyn Fetcher>,
    spawner: Arc<dyn Spawn>,
    prefix: OnceLock<String>,
}

impl FetchCoordinator {
    pub(crate) fn new(
        fetcher: Arc<dyn Fetcher>,
        spawner: Arc<dyn Spawn>,
        registry: ContentDecoderRegistry,
    ) -> Self {
        Self {
            table: Mutex::new(StateTable::default()),
            cache: AssetCache::new(),
            registry: RwLock::new(registry),
            fetcher,
            spawner,
            prefix: OnceLock::new(),
        }
    }

    fn table(&self) -> MutexGuard<'_, StateTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn prefix(&self) -> &str {
        self.prefix.get().map_or("", String::as_str)
    }

    pub(crate) fn set_prefix(&self, prefix: String) -> Result<()> {
        self.prefix.set(prefix).map_err(|_| Error::PrefixAlreadySet)
    }

    pub(crate) fn register(&self, content_type: &str, decoder: Decoder) -> Result<()> {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(content_type, decoder)
    }

    pub(crate) fn cached(&self, uri: &str) -> Option<Arc<Asset>> {
        self.cache.get(uri)
    }

    /// Request `uri`, starting a fetch only if none is running for it.
    ///
    /// The request is registered before this returns; the future only
    /// delivers the outcome.
    pub(crate) fn request(self: &Arc<Self>, uri: &str) -> AssetFuture {
        let mut table = self.table();
        let (future, launch) = self.join_or_mark(&mut table, uri);
        drop(table);

        if launch {
            self.launch(vec![uri.to_string()]);
        }
        future
    }

    /// Queue `uri` for the next flush. Returns `false` if it is already
    /// queued, in flight or resolved.
    pub(crate) fn enqueue(&self, uri: &str) -> bool {
        let mut table = self.table();
        if self.cache.has(uri) || table.in_flight.contains_key(uri) {
            tracing::debug!(uri, "already tracked, not queueing");
            return false;
        }

        let queued = table.queue.push(uri);
        if queued {
            tracing::debug!(uri, queued = table.queue.len(), "queued");
        }
        queued
    }

    /// Move every queued URI in flight, oldest first.
    pub(crate) fn flush_queued(self: &Arc<Self>) -> Vec<(String, AssetFuture)> {
        let mut table = self.table();
        let uris = table.queue.drain();

        let mut pending = Vec::with_capacity(uris.len());
        let mut launches = Vec::new();
        for uri in uris {
            let (future, launch) = self.join_or_mark(&mut table, &uri);
            if launch {
                launches.push(uri.clone());
            }
            pending.push((uri, future));
        }
        drop(table);

        tracing::debug!(count = pending.len(), "flushing queue");
        self.launch(launches);
        pending
    }

    pub(crate) fn state(&self, uri: &str) -> UriState {
        let table = self.table();
        if self.cache.has(uri) {
            UriState::Resolved
        } else if table.in_flight.contains_key(uri) {
            UriState::InFlight
        } else if table.queue.contains(uri) {
            UriState::Queued
        } else {
            UriState::Unknown
        }
    }

    pub(crate) fn stats(&self) -> PipelineStats {
        let table = self.table();
        PipelineStats {
            queued: table.queue.len(),
            in_flight: table.in_flight.len(),
            resolved: self.cache.len(),
        }
    }

    /// The check-and-set at the heart of single-flight. Must be called with
    /// the table locked. Returns the caller's future and whether the caller
    /// must launch the fetch.
    fn join_or_mark(&self, table: &mut StateTable, uri: &str) -> (AssetFuture, bool) {
        if let Some(asset) = self.cache.get(uri) {
            tracing::debug!(uri, "cache hit");
            return (AssetFuture::ready(Ok(asset)), false);
        }

        let (tx, rx) = oneshot::channel();
        let future = AssetFuture::waiting(uri, rx);

        if let Some(waiters) = table.in_flight.get_mut(uri) {
            tracing::debug!(uri, waiters = waiters.len(), "joining in-flight fetch");
            waiters.push(tx);
            return (future, false);
        }

        table.queue.remove(uri);
        table.in_flight.insert(uri.to_string(), vec![tx]);
        (future, true)
    }

    /// Spawn one fetch per URI. Every URI must already be marked in flight.
    fn launch(self: &Arc<Self>, uris: Vec<String>) {
        // All guards exist before the first spawn. If spawning panics, the
        // guards not yet handed over unwind with it and settle their URIs.
        let guards: Vec<InFlightGuard> = uris
            .into_iter()
            .map(|uri| InFlightGuard {
                coordinator: Arc::clone(self),
                uri,
                settled: false,
            })
            .collect();

        for guard in guards {
            self.spawner.spawn(Box::pin(async move {
                let outcome = guard.coordinator.load(&guard.uri).await;
                guard.settle(outcome);
            }));
        }
    }

    async fn load(&self, uri: &str) -> Outcome {
        let url = format!("{}{uri}", self.prefix());
        tracing::debug!(uri, url, "fetching");

        let response = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|e| Error::Fetch {
                uri: uri.to_string(),
                message: e.to_string(),
            })?;

        if !response.ok {
            return Err(Error::Fetch {
                uri: uri.to_string(),
                message: format!("status {}", response.status),
            });
        }

        let content_type = response.resolved_content_type();
        let decoder = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(Some(&content_type));

        // Decoders may run synchronously inside `decode`, so the call itself
        // goes inside the unwind boundary.
        let content = AssertUnwindSafe(async move { decoder.decode(response).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(DecodeError::custom(panic_message(&*panic))))
            .map_err(|source| Error::Decode {
                uri: uri.to_string(),
                content_type: content_type.clone(),
                source,
            })?;

        Ok(Arc::new(Asset {
            uri: uri.to_string(),
            content_type,
            content,
        }))
    }

    /// Record the outcome for `uri` and wake everyone waiting on it.
    fn settle(&self, uri: &str, outcome: &Outcome) {
        let waiters = {
            let mut table = self.table();
            if let Ok(asset) = outcome {
                self.cache.put(Arc::clone(asset));
            }
            table.in_flight.remove(uri).unwrap_or_default()
        };

        match outcome {
            Ok(asset) => tracing::debug!(
                uri,
                content_type = asset.content_type.as_str(),
                waiters = waiters.len(),
                "resolved"
            ),
            Err(e) => tracing::warn!(uri, waiters = waiters.len(), "{e}"),
        }

        // Sent after the lock is released so that waiters may re-enter.
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause");
    format!("decoder panicked: {detail}")
}

/// Settles an in-flight URI even if its task never finishes normally.
struct InFlightGuard {
    coordinator: Arc<FetchCoordinator>,
    uri: String,
    settled: bool,
}

impl InFlightGuard {
    fn settle(mut self, outcome: Outcome) {
        self.settled = true;
        self.coordinator.settle(&self.uri, &outcome);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.settled {
            let uri = std::mem::take(&mut self.uri);
            self.coordinator
                .settle(&uri, &Err(Error::Interrupted { uri: uri.clone() }));
        }
    }
}

/// Resolves to the asset for one request.
///
/// Returned by [`AssetPipeline::request_asset`](crate::AssetPipeline::request_asset).
/// The request is already registered when this is created, so dropping it
/// does not cancel the fetch; other callers still receive the asset.
#[must_use = "the asset is only delivered through the future"]
pub struct AssetFuture {
    state: FutureState,
}

enum FutureState {
    Ready(Option<Outcome>),
    Waiting {
        uri: String,
        rx: oneshot::Receiver<Outcome>,
    },
}

impl AssetFuture {
    fn ready(outcome: Outcome) -> Self {
        Self {
            state: FutureState::Ready(Some(outcome)),
        }
    }

    fn waiting(uri: &str, rx: oneshot::Receiver<Outcome>) -> Self {
        Self {
            state: FutureState::Waiting {
                uri: uri.to_string(),
                rx,
            },
        }
    }

    /// Whether the outcome was available at request time (a cache hit).
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, FutureState::Ready(_))
    }
}

impl Future for AssetFuture {
    type Output = Result<Arc<Asset>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            FutureState::Ready(outcome) => {
                Poll::Ready(outcome.take().expect("AssetFuture polled after completion"))
            }
            FutureState::Waiting { uri, rx } => Pin::new(rx).poll(cx).map(|received| {
                received.unwrap_or_else(|_| Err(Error::Interrupted { uri: uri.clone() }))
            }),
        }
    }
}

impl fmt::Debug for AssetFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            FutureState::Ready(_) => f.write_str("AssetFuture::Ready"),
            FutureState::Waiting { uri, .. } => {
                f.debug_struct("AssetFuture::Waiting").field("uri", uri).finish()
            }
        }
    }
}
