//! Cache writes
//!
//! Decides whether a response is persisted and publishes the changed keys, together
//! with any extra keys (optimistic rollbacks), as a single notification.

use crate::request::{Request, Response};
use crate::store::NormalizedStore;
use crate::types::CacheKeySet;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// How cache writes are executed relative to emitting the response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteDispatcher {
    /// Write and publish complete before the response is emitted
    #[default]
    Inline,
    /// Write on a spawned task when the request carries a scope; inline otherwise
    Background,
}

impl WriteDispatcher {
    pub fn from_async_flag(write_asynchronously: bool) -> Self {
        if write_asynchronously {
            WriteDispatcher::Background
        } else {
            WriteDispatcher::Inline
        }
    }

    /// Run `write` according to the mode
    pub async fn dispatch<F>(&self, scope: Option<&Handle>, write: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match (self, scope) {
            (WriteDispatcher::Background, Some(handle)) => {
                handle.spawn(write);
            }
            _ => {
                run_to_completion(write).await;
            }
        }
    }
}

/// Await `work` on its own task so that dropping the caller cannot cut it short.
///
/// Returns `None` if the task panicked. Outside a runtime `work` is awaited in place.
pub(crate) async fn run_to_completion<F>(work: F) -> Option<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => match handle.spawn(work).await {
            Ok(output) => Some(output),
            Err(e) => {
                warn!(error = %e, "Cache write task failed");
                None
            }
        },
        Err(_) => Some(work.await),
    }
}

/// Why a response was not written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DoNotStore,
    HasErrors,
}

/// Outcome of [`CacheWriter::maybe_write_to_cache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDecision {
    Skipped(SkipReason),
    Dispatched,
}

#[derive(Clone)]
pub struct CacheWriter {
    store: Arc<dyn NormalizedStore>,
    dispatcher: WriteDispatcher,
}

impl CacheWriter {
    pub fn new(store: Arc<dyn NormalizedStore>, dispatcher: WriteDispatcher) -> Self {
        Self { store, dispatcher }
    }

    pub fn dispatcher(&self) -> WriteDispatcher {
        self.dispatcher
    }

    /// Persist `response` if the request's flags allow it, then publish.
    ///
    /// When the response is skipped, non-empty `extra_keys` are still published so
    /// watchers see rolled-back optimistic records.
    pub async fn maybe_write_to_cache(
        &self,
        request: &Request,
        response: &Response,
        extra_keys: CacheKeySet,
    ) -> WriteDecision {
        self.write_after(request, response, async move { extra_keys })
            .await
    }

    /// Like [`maybe_write_to_cache`](Self::maybe_write_to_cache), with the extra keys
    /// produced by `before_write`.
    ///
    /// `before_write`, the write and the publish run as one unit: once this is called,
    /// dropping the caller's future no longer stops the publish.
    pub(crate) async fn write_after<B>(
        &self,
        request: &Request,
        response: &Response,
        before_write: B,
    ) -> WriteDecision
    where
        B: Future<Output = CacheKeySet> + Send + 'static,
    {
        let cache = request.cache_context();
        let skip = if cache.do_not_store() {
            Some(SkipReason::DoNotStore)
        } else if response.has_errors() && !cache.store_partial_responses() {
            Some(SkipReason::HasErrors)
        } else {
            None
        };

        let data = if skip.is_some() || response.is_from_cache() {
            None
        } else {
            response.data.clone().filter(|data| !data.is_null())
        };
        let store = Arc::clone(&self.store);
        let operation = Arc::clone(&request.operation);
        let adapters = Arc::clone(&request.context.scalar_adapters);
        let headers = cache.cache_headers.clone();
        let request_id = request.request_id;

        let write = async move {
            let extra_keys = before_write.await;
            let mut keys = match data {
                Some(data) => {
                    match store
                        .write_operation(&operation, &data, &adapters, &headers, false)
                        .await
                    {
                        Ok(keys) => keys,
                        Err(e) => {
                            warn!(%request_id, error = %e, "Cache write failed");
                            CacheKeySet::new()
                        }
                    }
                }
                None => CacheKeySet::new(),
            };
            keys.extend(extra_keys);
            if !keys.is_empty() {
                debug!(%request_id, keys = keys.len(), "Publishing cache write");
                store.publish(keys).await;
            }
        };

        match skip {
            Some(reason) => {
                debug!(%request_id, ?reason, "Skipping cache write");
                run_to_completion(write).await;
                WriteDecision::Skipped(reason)
            }
            None => {
                self.dispatcher
                    .dispatch(request.context.scope.as_ref(), write)
                    .await;
                WriteDecision::Dispatched
            }
        }
    }
}
