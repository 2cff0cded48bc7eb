//! Refetch-on-change loop for queries and mutations
//!
//! The initial attempt uses the request's fetch policy. Without a refetch policy the
//! stream ends after it. With one, the loop subscribes to the store's changed-key
//! notifications and refetches whenever a notification touches a record the latest
//! good response depends on. Notifications are handled one at a time, in order.
//! Refetches do not stage the request's optimistic data again.

use crate::error::FetchError;
use crate::interceptor::fetch::FetchExecutor;
use crate::policy::FetchPolicy;
use crate::request::{Request, Response};
use crate::store::{dependent_keys, ChangedKeysStream};
use crate::types::CacheKeySet;
use futures::stream::{self, Stream, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument, Span};

type Step = Option<(Result<Response, FetchError>, WatchState)>;

enum WatchState {
    Initial,
    Watching {
        changes: ChangedKeysStream,
        refetch_policy: FetchPolicy,
        /// `None` until a clean response was seen; every notification is then relevant
        watched: Option<CacheKeySet>,
    },
    Done,
}

struct Watch {
    executor: FetchExecutor,
    request: Request,
    cancel: CancellationToken,
    span: Span,
}

/// Stream of responses for a query or mutation
pub(crate) fn watch(
    executor: FetchExecutor,
    request: Request,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<Response, FetchError>> + Send + 'static {
    let span = tracing::debug_span!(
        "watch",
        request_id = %request.request_id,
        operation = %request.operation.name
    );
    let watch = Arc::new(Watch {
        executor,
        request,
        cancel,
        span,
    });
    stream::unfold(WatchState::Initial, move |state| {
        let watch = Arc::clone(&watch);
        async move {
            let span = watch.span.clone();
            watch.step(state).instrument(span).await
        }
    })
}

impl Watch {
    async fn step(&self, state: WatchState) -> Step {
        match state {
            WatchState::Initial => self.initial().await,
            WatchState::Watching {
                changes,
                refetch_policy,
                watched,
            } => self.next_change(changes, refetch_policy, watched).await,
            WatchState::Done => None,
        }
    }

    async fn initial(&self) -> Step {
        let cache = self.request.cache_context();
        let result = self
            .until_cancelled(self.executor.fetch_one(&self.request, cache.fetch_policy))
            .await?;

        let Some(refetch_policy) = cache.refetch_policy else {
            return Some((result, WatchState::Done));
        };
        match result {
            Ok(response) => {
                let watched = self.dependent_keys(&response);
                debug!(
                    watched = ?watched.as_ref().map(|keys| keys.len()),
                    "Initial response emitted, watching for changes"
                );
                let changes = self.executor.store().changed_keys();
                Some((
                    Ok(response),
                    WatchState::Watching {
                        changes,
                        refetch_policy,
                        watched,
                    },
                ))
            }
            Err(error) => Some((Err(error), WatchState::Done)),
        }
    }

    async fn next_change(
        &self,
        mut changes: ChangedKeysStream,
        refetch_policy: FetchPolicy,
        mut watched: Option<CacheKeySet>,
    ) -> Step {
        loop {
            let changed = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                changed = changes.next() => changed?,
            };
            let relevant = watched
                .as_ref()
                .map_or(true, |keys| !keys.is_disjoint(&changed));
            if !relevant {
                continue;
            }

            let refetch = self.executor.refetch(&self.request, refetch_policy);
            match self.until_cancelled(refetch).await? {
                Ok(response) => {
                    if let Some(keys) = self.dependent_keys(&response) {
                        watched = Some(keys);
                    }
                    return Some((
                        Ok(response),
                        WatchState::Watching {
                            changes,
                            refetch_policy,
                            watched,
                        },
                    ));
                }
                Err(error) => {
                    debug!(error = %error, "Refetch failed, still watching");
                }
            }
        }
    }

    /// Run an attempt, abandoned if the stream is cancelled meanwhile
    async fn until_cancelled<F>(&self, attempt: F) -> Option<Result<Response, FetchError>>
    where
        F: Future<Output = Result<Response, FetchError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = attempt => Some(result),
        }
    }

    /// Keys a clean, data-bearing response depends on
    fn dependent_keys(&self, response: &Response) -> Option<CacheKeySet> {
        if response.has_errors() {
            return None;
        }
        let data = response.data.as_ref().filter(|data| !data.is_null())?;
        match self.executor.store().normalize(
            &self.request.operation,
            data,
            &self.request.context.scalar_adapters,
        ) {
            Ok(records) => Some(dependent_keys(records.values())),
            Err(e) => {
                warn!(error = %e, "Could not compute dependent keys");
                None
            }
        }
    }
}
