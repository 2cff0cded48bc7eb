//! Optimistic update staging
//!
//! Staging returns an [`OptimisticTicket`]; rolling back consumes it, so a staged
//! layer can be rolled back at most once. A ticket dropped while still armed (the
//! attempt was abandoned) rolls back and publishes from a spawned task.

use crate::request::Request;
use crate::store::NormalizedStore;
use crate::types::{CacheKeySet, RequestId};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Stages optimistic data for requests that carry it
#[derive(Clone)]
pub struct OptimisticUpdates {
    store: Arc<dyn NormalizedStore>,
}

impl OptimisticUpdates {
    pub fn new(store: Arc<dyn NormalizedStore>) -> Self {
        Self { store }
    }

    /// Stage the request's optimistic data and publish it right away.
    ///
    /// Returns `None` when the request has no optimistic data or staging failed.
    pub async fn stage(&self, request: &Request) -> Option<OptimisticTicket> {
        let data = request.cache_context().optimistic_data.as_ref()?;
        let staged = self
            .store
            .write_optimistic_updates(
                &request.operation,
                data,
                request.request_id,
                &request.context.scalar_adapters,
                true,
            )
            .await;
        match staged {
            Ok(keys) => {
                debug!(
                    request_id = %request.request_id,
                    keys = keys.len(),
                    "Staged optimistic update"
                );
                Some(OptimisticTicket {
                    store: Arc::clone(&self.store),
                    mutation_id: request.request_id,
                    armed: true,
                })
            }
            Err(e) => {
                warn!(
                    request_id = %request.request_id,
                    error = %e,
                    "Failed to stage optimistic update"
                );
                None
            }
        }
    }
}

/// Outstanding optimistic layer of one request
pub struct OptimisticTicket {
    store: Arc<dyn NormalizedStore>,
    mutation_id: RequestId,
    armed: bool,
}

impl OptimisticTicket {
    pub fn mutation_id(&self) -> RequestId {
        self.mutation_id
    }

    /// Roll the layer back, returning the keys it covered
    pub async fn rollback(mut self, publish: bool) -> CacheKeySet {
        self.armed = false;
        self.store
            .rollback_optimistic_updates(self.mutation_id, publish)
            .await
    }
}

impl Drop for OptimisticTicket {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let store = Arc::clone(&self.store);
        let mutation_id = self.mutation_id;
        match Handle::try_current() {
            Ok(handle) => {
                debug!(%mutation_id, "Rolling back abandoned optimistic update");
                handle.spawn(async move {
                    store.rollback_optimistic_updates(mutation_id, true).await;
                });
            }
            Err(_) => warn!(
                %mutation_id,
                "Optimistic update abandoned outside a runtime; layer left in place"
            ),
        }
    }
}
