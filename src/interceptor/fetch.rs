//! Fetch executor
//!
//! Runs one attempt of a request under a fetch policy. Single-source policies
//! propagate their failure as-is; two-source policies fall back and only fail with a
//! composite once both sources failed.

use crate::error::{FetchError, NetworkError};
use crate::interceptor::optimistic::OptimisticUpdates;
use crate::interceptor::writer::{run_to_completion, CacheWriter};
use crate::policy::FetchPolicy;
use crate::request::{Request, Response};
use crate::store::NormalizedStore;
use crate::transport::Transport;
use crate::types::CacheKeySet;
use futures::StreamExt;
use std::sync::Arc;
use tracing::debug;

/// Runs single fetch attempts and feeds their results to the cache writer
#[derive(Clone)]
pub struct FetchExecutor {
    store: Arc<dyn NormalizedStore>,
    transport: Arc<dyn Transport>,
    writer: CacheWriter,
    optimistic: OptimisticUpdates,
}

impl FetchExecutor {
    pub fn new(
        store: Arc<dyn NormalizedStore>,
        transport: Arc<dyn Transport>,
        writer: CacheWriter,
    ) -> Self {
        let optimistic = OptimisticUpdates::new(Arc::clone(&store));
        Self {
            store,
            transport,
            writer,
            optimistic,
        }
    }

    pub fn store(&self) -> &Arc<dyn NormalizedStore> {
        &self.store
    }

    pub fn writer(&self) -> &CacheWriter {
        &self.writer
    }

    /// One attempt: stage optimistic data, fetch under `policy`, roll back, write.
    ///
    /// On success the rollback keys are published together with the written keys. On
    /// failure the optimistic layer is rolled back and published on its own.
    pub async fn fetch_one(
        &self,
        request: &Request,
        policy: FetchPolicy,
    ) -> Result<Response, FetchError> {
        let ticket = self.optimistic.stage(request).await;

        match self.fetch_with_policy(request, policy).await {
            Ok(response) => {
                // The ticket moves into the write so the rollback and the publish of
                // its keys cannot be separated by a dropped caller.
                self.writer
                    .write_after(request, &response, async move {
                        match ticket {
                            Some(ticket) => ticket.rollback(false).await,
                            None => CacheKeySet::new(),
                        }
                    })
                    .await;
                Ok(response)
            }
            Err(error) => {
                if let Some(ticket) = ticket {
                    run_to_completion(ticket.rollback(true)).await;
                }
                Err(error)
            }
        }
    }

    /// A follow-up attempt for a live request: like [`fetch_one`](Self::fetch_one)
    /// but never stages optimistic data, which only belongs to the first attempt.
    pub async fn refetch(
        &self,
        request: &Request,
        policy: FetchPolicy,
    ) -> Result<Response, FetchError> {
        let response = self.fetch_with_policy(request, policy).await?;
        self.writer
            .maybe_write_to_cache(request, &response, CacheKeySet::new())
            .await;
        Ok(response)
    }

    async fn fetch_with_policy(
        &self,
        request: &Request,
        policy: FetchPolicy,
    ) -> Result<Response, FetchError> {
        debug!(
            request_id = %request.request_id,
            operation = %request.operation.name,
            %policy,
            "Fetching"
        );
        match policy {
            FetchPolicy::CacheFirst => {
                let cache_error = match self.read_from_cache(request).await {
                    Ok(response) => return Ok(response),
                    Err(e) => e,
                };
                debug!(request_id = %request.request_id, error = %cache_error, "Cache miss, trying network");
                let network_error = match self.read_from_network(request).await {
                    Ok(response) => return Ok(response),
                    Err(e) => e,
                };
                Err(FetchError::composite(cache_error, network_error))
            }
            FetchPolicy::NetworkFirst => {
                let network_error = match self.read_from_network(request).await {
                    Ok(response) => return Ok(response),
                    Err(e) => e,
                };
                debug!(request_id = %request.request_id, error = %network_error, "Network failed, trying cache");
                let cache_error = match self.read_from_cache(request).await {
                    Ok(response) => return Ok(response),
                    Err(e) => e,
                };
                Err(FetchError::composite(network_error, cache_error))
            }
            FetchPolicy::CacheOnly => self.read_from_cache(request).await,
            FetchPolicy::NetworkOnly => self.read_from_network(request).await,
        }
    }

    async fn read_from_cache(&self, request: &Request) -> Result<Response, FetchError> {
        let data = self
            .store
            .read_operation(
                &request.operation,
                &request.context.scalar_adapters,
                &request.cache_context().cache_headers,
            )
            .await?;
        Ok(Response::with_data(request, data).tagged(true))
    }

    /// First response the transport emits, tagged as not from cache
    async fn read_from_network(&self, request: &Request) -> Result<Response, FetchError> {
        let mut responses = self.transport.proceed(request.clone());
        match responses.next().await {
            Some(Ok(response)) => Ok(response.tagged(false)),
            Some(Err(e)) => Err(e.into()),
            None => Err(NetworkError::NoResponse.into()),
        }
    }
}
