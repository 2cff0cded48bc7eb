//! Cache interceptor
//!
//! Sits between the caller and the network transport. Subscriptions pass through with
//! each event written to the cache; queries and mutations go through the fetch-policy
//! state machine and, when a refetch policy is set, keep watching the cache.

pub mod fetch;
pub mod optimistic;
pub mod stream;
pub mod watch;
pub mod writer;

pub use fetch::FetchExecutor;
pub use optimistic::{OptimisticTicket, OptimisticUpdates};
pub use stream::ResponseStream;
pub use writer::{CacheWriter, SkipReason, WriteDecision, WriteDispatcher};

use crate::operation::OperationKind;
use crate::request::Request;
use crate::store::NormalizedStore;
use crate::transport::Transport;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Fetch-policy interceptor over a normalized store
#[derive(Clone)]
pub struct CacheInterceptor {
    store: Arc<dyn NormalizedStore>,
    writer: CacheWriter,
}

impl CacheInterceptor {
    pub fn new(store: Arc<dyn NormalizedStore>, dispatcher: WriteDispatcher) -> Self {
        let writer = CacheWriter::new(Arc::clone(&store), dispatcher);
        Self { store, writer }
    }

    pub fn store(&self) -> &Arc<dyn NormalizedStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> WriteDispatcher {
        self.writer.dispatcher()
    }

    /// Executor bound to `transport`, for running single attempts directly
    pub fn executor(&self, transport: Arc<dyn Transport>) -> FetchExecutor {
        FetchExecutor::new(Arc::clone(&self.store), transport, self.writer.clone())
    }

    /// Produce the response stream for `request`
    pub fn intercept(&self, request: Request, transport: Arc<dyn Transport>) -> ResponseStream {
        let cancel = CancellationToken::new();
        debug!(
            request_id = %request.request_id,
            operation = %request.operation.name,
            kind = %request.kind(),
            "Intercepting request"
        );
        match request.kind() {
            OperationKind::Subscription => ResponseStream::new(
                cancel.clone(),
                stream::subscription(request, transport, self.writer.clone(), cancel),
            ),
            OperationKind::Query | OperationKind::Mutation => {
                let executor = self.executor(transport);
                ResponseStream::new(cancel.clone(), watch::watch(executor, request, cancel))
            }
        }
    }
}
