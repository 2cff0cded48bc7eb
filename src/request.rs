//! Requests, responses and the per-request execution context.

use crate::operation::{GraphqlError, Operation, OperationKind};
use crate::policy::CacheContext;
use crate::types::RequestId;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Converts custom scalar values between their wire form and their cached form
pub trait ScalarAdapter: Send + Sync {
    /// Wire value -> value stored in a record
    fn encode(&self, value: &Value) -> Result<Value, String>;
    /// Stored value -> wire value
    fn decode(&self, value: &Value) -> Result<Value, String>;
}

/// Custom scalar adapters keyed by GraphQL scalar type name.
///
/// Scalars without a registered adapter are stored as-is.
#[derive(Clone, Default)]
pub struct ScalarAdapters {
    adapters: HashMap<String, Arc<dyn ScalarAdapter>>,
}

impl ScalarAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adapter(
        mut self,
        scalar: impl Into<String>,
        adapter: impl ScalarAdapter + 'static,
    ) -> Self {
        self.adapters.insert(scalar.into(), Arc::new(adapter));
        self
    }

    pub fn get(&self, scalar: &str) -> Option<&Arc<dyn ScalarAdapter>> {
        self.adapters.get(scalar)
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for ScalarAdapters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.adapters.keys().collect();
        names.sort();
        f.debug_struct("ScalarAdapters").field("scalars", &names).finish()
    }
}

/// Capabilities attached to a request, resolved once when the request is built
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub cache: CacheContext,
    pub scalar_adapters: Arc<ScalarAdapters>,
    /// Runtime that background cache writes may be spawned on
    pub scope: Option<Handle>,
}

/// An immutable request travelling through the interceptor
#[derive(Debug, Clone)]
pub struct Request {
    pub request_id: RequestId,
    pub operation: Arc<Operation>,
    pub context: ExecutionContext,
}

impl Request {
    pub fn new(operation: Operation) -> Self {
        Self::with_context(operation, ExecutionContext::default())
    }

    pub fn with_context(operation: Operation, context: ExecutionContext) -> Self {
        Request {
            request_id: RequestId::new(),
            operation: Arc::new(operation),
            context,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.operation.kind
    }

    pub fn cache_context(&self) -> &CacheContext {
        &self.context.cache
    }
}

/// A response emitted by the interceptor
#[derive(Debug, Clone)]
pub struct Response {
    pub request_id: RequestId,
    pub operation: Arc<Operation>,
    pub data: Option<Value>,
    pub errors: Option<Vec<GraphqlError>>,
    from_cache: Option<bool>,
}

impl Response {
    /// Response with no cache-origin annotation yet
    pub fn new(request: &Request, data: Option<Value>, errors: Option<Vec<GraphqlError>>) -> Self {
        Response {
            request_id: request.request_id,
            operation: Arc::clone(&request.operation),
            data,
            errors,
            from_cache: None,
        }
    }

    pub fn with_data(request: &Request, data: Value) -> Self {
        Self::new(request, Some(data), None)
    }

    /// Annotate the cache origin. Only the interceptor does this, once, before emission.
    pub(crate) fn tagged(mut self, from_cache: bool) -> Self {
        self.from_cache = Some(from_cache);
        self
    }

    pub fn is_from_cache(&self) -> bool {
        self.from_cache.unwrap_or(false)
    }

    /// `None` if the response did not pass through the cache interceptor
    pub fn cache_origin(&self) -> Option<bool> {
        self.from_cache
    }

    pub fn has_data(&self) -> bool {
        matches!(&self.data, Some(data) if !data.is_null())
    }

    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }
}
