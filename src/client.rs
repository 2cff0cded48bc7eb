//! Client facade
//!
//! [`Client`] owns a store, a transport and the cache interceptor between them.
//! [`ClientBuilder`] picks those components and the process-wide defaults;
//! [`RequestBuilder`] fills in one request's cache context before execution.

use crate::config::CacheConfig;
use crate::error::ApiError;
use crate::interceptor::{CacheInterceptor, ResponseStream, WriteDispatcher};
use crate::operation::Operation;
use crate::policy::{CacheContext, CacheFlags, FetchPolicy};
use crate::request::{ExecutionContext, Request, ScalarAdapters};
use crate::store::memory::MemoryStore;
use crate::store::NormalizedStore;
use crate::transport::Transport;
use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

/// GraphQL client with a normalized cache in front of its transport
#[derive(Clone)]
pub struct Client {
    interceptor: CacheInterceptor,
    transport: Arc<dyn Transport>,
    default_fetch_policy: FetchPolicy,
    default_refetch_policy: Option<FetchPolicy>,
    default_flags: CacheFlags,
    scalar_adapters: Arc<ScalarAdapters>,
    scope: Option<Handle>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn store(&self) -> &Arc<dyn NormalizedStore> {
        self.interceptor.store()
    }

    pub fn interceptor(&self) -> &CacheInterceptor {
        &self.interceptor
    }

    pub fn query(&self, operation: Operation) -> RequestBuilder<'_> {
        RequestBuilder::new(self, operation)
    }

    pub fn mutate(&self, operation: Operation) -> RequestBuilder<'_> {
        RequestBuilder::new(self, operation)
    }

    pub fn subscribe(&self, operation: Operation) -> RequestBuilder<'_> {
        RequestBuilder::new(self, operation)
    }

    /// Run an already built request
    pub fn execute(&self, request: Request) -> ResponseStream {
        self.interceptor.intercept(request, Arc::clone(&self.transport))
    }
}

/// Builder for [`Client`]
#[derive(Default)]
pub struct ClientBuilder {
    store: Option<Arc<dyn NormalizedStore>>,
    transport: Option<Arc<dyn Transport>>,
    write_to_cache_asynchronously: bool,
    default_fetch_policy: FetchPolicy,
    default_refetch_policy: Option<FetchPolicy>,
    store_partial_responses: bool,
    scalar_adapters: ScalarAdapters,
    scope: Option<Handle>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from loaded configuration; later calls still override it
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            write_to_cache_asynchronously: config.write_to_cache_asynchronously,
            default_fetch_policy: config.default_fetch_policy,
            default_refetch_policy: config.default_refetch_policy,
            store_partial_responses: config.store_partial_responses,
            ..Self::default()
        }
    }

    pub fn store(mut self, store: Arc<dyn NormalizedStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn write_to_cache_asynchronously(mut self, enabled: bool) -> Self {
        self.write_to_cache_asynchronously = enabled;
        self
    }

    pub fn default_fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.default_fetch_policy = policy;
        self
    }

    pub fn default_refetch_policy(mut self, policy: Option<FetchPolicy>) -> Self {
        self.default_refetch_policy = policy;
        self
    }

    pub fn store_partial_responses(mut self, enabled: bool) -> Self {
        self.store_partial_responses = enabled;
        self
    }

    pub fn scalar_adapters(mut self, adapters: ScalarAdapters) -> Self {
        self.scalar_adapters = adapters;
        self
    }

    /// Runtime for background cache writes; defaults to the current runtime
    pub fn scope(mut self, handle: Handle) -> Self {
        self.scope = Some(handle);
        self
    }

    pub fn build(self) -> Result<Client, ApiError> {
        let transport = self
            .transport
            .ok_or(ApiError::MissingComponent("network transport"))?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn NormalizedStore>);
        let dispatcher = WriteDispatcher::from_async_flag(self.write_to_cache_asynchronously);
        let scope = self.scope.or_else(|| Handle::try_current().ok());
        let mut default_flags = CacheFlags::NONE;
        if self.store_partial_responses {
            default_flags |= CacheFlags::STORE_PARTIAL_RESPONSE;
        }

        info!(
            dispatcher = ?dispatcher,
            fetch_policy = %self.default_fetch_policy,
            refetch_policy = ?self.default_refetch_policy,
            has_scope = scope.is_some(),
            "Client built"
        );

        Ok(Client {
            interceptor: CacheInterceptor::new(store, dispatcher),
            transport,
            default_fetch_policy: self.default_fetch_policy,
            default_refetch_policy: self.default_refetch_policy,
            default_flags,
            scalar_adapters: Arc::new(self.scalar_adapters),
            scope,
        })
    }
}

/// Fluent per-request cache configuration
pub struct RequestBuilder<'a> {
    client: &'a Client,
    operation: Operation,
    cache: CacheContext,
}

impl<'a> RequestBuilder<'a> {
    fn new(client: &'a Client, operation: Operation) -> Self {
        let cache = CacheContext {
            fetch_policy: client.default_fetch_policy,
            refetch_policy: client.default_refetch_policy,
            flags: client.default_flags,
            ..CacheContext::default()
        };
        Self {
            client,
            operation,
            cache,
        }
    }

    pub fn fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.cache.fetch_policy = policy;
        self
    }

    /// Keep watching the cache, refetching with `policy` on relevant changes
    pub fn refetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.cache.refetch_policy = Some(policy);
        self
    }

    pub fn no_refetch(mut self) -> Self {
        self.cache.refetch_policy = None;
        self
    }

    pub fn optimistic_data(mut self, data: Value) -> Self {
        self.cache.optimistic_data = Some(data);
        self
    }

    pub fn cache_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cache.cache_headers.insert(name.into(), value.into());
        self
    }

    pub fn do_not_store(mut self, enabled: bool) -> Self {
        self.set_flag(CacheFlags::DO_NOT_STORE, enabled);
        self
    }

    pub fn store_partial_responses(mut self, enabled: bool) -> Self {
        self.set_flag(CacheFlags::STORE_PARTIAL_RESPONSE, enabled);
        self
    }

    fn set_flag(&mut self, flag: CacheFlags, enabled: bool) {
        if enabled {
            self.cache.flags |= flag;
        } else {
            self.cache.flags.remove(flag);
        }
    }

    pub fn build(self) -> Request {
        let context = ExecutionContext {
            cache: self.cache,
            scalar_adapters: Arc::clone(&self.client.scalar_adapters),
            scope: self.client.scope.clone(),
        };
        Request::with_context(self.operation, context)
    }

    pub fn execute(self) -> ResponseStream {
        let client = self.client;
        client.execute(self.build())
    }
}
