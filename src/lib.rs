//! Normcache: Normalized GraphQL Cache Interceptor
//!
//! Sits between a GraphQL client and its network transport. Each request is served
//! from a normalized cache, the network, or both according to its fetch policy.
//! Network results are written back, optimistic mutation results are staged and
//! rolled back, and watched queries refetch when the records they depend on change.

pub mod client;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod logging;
pub mod operation;
pub mod policy;
pub mod request;
pub mod store;
pub mod testing;
pub mod transport;
pub mod types;

pub use client::{Client, ClientBuilder, RequestBuilder};
pub use config::{CacheConfig, ConfigLoader, NormcacheConfig};
pub use error::{ApiError, CacheMissError, FetchError, NetworkError, StoreError};
pub use interceptor::{CacheInterceptor, ResponseStream, WriteDispatcher};
pub use operation::{Field, GraphqlError, Operation, OperationKind};
pub use policy::{CacheContext, CacheFlags, CacheHeaders, FetchPolicy};
pub use request::{ExecutionContext, Request, Response, ScalarAdapter, ScalarAdapters};
pub use store::memory::MemoryStore;
pub use store::NormalizedStore;
pub use transport::Transport;
pub use types::{CacheKey, CacheKeySet, RequestId};
