//! Normalized cache store contract
//!
//! The interceptor talks to the cache exclusively through [`NormalizedStore`]. How
//! records are indexed is up to the implementation; [`MemoryStore`] is the in-process
//! reference implementation.

pub mod memory;
pub mod normalize;
pub mod record;

pub use memory::MemoryStore;
pub use record::{dependent_keys, Record, RecordMap, RecordValue};

use crate::error::{CacheMissError, StoreError};
use crate::operation::Operation;
use crate::policy::CacheHeaders;
use crate::request::ScalarAdapters;
use crate::types::{CacheKeySet, RequestId};
use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

/// Cache header: drop the records a successful read visited
pub const EVICT_AFTER_READ: &str = "evict-after-read";

/// Live stream of changed-key notifications.
///
/// Unbounded, ordered, and never ends on its own; dropping it unsubscribes.
pub type ChangedKeysStream = Pin<Box<dyn Stream<Item = CacheKeySet> + Send>>;

/// Normalized cache store interface
#[async_trait]
pub trait NormalizedStore: Send + Sync {
    /// Read the data of `operation` out of the cache
    async fn read_operation(
        &self,
        operation: &Operation,
        adapters: &ScalarAdapters,
        headers: &CacheHeaders,
    ) -> Result<Value, CacheMissError>;

    /// Normalize and write `data`, returning the keys of records that actually changed
    async fn write_operation(
        &self,
        operation: &Operation,
        data: &Value,
        adapters: &ScalarAdapters,
        headers: &CacheHeaders,
        publish: bool,
    ) -> Result<CacheKeySet, StoreError>;

    /// Normalize `data` without touching the store
    fn normalize(
        &self,
        operation: &Operation,
        data: &Value,
        adapters: &ScalarAdapters,
    ) -> Result<RecordMap, StoreError>;

    /// Stage `data` in an optimistic layer owned by `mutation_id`
    async fn write_optimistic_updates(
        &self,
        operation: &Operation,
        data: &Value,
        mutation_id: RequestId,
        adapters: &ScalarAdapters,
        publish: bool,
    ) -> Result<CacheKeySet, StoreError>;

    /// Drop the optimistic layer of `mutation_id`, returning the keys it covered.
    ///
    /// Rolling back an unknown id returns an empty set.
    async fn rollback_optimistic_updates(&self, mutation_id: RequestId, publish: bool)
        -> CacheKeySet;

    /// Notify watchers that `keys` changed, as a single notification
    async fn publish(&self, keys: CacheKeySet);

    /// Subscribe to changed-key notifications published from now on
    fn changed_keys(&self) -> ChangedKeysStream;
}
