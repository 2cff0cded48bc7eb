//! Shared fixtures for integration tests

use async_trait::async_trait;
use normcache::error::{CacheMissError, StoreError};
use normcache::store::{ChangedKeysStream, RecordMap};
use normcache::testing::QueueTransport;
use normcache::{
    CacheHeaders, CacheKeySet, Client, Field, MemoryStore, NormalizedStore, Operation,
    RequestId, ScalarAdapters,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long a test waits before concluding that nothing is going to be emitted
pub const QUIET_PERIOD: Duration = Duration::from_millis(100);

/// `MemoryStore` that records what the interceptor asked of it
#[derive(Default)]
pub struct SpyStore {
    pub inner: MemoryStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
    write_delay: Mutex<Option<Duration>>,
    published: Mutex<Vec<CacheKeySet>>,
}

impl SpyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every later `write_operation` suspend for `delay` before writing
    pub fn delay_writes(&self, delay: Duration) {
        *self.write_delay.lock() = Some(delay);
    }

    /// Every non-empty notification sent to watchers, in order
    pub fn published(&self) -> Vec<CacheKeySet> {
        self.published.lock().clone()
    }

    fn record_publish(&self, keys: &CacheKeySet) {
        if !keys.is_empty() {
            self.published.lock().push(keys.clone());
        }
    }
}

#[async_trait]
impl NormalizedStore for SpyStore {
    async fn read_operation(
        &self,
        operation: &Operation,
        adapters: &ScalarAdapters,
        headers: &CacheHeaders,
    ) -> Result<Value, CacheMissError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_operation(operation, adapters, headers).await
    }

    async fn write_operation(
        &self,
        operation: &Operation,
        data: &Value,
        adapters: &ScalarAdapters,
        headers: &CacheHeaders,
        publish: bool,
    ) -> Result<CacheKeySet, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let delay = *self.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let keys = self
            .inner
            .write_operation(operation, data, adapters, headers, publish)
            .await?;
        if publish {
            self.record_publish(&keys);
        }
        Ok(keys)
    }

    fn normalize(
        &self,
        operation: &Operation,
        data: &Value,
        adapters: &ScalarAdapters,
    ) -> Result<RecordMap, StoreError> {
        self.inner.normalize(operation, data, adapters)
    }

    async fn write_optimistic_updates(
        &self,
        operation: &Operation,
        data: &Value,
        mutation_id: RequestId,
        adapters: &ScalarAdapters,
        publish: bool,
    ) -> Result<CacheKeySet, StoreError> {
        let keys = self
            .inner
            .write_optimistic_updates(operation, data, mutation_id, adapters, publish)
            .await?;
        if publish {
            self.record_publish(&keys);
        }
        Ok(keys)
    }

    async fn rollback_optimistic_updates(
        &self,
        mutation_id: RequestId,
        publish: bool,
    ) -> CacheKeySet {
        let keys = self
            .inner
            .rollback_optimistic_updates(mutation_id, publish)
            .await;
        if publish {
            self.record_publish(&keys);
        }
        keys
    }

    async fn publish(&self, keys: CacheKeySet) {
        self.record_publish(&keys);
        self.inner.publish(keys).await;
    }

    fn changed_keys(&self) -> ChangedKeysStream {
        self.inner.changed_keys()
    }
}

/// Client over a spy store and a queue transport, with inline writes
pub fn spy_client() -> (Client, Arc<SpyStore>, Arc<QueueTransport>) {
    let store = SpyStore::new();
    let transport = Arc::new(QueueTransport::new());
    let client = Client::builder()
        .store(store.clone())
        .transport(transport.clone())
        .build()
        .unwrap();
    (client, store, transport)
}

/// `query Hero { hero(id: $id) { __typename id name } }`
pub fn hero_query(id: &str) -> Operation {
    Operation::query(
        "Hero",
        vec![Field::object(
            "hero",
            vec![
                Field::scalar("__typename"),
                Field::scalar("id"),
                Field::scalar("name"),
            ],
        )
        .with_argument("id", json!(id))],
    )
    .with_variable("id", json!(id))
}

pub fn hero_data(id: &str, name: &str) -> Value {
    json!({"hero": {"__typename": "Hero", "id": id, "name": name}})
}

/// `mutation Rename { renameHero(id: $id, name: $name) { __typename id name } }`
pub fn rename_mutation(id: &str, name: &str) -> Operation {
    Operation::mutation(
        "Rename",
        vec![Field::object(
            "renameHero",
            vec![
                Field::scalar("__typename"),
                Field::scalar("id"),
                Field::scalar("name"),
            ],
        )
        .with_argument("id", json!(id))
        .with_argument("name", json!(name))],
    )
}

pub fn rename_data(id: &str, name: &str) -> Value {
    json!({"renameHero": {"__typename": "Hero", "id": id, "name": name}})
}

/// Write `data` for `operation` straight into the store, without publishing
pub async fn seed(store: &dyn NormalizedStore, operation: &Operation, data: Value) {
    store
        .write_operation(
            operation,
            &data,
            &ScalarAdapters::new(),
            &CacheHeaders::new(),
            false,
        )
        .await
        .unwrap();
}

/// Let spawned tasks (background writes, rollbacks) run
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}
