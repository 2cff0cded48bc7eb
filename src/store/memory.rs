//! In-memory normalized store
//!
//! Base records live in a single map. Each staged optimistic update is a separate
//! layer applied over the base, in staging order, on every read. Watchers each own an
//! unbounded channel, so notifications are never dropped or reordered.

use crate::error::{CacheMissError, StoreError};
use crate::operation::Operation;
use crate::policy::CacheHeaders;
use crate::request::ScalarAdapters;
use crate::store::normalize;
use crate::store::record::{Record, RecordMap};
use crate::store::{ChangedKeysStream, NormalizedStore, EVICT_AFTER_READ};
use crate::types::{CacheKey, CacheKeySet, RequestId};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

struct OptimisticLayer {
    mutation_id: RequestId,
    records: RecordMap,
}

/// Reference [`NormalizedStore`] keeping everything in process memory
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<CacheKey, Record>>,
    optimistic: RwLock<Vec<OptimisticLayer>>,
    watchers: Mutex<Vec<mpsc::UnboundedSender<CacheKeySet>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current view of a record, optimistic layers applied
    pub fn record(&self, key: &str) -> Option<Record> {
        let mut record = self.records.read().get(key).cloned();
        for layer in self.optimistic.read().iter() {
            if let Some(staged) = layer.records.get(key) {
                match record.as_mut() {
                    Some(existing) => {
                        existing.merge(staged);
                    }
                    None => record = Some(staged.clone()),
                }
            }
        }
        record
    }

    /// Number of records in the base layer
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Ids with a staged optimistic layer, in staging order
    pub fn optimistic_mutations(&self) -> Vec<RequestId> {
        self.optimistic
            .read()
            .iter()
            .map(|layer| layer.mutation_id)
            .collect()
    }

    /// Number of live change subscriptions
    pub fn watcher_count(&self) -> usize {
        let mut watchers = self.watchers.lock();
        watchers.retain(|tx| !tx.is_closed());
        watchers.len()
    }

    /// Drop every base record and optimistic layer. Does not publish.
    pub fn clear(&self) {
        self.records.write().clear();
        self.optimistic.write().clear();
    }

    fn merge_into_base(&self, records: &RecordMap) -> CacheKeySet {
        let mut base = self.records.write();
        let mut changed = CacheKeySet::new();
        for (key, record) in records {
            match base.get_mut(key) {
                Some(existing) => {
                    if existing.merge(record) {
                        changed.insert(key.clone());
                    }
                }
                None => {
                    base.insert(key.clone(), record.clone());
                    changed.insert(key.clone());
                }
            }
        }
        changed
    }

    fn notify(&self, keys: CacheKeySet) {
        if keys.is_empty() {
            return;
        }
        let mut watchers = self.watchers.lock();
        watchers.retain(|tx| tx.send(keys.clone()).is_ok());
        debug!(keys = keys.len(), watchers = watchers.len(), "Published changed keys");
    }
}

#[async_trait]
impl NormalizedStore for MemoryStore {
    async fn read_operation(
        &self,
        operation: &Operation,
        adapters: &ScalarAdapters,
        headers: &CacheHeaders,
    ) -> Result<Value, CacheMissError> {
        let (data, visited) = normalize::read(operation, adapters, |key| self.record(key))?;
        if headers.contains_key(EVICT_AFTER_READ) {
            let mut base = self.records.write();
            for key in &visited {
                base.remove(key);
            }
            debug!(evicted = visited.len(), operation = %operation.name, "Evicted records after read");
        }
        Ok(data)
    }

    async fn write_operation(
        &self,
        operation: &Operation,
        data: &Value,
        adapters: &ScalarAdapters,
        _headers: &CacheHeaders,
        publish: bool,
    ) -> Result<CacheKeySet, StoreError> {
        let records = normalize::normalize(operation, data, adapters)?;
        let changed = self.merge_into_base(&records);
        debug!(
            operation = %operation.name,
            records = records.len(),
            changed = changed.len(),
            "Wrote operation"
        );
        if publish {
            self.notify(changed.clone());
        }
        Ok(changed)
    }

    fn normalize(
        &self,
        operation: &Operation,
        data: &Value,
        adapters: &ScalarAdapters,
    ) -> Result<RecordMap, StoreError> {
        normalize::normalize(operation, data, adapters)
    }

    async fn write_optimistic_updates(
        &self,
        operation: &Operation,
        data: &Value,
        mutation_id: RequestId,
        adapters: &ScalarAdapters,
        publish: bool,
    ) -> Result<CacheKeySet, StoreError> {
        let records = normalize::normalize(operation, data, adapters)?;
        let keys: CacheKeySet = records.keys().cloned().collect();
        {
            let mut layers = self.optimistic.write();
            if layers.iter().any(|layer| layer.mutation_id == mutation_id) {
                return Err(StoreError::OptimisticLayerExists(mutation_id));
            }
            layers.push(OptimisticLayer {
                mutation_id,
                records,
            });
        }
        debug!(%mutation_id, keys = keys.len(), "Staged optimistic layer");
        if publish {
            self.notify(keys.clone());
        }
        Ok(keys)
    }

    async fn rollback_optimistic_updates(
        &self,
        mutation_id: RequestId,
        publish: bool,
    ) -> CacheKeySet {
        let removed = {
            let mut layers = self.optimistic.write();
            layers
                .iter()
                .position(|layer| layer.mutation_id == mutation_id)
                .map(|index| layers.remove(index))
        };
        let keys: CacheKeySet = removed
            .map(|layer| layer.records.into_keys().collect())
            .unwrap_or_default();
        debug!(%mutation_id, keys = keys.len(), "Rolled back optimistic layer");
        if publish {
            self.notify(keys.clone());
        }
        keys
    }

    async fn publish(&self, keys: CacheKeySet) {
        self.notify(keys);
    }

    fn changed_keys(&self) -> ChangedKeysStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.watchers.lock().push(tx);
        Box::pin(UnboundedReceiverStream::new(rx))
    }
}
