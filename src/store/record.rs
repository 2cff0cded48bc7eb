//! Normalized records

use crate::types::{CacheKey, CacheKeySet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Value of a record field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RecordValue {
    Scalar(Value),
    Reference(CacheKey),
    List(Vec<RecordValue>),
}

/// A flat, keyed record produced by normalization
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    pub key: CacheKey,
    pub fields: BTreeMap<String, RecordValue>,
}

impl Record {
    pub fn new(key: impl Into<CacheKey>) -> Self {
        Record {
            key: key.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: RecordValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Merge `other`'s fields over this record. Returns true if anything changed.
    pub fn merge(&mut self, other: &Record) -> bool {
        let mut changed = false;
        for (name, value) in &other.fields {
            if self.fields.get(name) != Some(value) {
                self.fields.insert(name.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }
}

/// Records keyed by cache key, ordered for deterministic iteration
pub type RecordMap = BTreeMap<CacheKey, Record>;

/// Keys a result depends on: every record it was normalized into.
pub fn dependent_keys<'a>(records: impl IntoIterator<Item = &'a Record>) -> CacheKeySet {
    records.into_iter().map(|record| record.key.clone()).collect()
}
