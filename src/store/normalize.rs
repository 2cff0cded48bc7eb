//! Selection-driven normalization and reads
//!
//! Normalization walks response data along the operation's selection tree and
//! flattens every object into a keyed record. Objects exposing `__typename` and `id`
//! get a global key (`Hero:1`); anything else is keyed by its path from the parent
//! record (`QUERY_ROOT.hero`). Reading walks the same selection tree over records.

use crate::error::{CacheMissError, StoreError};
use crate::operation::{Field, Operation};
use crate::request::ScalarAdapters;
use crate::store::record::{Record, RecordMap, RecordValue};
use crate::types::{CacheKey, CacheKeySet};
use serde_json::{Map, Value};

/// Derive the global key of an object, if it has one
pub fn object_key(object: &Map<String, Value>) -> Option<CacheKey> {
    let typename = object.get("__typename")?.as_str()?;
    let id = match object.get("id")? {
        Value::String(id) => id.clone(),
        Value::Number(id) => id.to_string(),
        _ => return None,
    };
    Some(format!("{}:{}", typename, id))
}

/// Normalize `data` for `operation` into records
pub fn normalize(
    operation: &Operation,
    data: &Value,
    adapters: &ScalarAdapters,
) -> Result<RecordMap, StoreError> {
    let root = data.as_object().ok_or_else(|| StoreError::ShapeMismatch {
        path: operation.root_key().to_string(),
        reason: "operation data must be an object".to_string(),
    })?;
    let mut normalizer = Normalizer {
        adapters,
        records: RecordMap::new(),
    };
    normalizer.object(operation.root_key().to_string(), &operation.selections, root)?;
    Ok(normalizer.records)
}

struct Normalizer<'a> {
    adapters: &'a ScalarAdapters,
    records: RecordMap,
}

impl Normalizer<'_> {
    fn object(
        &mut self,
        key: CacheKey,
        selections: &[Field],
        object: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut record = Record::new(key.clone());
        for field in selections {
            // Absent fields (e.g. partial responses) are simply not written.
            let Some(value) = object.get(field.response_name()) else {
                continue;
            };
            let field_path = format!("{}.{}", key, field.cache_key());
            let stored = self.value(field, value, &field_path)?;
            record.fields.insert(field.cache_key(), stored);
        }
        match self.records.get_mut(&key) {
            Some(existing) => {
                existing.merge(&record);
            }
            None => {
                self.records.insert(key, record);
            }
        }
        Ok(())
    }

    fn value(&mut self, field: &Field, value: &Value, path: &str) -> Result<RecordValue, StoreError> {
        match value {
            Value::Null => Ok(RecordValue::Scalar(Value::Null)),
            Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    list.push(self.value(field, item, &format!("{}.{}", path, index))?);
                }
                Ok(RecordValue::List(list))
            }
            Value::Object(object) if !field.is_leaf() => {
                let key = object_key(object).unwrap_or_else(|| path.to_string());
                self.object(key.clone(), &field.selections, object)?;
                Ok(RecordValue::Reference(key))
            }
            other if field.is_leaf() => Ok(RecordValue::Scalar(self.encode(field, other, path)?)),
            _ => Err(StoreError::ShapeMismatch {
                path: path.to_string(),
                reason: "expected an object for a field with sub-selections".to_string(),
            }),
        }
    }

    fn encode(&self, field: &Field, value: &Value, path: &str) -> Result<Value, StoreError> {
        let Some(adapter) = field.scalar.as_deref().and_then(|s| self.adapters.get(s)) else {
            return Ok(value.clone());
        };
        adapter.encode(value).map_err(|reason| StoreError::ShapeMismatch {
            path: path.to_string(),
            reason,
        })
    }
}

/// Read `operation` back out of records.
///
/// `lookup` resolves a key to its current record. Returns the data and the keys of
/// every record visited.
pub fn read<F>(
    operation: &Operation,
    adapters: &ScalarAdapters,
    lookup: F,
) -> Result<(Value, CacheKeySet), CacheMissError>
where
    F: Fn(&str) -> Option<Record>,
{
    let mut reader = Reader {
        adapters,
        lookup,
        visited: CacheKeySet::new(),
    };
    let data = reader.object(operation.root_key(), &operation.selections)?;
    Ok((data, reader.visited))
}

struct Reader<'a, F> {
    adapters: &'a ScalarAdapters,
    lookup: F,
    visited: CacheKeySet,
}

impl<F> Reader<'_, F>
where
    F: Fn(&str) -> Option<Record>,
{
    fn object(&mut self, key: &str, selections: &[Field]) -> Result<Value, CacheMissError> {
        let record =
            (self.lookup)(key).ok_or_else(|| CacheMissError::RecordNotFound(key.to_string()))?;
        self.visited.insert(record.key.clone());

        let mut object = Map::new();
        for field in selections {
            let stored = record.fields.get(&field.cache_key()).ok_or_else(|| {
                CacheMissError::FieldNotFound {
                    key: key.to_string(),
                    field: field.cache_key(),
                }
            })?;
            let value = self.value(key, field, stored)?;
            object.insert(field.response_name().to_string(), value);
        }
        Ok(Value::Object(object))
    }

    fn value(&mut self, key: &str, field: &Field, stored: &RecordValue) -> Result<Value, CacheMissError> {
        match stored {
            RecordValue::Scalar(Value::Null) => Ok(Value::Null),
            RecordValue::Scalar(value) if field.is_leaf() => self.decode(key, field, value),
            RecordValue::Reference(reference) if !field.is_leaf() => {
                self.object(reference, &field.selections)
            }
            RecordValue::List(items) => items
                .iter()
                .map(|item| self.value(key, field, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            RecordValue::Scalar(_) => Err(CacheMissError::Incomplete {
                key: key.to_string(),
                field: field.cache_key(),
                reason: "scalar stored where an object was selected".to_string(),
            }),
            RecordValue::Reference(_) => Err(CacheMissError::Incomplete {
                key: key.to_string(),
                field: field.cache_key(),
                reason: "reference stored where a scalar was selected".to_string(),
            }),
        }
    }

    fn decode(&self, key: &str, field: &Field, value: &Value) -> Result<Value, CacheMissError> {
        let Some(adapter) = field.scalar.as_deref().and_then(|s| self.adapters.get(s)) else {
            return Ok(value.clone());
        };
        adapter.decode(value).map_err(|reason| CacheMissError::Incomplete {
            key: key.to_string(),
            field: field.cache_key(),
            reason,
        })
    }
}
