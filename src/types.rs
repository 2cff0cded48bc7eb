//! Shared identifier types.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a normalized record (e.g. `Hero:1`, `QUERY_ROOT`).
pub type CacheKey = String;

/// Set of record keys, used both for change notifications and watch dependencies.
pub type CacheKeySet = HashSet<CacheKey>;

/// Unique identifier of a single request.
///
/// Also names the optimistic layer a mutation stages into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a fresh random request id
    pub fn new() -> Self {
        RequestId(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        RequestId(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Build a key set from anything string-like. Mostly a test and call-site convenience.
pub fn key_set<I, S>(keys: I) -> CacheKeySet
where
    I: IntoIterator<Item = S>,
    S: Into<CacheKey>,
{
    keys.into_iter().map(Into::into).collect()
}
