//! Fetch policies and per-request cache configuration

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

/// Order in which the cache and the network are consulted for one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPolicy {
    /// Cache first, network on miss
    #[default]
    CacheFirst,
    /// Network first, cache on failure
    NetworkFirst,
    CacheOnly,
    NetworkOnly,
}

impl fmt::Display for FetchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchPolicy::CacheFirst => "cache_first",
            FetchPolicy::NetworkFirst => "network_first",
            FetchPolicy::CacheOnly => "cache_only",
            FetchPolicy::NetworkOnly => "network_only",
        };
        f.write_str(name)
    }
}

impl FromStr for FetchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "cache_first" => Ok(FetchPolicy::CacheFirst),
            "network_first" => Ok(FetchPolicy::NetworkFirst),
            "cache_only" => Ok(FetchPolicy::CacheOnly),
            "network_only" => Ok(FetchPolicy::NetworkOnly),
            other => Err(format!(
                "Unknown fetch policy '{}' (expected cache_first, network_first, cache_only or network_only)",
                other
            )),
        }
    }
}

/// Store flags bitset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CacheFlags(u8);

impl CacheFlags {
    pub const NONE: CacheFlags = CacheFlags(0);
    /// Never write responses of this request to the store
    pub const DO_NOT_STORE: CacheFlags = CacheFlags(1);
    /// Write responses even when they carry GraphQL errors
    pub const STORE_PARTIAL_RESPONSE: CacheFlags = CacheFlags(1 << 1);

    pub fn contains(self, other: CacheFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn remove(&mut self, other: CacheFlags) {
        self.0 &= !other.0;
    }
}

impl BitOr for CacheFlags {
    type Output = CacheFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        CacheFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for CacheFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CacheFlags {
    type Output = CacheFlags;

    fn bitand(self, rhs: Self) -> Self::Output {
        CacheFlags(self.0 & rhs.0)
    }
}

/// Opaque key-value headers handed to the store on reads and writes
pub type CacheHeaders = BTreeMap<String, String>;

/// Per-request cache configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheContext {
    pub fetch_policy: FetchPolicy,
    /// Policy for change-triggered refetches; `None` disables watching
    pub refetch_policy: Option<FetchPolicy>,
    /// Data staged into the store before the real result arrives
    pub optimistic_data: Option<Value>,
    pub cache_headers: CacheHeaders,
    pub flags: CacheFlags,
}

impl CacheContext {
    pub fn new(fetch_policy: FetchPolicy) -> Self {
        CacheContext {
            fetch_policy,
            ..Default::default()
        }
    }

    pub fn do_not_store(&self) -> bool {
        self.flags.contains(CacheFlags::DO_NOT_STORE)
    }

    pub fn store_partial_responses(&self) -> bool {
        self.flags.contains(CacheFlags::STORE_PARTIAL_RESPONSE)
    }

    pub fn is_watching(&self) -> bool {
        self.refetch_policy.is_some()
    }
}
