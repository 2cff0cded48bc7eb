//! Merge policy for layered configuration

pub mod merge_policy;
