//! Provenance: per-dataframe action logs, stat cache invalidation, hashing.

pub mod actionlog;
pub mod hasher;
pub mod meta;
pub mod stats;
