//! dfgen: operation-log code generation for multi-engine dataframes.
//!
//! Declarative operation records compile into deterministic assignment
//! statements for the target engine. Each dataframe value carries an
//! append-only action log that decides when cached statistics go stale.

pub mod cli;
pub mod core;
pub mod provenance;
