//! Alias resolution, applied to every record before catalog lookup.
//!
//! Two rewrites:
//! - legacy or short operation spellings map to canonical paths
//! - `Optimus.<engine>` becomes `Optimus` with `engine='<engine>'` as the
//!   first argument, unless the record already names an engine

use super::catalog::Catalog;
use super::types::OperationRecord;
use indexmap::IndexMap;
use serde_yaml_ng::Value;
use tracing::warn;

const ALIASES: [(&str, &str); 12] = [
    ("cols.uppercase", "cols.upper"),
    ("cols.lowercase", "cols.lower"),
    ("cols.capitalize", "cols.proper"),
    ("cols.strip", "cols.trim"),
    ("cols.fillna", "cols.fill_na"),
    ("cols.astype", "cols.cast"),
    ("cols.length", "cols.len"),
    ("rows.filter", "rows.select"),
    ("rows.head", "rows.limit"),
    ("load.file", "load.csv"),
    ("create.df", "create.dataframe"),
    ("connect.postgresql", "connect.postgres"),
];

/// Canonical spelling of `operation`, or `operation` itself.
pub fn canonical(operation: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == operation)
        .map(|(_, path)| *path)
        .unwrap_or(operation)
}

/// Rewrite a record's operation into its canonical form.
pub fn use_alias(mut record: OperationRecord, catalog: &Catalog) -> OperationRecord {
    let path = canonical(&record.operation);
    if path != record.operation {
        record.operation = path.to_string();
    }

    let Some((family, engine)) = record.operation.split_once('.') else {
        return record;
    };
    if !catalog.is_constructor(family) {
        return record;
    }
    let (family, engine) = (family.to_string(), engine.to_string());

    if !catalog.engines(&family).iter().any(|e| *e == engine) {
        warn!(family = %family, engine = %engine, "unknown engine for root constructor");
    }
    if !record.arguments.contains_key("engine") {
        let mut arguments = IndexMap::with_capacity(record.arguments.len() + 1);
        arguments.insert("engine".to_string(), Value::String(engine));
        arguments.extend(record.arguments);
        record.arguments = arguments;
    }
    record.operation = family;
    record
}
