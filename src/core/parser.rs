//! Batch loading and validation.
//!
//! A batch document is a single record or a sequence of records, in YAML or
//! JSON. Validation reports every problem it finds instead of stopping at
//! the first one; `generate` is still the authority on what compiles.

use super::alias::use_alias;
use super::catalog::Catalog;
use super::classify::place;
use super::error::ParseError;
use super::naming::Namespace;
use super::repr;
use super::types::{OperationRecord, RootNamespace};
use serde::Deserialize;
use std::path::Path;

/// A problem found in one record of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub index: usize,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "record {}: {}", self.index, self.message)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchDocument {
    Many(Vec<OperationRecord>),
    One(Box<OperationRecord>),
}

/// Read a batch file from disk.
pub fn parse_batch_file(path: &Path) -> Result<Vec<OperationRecord>, ParseError> {
    let content = read(path)?;
    parse_batch(&content)
}

/// Parse a batch from YAML or JSON text.
pub fn parse_batch(text: &str) -> Result<Vec<OperationRecord>, ParseError> {
    Ok(match serde_yaml_ng::from_str(text)? {
        BatchDocument::Many(records) => records,
        BatchDocument::One(record) => vec![*record],
    })
}

/// Parse live names: one or more per line, separated by commas or
/// whitespace. Lines starting with `#` are comments.
pub fn parse_live(text: &str) -> Namespace {
    Namespace::from_live(
        text.lines()
            .map(str::trim)
            .filter(|line| !line.starts_with('#'))
            .flat_map(|line| line.split(|c: char| c == ',' || c.is_whitespace()))
            .filter(|name| !name.is_empty()),
    )
}

/// Read a live-names file from disk.
pub fn parse_live_file(path: &Path) -> Result<Namespace, ParseError> {
    Ok(parse_live(&read(path)?))
}

fn read(path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Validate a batch against the catalog. Returns every error found (empty = valid).
///
/// Beyond resolution, this checks things `generate` tolerates but that
/// produce code unlikely to run: unknown or missing arguments, receivers
/// that name nothing produced so far, and invalid identifiers.
pub fn validate_batch(
    records: &[OperationRecord],
    catalog: &Catalog,
    live: &Namespace,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut known = live.clone();
    let mut push = |index: usize, message: String| errors.push(ValidationError { index, message });

    for (index, record) in records.iter().enumerate() {
        let record = use_alias(record.clone(), catalog);

        if let Some(target) = &record.target {
            if !repr::is_identifier(target) {
                push(index, format!("target '{}' is not a valid identifier", target));
            }
        }

        let descriptor = match catalog.resolve(&record.operation) {
            Ok(d) => d,
            Err(e) => {
                push(index, e.to_string());
                if let Some(target) = &record.target {
                    known = known.with(target.clone());
                }
                continue;
            }
        };

        match (&record.source, descriptor.root_namespace) {
            (Some(source), RootNamespace::RootConstructor) => push(
                index,
                format!("root constructor '{}' ignores source '{}'", descriptor.name, source),
            ),
            (Some(source), _) if !known.contains(source) => push(
                index,
                format!("source '{}' is not a live name or an earlier target", source),
            ),
            (None, RootNamespace::DataFrameAccessor | RootNamespace::EngineAccessor) => {
                push(index, format!("'{}' needs a source", descriptor.path))
            }
            _ => {}
        }

        let fixed = !descriptor.accepts_overflow && !descriptor.parameters.is_empty();
        if fixed {
            for key in record.arguments.keys() {
                if !descriptor.declares(key) {
                    push(
                        index,
                        format!("'{}' has no parameter '{}'; it will be dropped", descriptor.path, key),
                    );
                }
            }
        }
        for param in descriptor.parameters.iter().filter(|p| !p.has_default) {
            if !record.arguments.contains_key(&param.name) {
                push(
                    index,
                    format!("'{}' is missing required argument '{}'", descriptor.path, param.name),
                );
            }
        }
        for (key, value) in &record.arguments {
            if let Err(e) = repr::render(value) {
                push(index, format!("argument '{}': {}", key, e));
            }
        }

        if let Ok(placement) = place(index, &record, &descriptor, &known) {
            known = known.with(placement.target);
        }
    }

    errors
}
