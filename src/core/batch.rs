//! Batch driver: compile an ordered list of records into one code string.
//!
//! Each record is aliased, resolved, placed and emitted in turn. The
//! namespace grows with every target so later records see earlier names.
//! The first failing record aborts the whole batch.

use super::alias::use_alias;
use super::catalog::Catalog;
use super::classify::place;
use super::emit::emit;
use super::error::CodegenError;
use super::naming::Namespace;
use super::types::{GeneratedCode, OperationRecord};
use tracing::{debug, info_span};

/// Compile `records` against `catalog`, avoiding names in `live`.
pub fn generate(
    records: &[OperationRecord],
    catalog: &Catalog,
    live: &Namespace,
) -> Result<GeneratedCode, CodegenError> {
    let _span = info_span!("generate", records = records.len()).entered();
    let mut namespace = live.clone();
    let mut statements = Vec::with_capacity(records.len());
    let mut targets = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let record = use_alias(record.clone(), catalog);
        let descriptor = catalog
            .resolve(&record.operation)
            .map_err(|source| CodegenError::Resolution { index, source })?;
        let placement = place(index, &record, &descriptor, &namespace)?;
        let statement = emit(index, &record, &descriptor, &placement)?;

        debug!(
            index,
            operation = %descriptor.path,
            strategy = %placement.strategy,
            target = %placement.target,
            "emitted statement"
        );
        namespace = namespace.with(placement.target.clone());
        statements.push(statement);
        targets.push(placement.target);
    }

    Ok(GeneratedCode {
        code: statements.join("\n"),
        targets,
    })
}
