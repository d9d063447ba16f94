//! Per-dataframe metadata: action log, stat cache, and cached column names.
//!
//! Every operation returns a new value. Transformations never edit the
//! metadata of the value they were applied to.

use super::actionlog::{ActionLog, ColumnSelection};
use super::stats::StatCache;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Well-known action kinds.
pub mod actions {
    pub const COPY: &str = "copy";
    pub const RENAME: &str = "rename";
    pub const DROP: &str = "drop";
    pub const KEEP: &str = "keep";
    pub const SET: &str = "set";
    pub const APPLY_COLS: &str = "apply_cols";
    pub const UPPER: &str = "upper";
    pub const LOWER: &str = "lower";
    pub const PROPER: &str = "proper";
    pub const TRIM: &str = "trim";
    pub const FILL_NA: &str = "fill_na";
    pub const CAST: &str = "cast";
    pub const NEST: &str = "nest";
    pub const UNNEST: &str = "unnest";
    pub const SORT_ROW: &str = "sort_row";
    pub const DROP_ROW: &str = "drop_row";
    pub const SELECT_ROW: &str = "select_row";
}

/// Metadata attached to one dataframe value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrameMeta {
    #[serde(default)]
    log: ActionLog,

    #[serde(default)]
    stats: StatCache,

    #[serde(default)]
    columns: IndexSet<String>,
}

impl DataFrameMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    pub fn stats(&self) -> &StatCache {
        &self.stats
    }

    /// Cached column names, in the order first recorded.
    pub fn cached_columns(&self) -> &IndexSet<String> {
        &self.columns
    }

    /// Same metadata with an empty action log.
    pub fn reset(&self) -> Self {
        Self {
            log: ActionLog::new(),
            ..self.clone()
        }
    }

    /// Record a transformation of `columns`.
    pub fn action(&self, kind: &str, columns: impl Into<ColumnSelection>) -> Self {
        Self {
            log: self.log.append(kind, columns),
            ..self.clone()
        }
    }

    /// Record copies, one entry per `(old, new)` pair.
    pub fn copy(&self, pairs: &[(&str, &str)]) -> Self {
        self.pairs(actions::COPY, pairs)
    }

    /// Record renames, one entry per `(old, new)` pair.
    pub fn rename(&self, pairs: &[(&str, &str)]) -> Self {
        self.pairs(actions::RENAME, pairs)
    }

    fn pairs(&self, kind: &str, pairs: &[(&str, &str)]) -> Self {
        let log = pairs
            .iter()
            .fold(self.log.clone(), |log, pair| log.append(kind, *pair));
        Self {
            log,
            ..self.clone()
        }
    }

    /// Add `names` to the cached column list.
    pub fn columns<I, S>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        next.columns.extend(names.into_iter().map(Into::into));
        next
    }

    /// Carry `older`'s metadata onto this value across a destructive
    /// transformation. With `action`, one entry is appended afterwards.
    ///
    /// The log and the stat cache are taken from `older` part by part, and
    /// only when `older` holds a non-empty one. An empty log on `older` does
    /// not erase this value's log, because an empty log is the same value as
    /// no log. Cached column names are merged rather than replaced.
    pub fn preserve(&self, older: &DataFrameMeta, action: Option<(&str, ColumnSelection)>) -> Self {
        let mut columns = self.columns.clone();
        columns.extend(older.columns.iter().cloned());
        let log = if older.log.is_empty() {
            self.log.clone()
        } else {
            older.log.clone()
        };
        let stats = if older.stats.is_empty() {
            self.stats.clone()
        } else {
            older.stats.clone()
        };
        let merged = Self { log, stats, columns };
        match action {
            Some((kind, cols)) => merged.action(kind, cols),
            None => merged,
        }
    }

    /// Store computed stats for `column`.
    pub fn set_stats(&self, column: &str, stats: BTreeMap<String, Value>) -> Self {
        Self {
            stats: self.stats.with(column, stats),
            ..self.clone()
        }
    }

    /// Replace the log and stat cache, keeping cached columns.
    pub(crate) fn with_parts(&self, log: ActionLog, stats: StatCache) -> Self {
        Self {
            log,
            stats,
            columns: self.columns.clone(),
        }
    }
}
