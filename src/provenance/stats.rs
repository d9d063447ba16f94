//! Stat cache invalidation against an action log.
//!
//! A column is stale for a set of stats if some entry touching it has not
//! marked all of them fresh. Entries that touch no columns never make
//! anything stale. Queries never fail: an empty log has nothing stale.

use super::actionlog::ActionLog;
use super::meta::DataFrameMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Stat names used by the data quality computation.
pub const QUALITY_STATS: [&str; 3] = ["match", "missing", "mismatch"];

/// Columns touched by an entry that has not marked every stat in
/// `stat_names` fresh. An empty `stat_names` is satisfied by every entry.
pub fn stale_columns<S: AsRef<str>>(log: &ActionLog, stat_names: &[S]) -> BTreeSet<String> {
    log.iter()
        .filter(|entry| !entry.is_fresh_for(stat_names))
        .flat_map(|entry| entry.columns().iter().cloned())
        .collect()
}

/// Every column touched by any entry, regardless of freshness.
pub fn transformed_columns(log: &ActionLog) -> BTreeSet<String> {
    log.iter()
        .flat_map(|entry| entry.columns().iter().cloned())
        .collect()
}

/// Mark `stat_names` fresh on every entry whose columns all lie within
/// `columns`. Returns a new log; `log` is unchanged.
pub fn mark_fresh<C, S>(log: &ActionLog, columns: &[C], stat_names: &[S]) -> ActionLog
where
    C: AsRef<str>,
    S: AsRef<str>,
{
    let within: BTreeSet<&str> = columns.iter().map(|c| c.as_ref()).collect();
    let mut marked = 0usize;
    let next = log.rewrite(|entry| {
        let covered = !entry.columns().is_empty()
            && entry.columns().iter().all(|c| within.contains(c.as_str()));
        if covered && !entry.is_fresh_for(stat_names) {
            marked += 1;
            Some(entry.marked(stat_names))
        } else {
            None
        }
    });
    debug!(entries = marked, columns = within.len(), "stats marked fresh");
    next
}

// ============================================================================
// Stat cache
// ============================================================================

/// Last computed value per column per stat name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatCache {
    columns: BTreeMap<String, BTreeMap<String, Value>>,
}

impl StatCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str, stat: &str) -> Option<&Value> {
        self.columns.get(column)?.get(stat)
    }

    /// All cached stats for `column`.
    pub fn column(&self, column: &str) -> Option<&BTreeMap<String, Value>> {
        self.columns.get(column)
    }

    /// True if `column` has a cached value for every stat in `stat_names`.
    pub fn holds<S: AsRef<str>>(&self, column: &str, stat_names: &[S]) -> bool {
        self.columns
            .get(column)
            .is_some_and(|stats| stat_names.iter().all(|s| stats.contains_key(s.as_ref())))
    }

    /// This cache with `stats` merged into `column`'s entry.
    pub fn with(&self, column: &str, stats: BTreeMap<String, Value>) -> Self {
        let mut next = self.clone();
        next.columns
            .entry(column.to_string())
            .or_default()
            .extend(stats);
        next
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ============================================================================
// Consumer protocol
// ============================================================================

/// Per-column stat values returned by `refresh_stats`.
pub type ColumnStats = BTreeMap<String, BTreeMap<String, Value>>;

/// Fetch `stat_names` for `columns`, reusing cached values where the log
/// says they are still fresh.
///
/// A column is recomputed via `compute` when `flush` is set, when it is
/// stale, or when the cache lacks one of the stats. Results are written to
/// the stat cache and every requested column is marked fresh.
pub fn refresh_stats<C, S, F, E>(
    meta: &DataFrameMeta,
    columns: &[C],
    stat_names: &[S],
    flush: bool,
    mut compute: F,
) -> Result<(DataFrameMeta, ColumnStats), E>
where
    C: AsRef<str>,
    S: AsRef<str>,
    F: FnMut(&str) -> Result<BTreeMap<String, Value>, E>,
{
    let stale = stale_columns(meta.log(), stat_names);
    let mut results = ColumnStats::new();
    let mut cache = meta.stats().clone();

    for c in columns {
        let column: &str = c.as_ref();
        if !flush && !stale.contains(column) && cache.holds(column, stat_names) {
            if let Some(stats) = cache.column(column) {
                let wanted = stat_names
                    .iter()
                    .filter_map(|s| stats.get_key_value(s.as_ref()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                debug!(column, "reusing cached stats");
                results.insert(column.to_string(), wanted);
                continue;
            }
        }
        debug!(column, flush, stale = stale.contains(column), "computing stats");
        let stats = compute(column)?;
        cache = cache.with(column, stats.clone());
        results.insert(column.to_string(), stats);
    }

    let log = mark_fresh(meta.log(), columns, stat_names);
    Ok((meta.with_parts(log, cache), results))
}

/// Counts of values that match, are missing from, or mismatch a column's
/// inferred type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quality {
    #[serde(rename = "match")]
    pub matched: u64,
    pub missing: u64,
    pub mismatch: u64,
}

impl Quality {
    fn to_stats(self) -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("match".to_string(), Value::from(self.matched)),
            ("missing".to_string(), Value::from(self.missing)),
            ("mismatch".to_string(), Value::from(self.mismatch)),
        ])
    }

    fn from_stats(stats: &BTreeMap<String, Value>) -> Option<Self> {
        let get = |name: &str| stats.get(name).and_then(Value::as_u64);
        Some(Self {
            matched: get("match")?,
            missing: get("missing")?,
            mismatch: get("mismatch")?,
        })
    }
}

/// Data quality per column, through the stat cache.
///
/// A cached entry that does not decode as counts is recomputed.
pub fn quality<C, F, E>(
    meta: &DataFrameMeta,
    columns: &[C],
    flush: bool,
    mut compute: F,
) -> Result<(DataFrameMeta, BTreeMap<String, Quality>), E>
where
    C: AsRef<str>,
    F: FnMut(&str) -> Result<Quality, E>,
{
    let (mut meta, stats) = refresh_stats(meta, columns, &QUALITY_STATS, flush, |column| {
        compute(column).map(Quality::to_stats)
    })?;

    let mut out = BTreeMap::new();
    for (column, values) in stats {
        let q = match Quality::from_stats(&values) {
            Some(q) => q,
            None => {
                let q = compute(&column)?;
                meta = meta.set_stats(&column, q.to_stats());
                q
            }
        };
        out.insert(column, q);
    }
    Ok((meta, out))
}
