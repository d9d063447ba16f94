//! Persistent, append-only action log.
//!
//! A log is a shared singly linked list of entries, newest first. Appending
//! allocates one node and shares the whole predecessor, so two values
//! derived from a common ancestor share its prefix and own their tails.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One recorded transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredEntry")]
pub struct ActionLogEntry {
    kind: String,
    columns: BTreeSet<String>,
    stats_marked_fresh: BTreeSet<String>,
}

/// Stored form of an entry: `kind` may be absent and `columns` may be any
/// [`ColumnSelection`] form or null.
#[derive(Deserialize)]
struct StoredEntry {
    #[serde(default)]
    kind: String,

    #[serde(default)]
    columns: Option<ColumnSelection>,

    #[serde(default)]
    stats_marked_fresh: BTreeSet<String>,
}

impl From<StoredEntry> for ActionLogEntry {
    fn from(stored: StoredEntry) -> Self {
        Self {
            kind: stored.kind,
            columns: stored.columns.map(ColumnSelection::into_set).unwrap_or_default(),
            stats_marked_fresh: stored.stats_marked_fresh,
        }
    }
}

impl ActionLogEntry {
    pub fn new(kind: impl Into<String>, columns: impl Into<ColumnSelection>) -> Self {
        Self {
            kind: kind.into(),
            columns: columns.into().into_set(),
            stats_marked_fresh: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn columns(&self) -> &BTreeSet<String> {
        &self.columns
    }

    pub fn stats_marked_fresh(&self) -> &BTreeSet<String> {
        &self.stats_marked_fresh
    }

    pub fn touches(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    /// True if every name in `stat_names` is marked fresh on this entry.
    pub fn is_fresh_for<S: AsRef<str>>(&self, stat_names: &[S]) -> bool {
        stat_names
            .iter()
            .all(|s| self.stats_marked_fresh.contains(s.as_ref()))
    }

    /// This entry with `stat_names` added to its freshness marks.
    pub(crate) fn marked<S: AsRef<str>>(&self, stat_names: &[S]) -> Self {
        let mut entry = self.clone();
        entry
            .stats_marked_fresh
            .extend(stat_names.iter().map(|s| s.as_ref().to_string()));
        entry
    }
}

/// Columns an action applies to. Stored as a name, a list of names, or an
/// `{old, new}` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColumnSelection {
    One(String),
    Many(Vec<String>),
    /// An `(old, new)` pair from a copy or rename. Only `new` is touched:
    /// the old name carries no stats on the resulting value.
    Pair { old: String, new: String },
}

impl ColumnSelection {
    pub fn into_set(self) -> BTreeSet<String> {
        match self {
            Self::One(c) => BTreeSet::from([c]),
            Self::Many(cs) => cs.into_iter().collect(),
            Self::Pair { new, .. } => BTreeSet::from([new]),
        }
    }
}

impl From<&str> for ColumnSelection {
    fn from(c: &str) -> Self {
        Self::One(c.to_string())
    }
}

impl From<String> for ColumnSelection {
    fn from(c: String) -> Self {
        Self::One(c)
    }
}

impl From<Vec<String>> for ColumnSelection {
    fn from(cs: Vec<String>) -> Self {
        Self::Many(cs)
    }
}

impl From<&[&str]> for ColumnSelection {
    fn from(cs: &[&str]) -> Self {
        Self::Many(cs.iter().map(|c| c.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ColumnSelection {
    fn from(cs: [&str; N]) -> Self {
        Self::Many(cs.iter().map(|c| c.to_string()).collect())
    }
}

impl From<(&str, &str)> for ColumnSelection {
    fn from((old, new): (&str, &str)) -> Self {
        Self::Pair {
            old: old.to_string(),
            new: new.to_string(),
        }
    }
}

// ============================================================================
// Log
// ============================================================================

#[derive(Debug)]
struct Node {
    entry: ActionLogEntry,
    prev: Option<Arc<Node>>,
}

/// Ordered history of transformations owned by one dataframe value.
#[derive(Clone, Default)]
pub struct ActionLog {
    head: Option<Arc<Node>>,
    len: usize,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// This log plus one entry with no freshness marks. `self` is unchanged.
    pub fn append(&self, kind: &str, columns: impl Into<ColumnSelection>) -> Self {
        let entry = ActionLogEntry::new(kind, columns);
        debug!(kind, columns = ?entry.columns, len = self.len + 1, "action appended");
        self.push(entry)
    }

    fn push(&self, entry: ActionLogEntry) -> Self {
        Self {
            head: Some(Arc::new(Node {
                entry,
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ActionLogEntry> + '_ {
        self.nodes().into_iter().map(|n| &n.entry)
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<&ActionLogEntry> {
        self.head.as_deref().map(|n| &n.entry)
    }

    fn nodes(&self) -> Vec<&Node> {
        let mut nodes = Vec::with_capacity(self.len);
        let mut cur = self.head.as_deref();
        while let Some(node) = cur {
            nodes.push(node);
            cur = node.prev.as_deref();
        }
        nodes.reverse();
        nodes
    }

    /// Rebuild the log with some entries replaced. `rewrite` returns `None`
    /// to keep an entry. The prefix before the first rewritten entry is
    /// shared with `self`, not copied.
    pub(crate) fn rewrite<F>(&self, mut rewrite: F) -> Self
    where
        F: FnMut(&ActionLogEntry) -> Option<ActionLogEntry>,
    {
        let nodes = self.nodes();
        let replaced: Vec<Option<ActionLogEntry>> = nodes.iter().map(|n| rewrite(&n.entry)).collect();
        let Some(first) = replaced.iter().position(Option::is_some) else {
            return self.clone();
        };

        let mut log = self.prefix(first);
        for (node, new) in nodes[first..].iter().zip(replaced.into_iter().skip(first)) {
            log = log.push(new.unwrap_or_else(|| node.entry.clone()));
        }
        log
    }

    /// The first `n` entries, sharing storage with `self`.
    fn prefix(&self, n: usize) -> Self {
        Self {
            head: self.prefix_head(n),
            len: n,
        }
    }

    fn prefix_head(&self, n: usize) -> Option<Arc<Node>> {
        let mut cur = self.head.clone();
        for _ in n..self.len {
            cur = cur.and_then(|node| node.prev.clone());
        }
        cur
    }

    /// True if both logs hold the same node for their first `n` entries.
    pub fn shares_prefix(&self, other: &ActionLog, n: usize) -> bool {
        if n > self.len || n > other.len {
            return false;
        }
        match (self.prefix_head(n), other.prefix_head(n)) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a, &b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Drop for ActionLog {
    fn drop(&mut self) {
        // Unlink iteratively so long uniquely owned chains do not recurse.
        let mut cur = self.head.take();
        while let Some(node) = cur {
            match Arc::try_unwrap(node) {
                Ok(mut node) => cur = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

impl PartialEq for ActionLog {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for ActionLog {}

impl fmt::Debug for ActionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl FromIterator<ActionLogEntry> for ActionLog {
    fn from_iter<I: IntoIterator<Item = ActionLogEntry>>(iter: I) -> Self {
        iter.into_iter().fold(ActionLog::new(), |log, entry| log.push(entry))
    }
}

impl Serialize for ActionLog {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for ActionLog {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Option::<Vec<ActionLogEntry>>::deserialize(deserializer)?;
        Ok(entries.into_iter().flatten().collect())
    }
}
