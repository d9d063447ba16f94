//! Variable allocation against a snapshot of names in use.
//!
//! A name collides only if the exact candidate is taken. Starting from `df`
//! with only `df9` in use yields `df`; nothing scans for the highest suffix.

use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// Names considered in use: a read-only snapshot of live identifiers plus
/// the names allocated so far in the current batch.
///
/// Extending a namespace returns a new value in O(1). The snapshot and the
/// earlier local names are shared, newest first, with every value derived
/// from the same ancestor.
#[derive(Clone, Default)]
pub struct Namespace {
    live: Arc<BTreeSet<String>>,
    local: Option<Arc<LocalName>>,
    local_len: usize,
}

#[derive(Debug)]
struct LocalName {
    name: String,
    prev: Option<Arc<LocalName>>,
}

impl Namespace {
    /// An empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// A namespace over a snapshot of live engine, dataframe, cluster and
    /// connection identifiers.
    pub fn from_live<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            live: Arc::new(names.into_iter().map(Into::into).collect()),
            local: None,
            local_len: 0,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.live.contains(name) || self.local_names().any(|n| n == name)
    }

    /// This namespace plus `name`.
    pub fn with(&self, name: impl Into<String>) -> Self {
        Self {
            live: Arc::clone(&self.live),
            local: Some(Arc::new(LocalName {
                name: name.into(),
                prev: self.local.clone(),
            })),
            local_len: self.local_len + 1,
        }
    }

    /// Local names, newest first.
    fn local_names(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::successors(self.local.as_deref(), |n| n.prev.as_deref()).map(|n| n.name.as_str())
    }

    /// Names added on top of the live snapshot, in insertion order.
    pub fn local(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.local_names().collect();
        names.reverse();
        names
    }

    /// The live snapshot this namespace was built over.
    pub fn live(&self) -> &BTreeSet<String> {
        &self.live
    }

    /// True if both namespaces hold the same node for their oldest `n`
    /// local names.
    pub fn shares_local_prefix(&self, other: &Namespace, n: usize) -> bool {
        if n > self.local_len || n > other.local_len {
            return false;
        }
        match (self.local_at(n), other.local_at(n)) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a, &b),
            (None, None) => true,
            _ => false,
        }
    }

    fn local_at(&self, n: usize) -> Option<Arc<LocalName>> {
        let mut cur = self.local.clone();
        for _ in n..self.local_len {
            cur = cur.and_then(|node| node.prev.clone());
        }
        cur
    }
}

impl Drop for Namespace {
    fn drop(&mut self) {
        let mut cur = self.local.take();
        while let Some(node) = cur {
            match Arc::try_unwrap(node) {
                Ok(mut node) => cur = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.local_len == other.local_len
            && self.live == other.live
            && self.local_names().eq(other.local_names())
    }
}

impl Eq for Namespace {}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("live", &self.live)
            .field("local", &self.local())
            .finish()
    }
}

fn trailing_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+$").expect("valid trailing digits regex"))
}

/// Return `base_name` if free, otherwise the first free increment of it.
pub fn allocate(base_name: &str, namespace: &Namespace) -> String {
    let mut candidate = base_name.to_string();
    while namespace.contains(&candidate) {
        trace!(candidate = %candidate, "name in use");
        candidate = increment_name(&candidate);
    }
    candidate
}

/// Bump a trailing decimal suffix (`df2` -> `df3`, `x9` -> `x10`), or append
/// `2` when there is none (`df` -> `df2`).
pub fn increment_name(name: &str) -> String {
    match trailing_digits().find(name) {
        Some(m) => format!("{}{}", &name[..m.start()], increment_decimal(m.as_str())),
        None => format!("{}2", name),
    }
}

/// Add one to a decimal digit string of any length. Leading zeros drop.
fn increment_decimal(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    let mut bytes: Vec<u8> = if trimmed.is_empty() {
        vec![b'0']
    } else {
        trimmed.as_bytes().to_vec()
    };

    let mut i = bytes.len();
    loop {
        if i == 0 {
            bytes.insert(0, b'1');
            break;
        }
        i -= 1;
        if bytes[i] == b'9' {
            bytes[i] = b'0';
        } else {
            bytes[i] += 1;
            break;
        }
    }
    bytes.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(names: &[&str]) -> Namespace {
        Namespace::from_live(names.iter().copied())
    }

    #[test]
    fn test_allocate_free_name_unchanged() {
        assert_eq!(allocate("df", &Namespace::new()), "df");
    }

    #[test]
    fn test_allocate_increment_law() {
        assert_eq!(allocate("df", &ns(&["df"])), "df2");
        assert_eq!(allocate("df2", &ns(&["df2"])), "df3");
        assert_eq!(allocate("x9", &ns(&["x9"])), "x10");
    }

    #[test]
    fn test_allocate_walks_chain() {
        assert_eq!(allocate("df", &ns(&["df", "df2"])), "df3");
        assert_eq!(allocate("df", &ns(&["df", "df2", "df3", "df4"])), "df5");
    }

    #[test]
    fn test_allocate_only_exact_base_collides() {
        assert_eq!(allocate("df", &ns(&["df9"])), "df");
        assert_eq!(allocate("df", &ns(&["df2", "df3"])), "df");
    }

    #[test]
    fn test_increment_name() {
        assert_eq!(increment_name("op"), "op2");
        assert_eq!(increment_name("op2"), "op3");
        assert_eq!(increment_name("op99"), "op100");
        assert_eq!(increment_name("x007"), "x8");
        assert_eq!(increment_name("x000"), "x1");
        assert_eq!(increment_name("7"), "8");
    }

    #[test]
    fn test_increment_past_u64() {
        let big = "n99999999999999999999999999";
        assert_eq!(increment_name(big), "n100000000000000000000000000");
    }

    #[test]
    fn test_namespace_with_is_persistent() {
        let base = ns(&["op"]);
        let extended = base.with("df");
        assert!(!base.contains("df"));
        assert!(extended.contains("df"));
        assert!(extended.contains("op"));
        assert_eq!(extended.local(), vec!["df"]);
        assert!(base.local().is_empty());
    }

    #[test]
    fn test_allocate_sees_local_names() {
        let n = Namespace::new().with("conn").with("conn2");
        assert_eq!(allocate("conn", &n), "conn3");
    }

    #[test]
    fn test_with_shares_earlier_names() {
        let base = Namespace::new().with("op").with("df");
        let left = base.with("df2");
        let right = base.with("conn");
        assert!(left.shares_local_prefix(&right, 2));
        assert!(!left.shares_local_prefix(&right, 3));
        assert_eq!(left.local(), vec!["op", "df", "df2"]);
        assert_eq!(right.local(), vec!["op", "df", "conn"]);
        assert_ne!(left, right);
    }

    #[test]
    fn test_long_namespace_drops() {
        let mut n = Namespace::new();
        for i in 0..200_000 {
            n = n.with(format!("v{}", i));
        }
        assert!(n.contains("v0"));
        drop(n);
    }

    #[test]
    fn test_live_snapshot_shared() {
        let base = ns(&["a", "b"]);
        let extended = base.with("c");
        assert_eq!(extended.live().len(), 2);
    }
}
