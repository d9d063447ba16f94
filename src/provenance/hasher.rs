//! BLAKE3 fingerprints for generated code and action logs.

use super::actionlog::ActionLog;

/// Hash a string. Returns `"blake3:{hex}"`.
pub fn hash_string(s: &str) -> String {
    format!("blake3:{}", blake3::hash(s.as_bytes()).to_hex())
}

/// Hash an action log, entry by entry in log order.
///
/// Two logs hash equal exactly when they hold the same entries, including
/// freshness marks, so the hash changes whenever a stat is marked fresh.
pub fn hash_log(log: &ActionLog) -> String {
    let mut hasher = blake3::Hasher::new();
    for entry in log.iter() {
        hasher.update(entry.kind().as_bytes());
        hasher.update(b"\0");
        for col in entry.columns() {
            hasher.update(col.as_bytes());
            hasher.update(b"\x1f");
        }
        hasher.update(b"\0");
        for stat in entry.stats_marked_fresh() {
            hasher.update(stat.as_bytes());
            hasher.update(b"\x1f");
        }
        hasher.update(b"\n");
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}
