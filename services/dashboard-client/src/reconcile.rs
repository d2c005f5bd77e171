//! Keyed diff between two list snapshots
//!
//! Rendering always rebuilds the whole region; this is for callers that
//! want to know what actually changed between refreshes (e.g. `watch`).

use std::collections::HashMap;
use tracing::{debug, info};

use crate::refresh::Listing;

/// Row whose key exists in both snapshots but whose cells differ
#[derive(Debug, Clone, PartialEq)]
pub struct RowChange {
    pub key: String,
    pub before: Vec<String>,
    pub after: Vec<String>,
}

/// Differences between two snapshots of the same list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<RowChange>,
    pub unchanged: usize,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Log a one-line summary plus one line per change
    pub fn log(&self, what: &str) {
        if self.is_empty() {
            debug!("{}: no changes ({} rows)", what, self.unchanged);
            return;
        }

        info!(
            "{}: {} added, {} removed, {} changed, {} unchanged",
            what,
            self.added.len(),
            self.removed.len(),
            self.changed.len(),
            self.unchanged
        );
        for key in &self.added {
            info!("  + {}", key);
        }
        for key in &self.removed {
            info!("  - {}", key);
        }
        for change in &self.changed {
            info!("  ~ {}: {:?} -> {:?}", change.key, change.before, change.after);
        }
    }
}

/// Compare two snapshots by each row's natural key
///
/// Rows without a key are ignored. Output order follows the `next`
/// snapshot for added/changed rows and the `previous` one for removed rows.
pub fn diff_by_key<T: Listing>(previous: &[T], next: &[T]) -> SnapshotDiff {
    let before: HashMap<&str, Vec<String>> = previous
        .iter()
        .filter_map(|row| row.key().map(|k| (k, row.cells())))
        .collect();

    let mut diff = SnapshotDiff::default();
    let mut seen: Vec<&str> = Vec::with_capacity(next.len());

    for row in next {
        let Some(key) = row.key() else { continue };
        seen.push(key);
        let after = row.cells();
        match before.get(key) {
            None => diff.added.push(key.to_string()),
            Some(cells) if *cells != after => diff.changed.push(RowChange {
                key: key.to_string(),
                before: cells.clone(),
                after,
            }),
            Some(_) => diff.unchanged += 1,
        }
    }

    for row in previous {
        if let Some(key) = row.key() {
            if !seen.contains(&key) {
                diff.removed.push(key.to_string());
            }
        }
    }

    diff
}
