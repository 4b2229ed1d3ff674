//! Snapshot of observed entries and the per-tick delta
//!
//! The snapshot maps each watched path to the modification time seen on the
//! last tick. Diffing a fresh listing against it yields a [`WatchDelta`] and
//! brings the snapshot up to date in the same step.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::WatchEvent;

/// Changes detected by one tick
///
/// The three lists are disjoint. `created` and `edited` follow listing order,
/// `deleted` is sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchDelta {
    /// Paths seen for the first time
    pub created: Vec<PathBuf>,
    /// Paths whose modification time changed
    pub edited: Vec<PathBuf>,
    /// Paths that disappeared
    pub deleted: Vec<PathBuf>,
}

impl WatchDelta {
    /// Check whether the tick observed no change at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.edited.is_empty() && self.deleted.is_empty()
    }

    /// Total number of changed paths
    #[must_use]
    pub fn len(&self) -> usize {
        self.created.len() + self.edited.len() + self.deleted.len()
    }

    /// All changed paths: created, then edited, then deleted
    #[must_use]
    pub fn changed_paths(&self) -> Vec<PathBuf> {
        self.created
            .iter()
            .chain(&self.edited)
            .chain(&self.deleted)
            .cloned()
            .collect()
    }

    /// The delta as individual events, in the same order as [`WatchDelta::changed_paths`]
    pub fn events(&self) -> impl Iterator<Item = WatchEvent> + '_ {
        let created = self.created.iter().cloned().map(WatchEvent::Created);
        let edited = self.edited.iter().cloned().map(WatchEvent::Edited);
        let deleted = self.deleted.iter().cloned().map(WatchEvent::Deleted);
        created.chain(edited).chain(deleted)
    }
}

/// Last observed modification time of every watched path
#[derive(Debug, Clone, Default)]
pub struct WatchSnapshot {
    entries: BTreeMap<PathBuf, SystemTime>,
}

impl WatchSnapshot {
    /// Empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked paths
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no path is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Modification time recorded for `path`
    #[must_use]
    pub fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.entries.get(path).copied()
    }

    /// Tracked paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }

    /// Diff `listing` against the snapshot and update the snapshot to match it
    ///
    /// `listing` holds every currently present path with its modification
    /// time. Afterwards the snapshot contains exactly the listed paths.
    pub fn apply(&mut self, listing: Vec<(PathBuf, SystemTime)>) -> WatchDelta {
        let mut delta = WatchDelta::default();

        if listing.is_empty() && self.entries.is_empty() {
            return delta;
        }

        // Collect first, remove after: never mutate the map while walking it
        delta.deleted = {
            let present: HashSet<&Path> = listing.iter().map(|(path, _)| path.as_path()).collect();
            self.entries
                .keys()
                .filter(|path| !present.contains(path.as_path()))
                .cloned()
                .collect()
        };
        for path in &delta.deleted {
            self.entries.remove(path);
        }

        for (path, modified) in listing {
            match self.entries.get_mut(&path) {
                None => {
                    self.entries.insert(path.clone(), modified);
                    delta.created.push(path);
                }
                Some(previous) if *previous != modified => {
                    *previous = modified;
                    delta.edited.push(path);
                }
                Some(_) => {}
            }
        }

        delta
    }
}
