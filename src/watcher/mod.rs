//! Polling change watcher
//!
//! [`ChangeWatcher`] re-lists a directory on a fixed interval, compares the
//! listing with the snapshot taken on the previous tick, and reports which
//! files were created, edited (modification time changed) or deleted. It
//! polls; it does not subscribe to OS file events.
//!
//! # Module Organization
//!
//! - `config`: What to watch and how often (`WatchConfig`)
//! - `snapshot`: Snapshot bookkeeping and delta computation
//! - `listener`: Delivery of deltas (trait, closures, channel)
//! - `change_watcher`: Timer task and state machine
//!
//! # Lifecycle
//!
//! ```text
//!   Idle ──start()──▶ Armed ──interval──▶ Running ──tick done──▶ Armed ─┐
//!                       ▲                                              │
//!                       └──────────────────────────────────────────────┘
//!   any state ──stop()──▶ Stopped ──start()──▶ Armed
//! ```
//!
//! The next interval only starts once the previous tick has finished, so ticks
//! never overlap.

mod change_watcher;
mod config;
mod listener;
mod snapshot;

pub use change_watcher::ChangeWatcher;
pub use config::{WatchConfig, DEFAULT_INTERVAL};
pub use listener::{Callbacks, ChannelListener, PathCallback, WatchListener};
pub use snapshot::{WatchDelta, WatchSnapshot};

use std::fmt;
use std::path::{Path, PathBuf};

/// Lifecycle state of a [`ChangeWatcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Constructed, timer never armed
    Idle,
    /// Waiting for the next interval to elapse
    Armed,
    /// A tick is listing, diffing or dispatching
    Running,
    /// Cancelled; no further tick will start
    Stopped,
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Armed => "armed",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// A single change reported by the watcher
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchEvent {
    /// The path appeared
    Created(PathBuf),
    /// The path's modification time changed
    Edited(PathBuf),
    /// The path disappeared
    Deleted(PathBuf),
}

impl WatchEvent {
    /// Path the event refers to
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(path) | Self::Edited(path) | Self::Deleted(path) => path,
        }
    }

    /// Short lowercase label (`created`, `edited`, `deleted`)
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Edited(_) => "edited",
            Self::Deleted(_) => "deleted",
        }
    }
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.path().display())
    }
}
