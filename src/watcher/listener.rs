//! Delivery of watch deltas
//!
//! A [`ChangeWatcher`](super::ChangeWatcher) hands every non-empty delta to a
//! single [`WatchListener`]. Two implementations cover the common cases:
//!
//! - [`Callbacks`]: closure slots, either one combined `on_change` callback or
//!   separate `on_created` / `on_edited` / `on_deleted` callbacks
//! - [`ChannelListener`]: pushes [`WatchEvent`]s onto a tokio channel

use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::debug;

use super::{WatchDelta, WatchEvent};

/// Receiver of the changes found by each tick
///
/// `on_delta` runs on the watcher's worker thread and is only invoked for
/// deltas with at least one change. A panic inside it is caught and logged;
/// the watcher keeps polling.
pub trait WatchListener: Send + Sync + 'static {
    /// Handle the changes of one tick
    fn on_delta(&self, delta: &WatchDelta);
}

impl<F> WatchListener for F
where
    F: Fn(&WatchDelta) + Send + Sync + 'static,
{
    fn on_delta(&self, delta: &WatchDelta) {
        self(delta);
    }
}

/// Callback receiving a list of absolute paths
pub type PathCallback = Box<dyn Fn(&[PathBuf]) + Send + Sync + 'static>;

/// Closure-based listener
///
/// When `on_change` is set it takes precedence: it is called once per tick
/// with created, edited and deleted paths concatenated in that order, and the
/// per-kind callbacks are not used. Otherwise each per-kind callback is called
/// when its own list is non-empty.
///
/// # Examples
///
/// ```rust
/// use fskit::watcher::Callbacks;
///
/// let callbacks = Callbacks::new()
///     .on_created(|paths| println!("created: {paths:?}"))
///     .on_deleted(|paths| println!("deleted: {paths:?}"));
/// # let _ = callbacks;
/// ```
#[derive(Default)]
pub struct Callbacks {
    created: Option<PathCallback>,
    edited: Option<PathCallback>,
    deleted: Option<PathCallback>,
    changed: Option<PathCallback>,
}

impl Callbacks {
    /// No callbacks registered
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback for newly seen paths
    #[must_use]
    pub fn on_created(mut self, f: impl Fn(&[PathBuf]) + Send + Sync + 'static) -> Self {
        self.created = Some(Box::new(f));
        self
    }

    /// Callback for paths whose modification time changed
    #[must_use]
    pub fn on_edited(mut self, f: impl Fn(&[PathBuf]) + Send + Sync + 'static) -> Self {
        self.edited = Some(Box::new(f));
        self
    }

    /// Callback for paths that disappeared
    #[must_use]
    pub fn on_deleted(mut self, f: impl Fn(&[PathBuf]) + Send + Sync + 'static) -> Self {
        self.deleted = Some(Box::new(f));
        self
    }

    /// Combined callback for every change of a tick
    #[must_use]
    pub fn on_change(mut self, f: impl Fn(&[PathBuf]) + Send + Sync + 'static) -> Self {
        self.changed = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("created", &self.created.is_some())
            .field("edited", &self.edited.is_some())
            .field("deleted", &self.deleted.is_some())
            .field("changed", &self.changed.is_some())
            .finish()
    }
}

impl WatchListener for Callbacks {
    fn on_delta(&self, delta: &WatchDelta) {
        if let Some(changed) = &self.changed {
            let paths = delta.changed_paths();
            if !paths.is_empty() {
                changed(paths.as_slice());
            }
            return;
        }

        let slots = [
            (&self.created, &delta.created),
            (&self.edited, &delta.edited),
            (&self.deleted, &delta.deleted),
        ];
        for (callback, paths) in slots {
            if let Some(callback) = callback {
                if !paths.is_empty() {
                    callback(paths.as_slice());
                }
            }
        }
    }
}

/// Listener forwarding every change as a [`WatchEvent`] to a channel
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<WatchEvent>,
}

impl ChannelListener {
    /// Create a listener and the receiving end of its channel
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WatchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl WatchListener for ChannelListener {
    fn on_delta(&self, delta: &WatchDelta) {
        for event in delta.events() {
            if self.tx.send(event).is_err() {
                debug!("Watch event receiver dropped; discarding remaining events");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<(&'static str, Vec<PathBuf>)>>>;

    fn recorder(log: &Log, label: &'static str) -> impl Fn(&[PathBuf]) + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |paths: &[PathBuf]| log.lock().unwrap().push((label, paths.to_vec()))
    }

    fn delta(created: &[&str], edited: &[&str], deleted: &[&str]) -> WatchDelta {
        let paths = |list: &[&str]| list.iter().map(PathBuf::from).collect();
        WatchDelta {
            created: paths(created),
            edited: paths(edited),
            deleted: paths(deleted),
        }
    }

    #[test]
    fn test_combined_callback_takes_precedence() {
        let log = Log::default();
        let callbacks = Callbacks::new()
            .on_created(recorder(&log, "created"))
            .on_change(recorder(&log, "changed"));

        callbacks.on_delta(&delta(&["/b"], &[], &["/a"]));

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![("changed", vec![PathBuf::from("/b"), PathBuf::from("/a")])]
        );
    }

    #[test]
    fn test_separate_callbacks_only_for_non_empty_lists() {
        let log = Log::default();
        let callbacks = Callbacks::new()
            .on_created(recorder(&log, "created"))
            .on_edited(recorder(&log, "edited"))
            .on_deleted(recorder(&log, "deleted"));

        callbacks.on_delta(&delta(&[], &["/e"], &["/d1", "/d2"]));

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                ("edited", vec![PathBuf::from("/e")]),
                ("deleted", vec![PathBuf::from("/d1"), PathBuf::from("/d2")]),
            ]
        );
    }

    #[test]
    fn test_missing_slot_is_skipped() {
        let log = Log::default();
        let callbacks = Callbacks::new().on_deleted(recorder(&log, "deleted"));

        callbacks.on_delta(&delta(&["/c"], &["/e"], &[]));

        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_channel_listener_emits_events_in_order() {
        let (listener, mut rx) = ChannelListener::channel();

        listener.on_delta(&delta(&["/c"], &["/e"], &["/d"]));

        assert_eq!(rx.try_recv().unwrap(), WatchEvent::Created(PathBuf::from("/c")));
        assert_eq!(rx.try_recv().unwrap(), WatchEvent::Edited(PathBuf::from("/e")));
        assert_eq!(rx.try_recv().unwrap(), WatchEvent::Deleted(PathBuf::from("/d")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closure_is_a_listener() {
        let seen = Arc::new(Mutex::new(0_usize));
        let counter = Arc::clone(&seen);
        let listener = move |delta: &WatchDelta| *counter.lock().unwrap() += delta.len();

        listener.on_delta(&delta(&["/a", "/b"], &[], &["/c"]));

        assert_eq!(*seen.lock().unwrap(), 3);
    }
}
