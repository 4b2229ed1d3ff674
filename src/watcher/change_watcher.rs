//! Timer task and state machine driving the watcher
//!
//! `start()` spawns one tokio task per arming. The task sleeps for the
//! configured interval, runs a tick on the blocking pool, waits for it to
//! finish and only then sleeps again. Every arming gets a fresh generation
//! number; a task or tick whose generation is no longer current never
//! dispatches and exits at its next state check.
//!
//! Ticks are serialized by a gate held across listing, diffing and dispatch,
//! whether they come from the timer, from a stale generation or from
//! `poll_now()`. A tick that may not dispatch leaves the snapshot untouched,
//! so its changes are reported by the next tick that does.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::{
    ChannelListener, WatchConfig, WatchDelta, WatchEvent, WatchListener, WatchSnapshot, WatchState,
};
use crate::directory::Directory;
use crate::error::{FsError, Result};

/// Polling watcher reporting created, edited and deleted files
///
/// Dropping the watcher stops it.
///
/// # Examples
///
/// ```rust,no_run
/// use fskit::watcher::{ChangeWatcher, WatchConfig};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> fskit::Result<()> {
/// let config = WatchConfig::new("/var/spool/jobs")
///     .extension("json")
///     .interval(Duration::from_millis(500));
/// let (watcher, mut events) = ChangeWatcher::with_channel(config);
/// watcher.start()?;
///
/// while let Some(event) = events.recv().await {
///     println!("{event}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChangeWatcher {
    shared: Arc<Shared>,
}

struct Shared {
    config: WatchConfig,
    listener: Box<dyn WatchListener>,
    tick_gate: Mutex<()>,
    snapshot: Mutex<WatchSnapshot>,
    control: Mutex<Control>,
}

struct Control {
    state: WatchState,
    generation: u64,
    shutdown: Option<watch::Sender<bool>>,
}

impl ChangeWatcher {
    /// Create an idle watcher delivering deltas to `listener`
    ///
    /// A relative watch path is made absolute against the current directory,
    /// so reported paths are always absolute.
    #[must_use]
    pub fn new(config: WatchConfig, listener: impl WatchListener) -> Self {
        let mut config = config;
        if let Ok(absolute) = std::path::absolute(&config.path) {
            config.path = absolute;
        }

        Self {
            shared: Arc::new(Shared {
                config,
                listener: Box::new(listener),
                tick_gate: Mutex::new(()),
                snapshot: Mutex::new(WatchSnapshot::new()),
                control: Mutex::new(Control {
                    state: WatchState::Idle,
                    generation: 0,
                    shutdown: None,
                }),
            }),
        }
    }

    /// Create an idle watcher whose changes arrive as [`WatchEvent`]s on a channel
    #[must_use]
    pub fn with_channel(config: WatchConfig) -> (Self, mpsc::UnboundedReceiver<WatchEvent>) {
        let (listener, rx) = ChannelListener::channel();
        (Self::new(config, listener), rx)
    }

    /// Configuration the watcher was built with
    #[must_use]
    pub fn config(&self) -> &WatchConfig {
        &self.shared.config
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> WatchState {
        lock(&self.shared.control).state
    }

    /// Arm the timer
    ///
    /// Moves Idle or Stopped to Armed. Starting a watcher that is already
    /// Armed or Running does nothing. The snapshot survives a stop/start
    /// cycle, so restarting only reports what changed in between.
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::Watcher)` when called outside a tokio runtime.
    pub fn start(&self) -> Result<()> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| FsError::Watcher(format!("No tokio runtime to drive the watcher: {e}")))?;

        let (generation, shutdown) = {
            let mut control = lock(&self.shared.control);
            if matches!(control.state, WatchState::Armed | WatchState::Running) {
                return Ok(());
            }

            let (tx, rx) = watch::channel(false);
            control.generation += 1;
            control.state = WatchState::Armed;
            control.shutdown = Some(tx);
            (control.generation, rx)
        };

        info!(
            "Watching {} every {:?}{}",
            self.shared.config.path.display(),
            self.shared.config.interval,
            if self.shared.config.recursive { " (recursive)" } else { "" }
        );
        handle.spawn(run(Arc::clone(&self.shared), generation, shutdown));
        Ok(())
    }

    /// Cancel the timer
    ///
    /// Safe to call from any thread and any state. A tick that is already
    /// listing or diffing is discarded without touching the snapshot, so a
    /// later `start()` reports its changes. Once `stop()` has returned no
    /// listener is invoked again until the next `start()`.
    pub fn stop(&self) {
        let mut control = lock(&self.shared.control);
        if control.state == WatchState::Stopped {
            return;
        }

        let previous = control.state;
        control.state = WatchState::Stopped;
        if let Some(tx) = control.shutdown.take() {
            // No receiver left means the task is already gone
            tx.send(true).ok();
        }
        drop(control);

        info!(
            "Stopped watching {} (was {previous})",
            self.shared.config.path.display()
        );
    }

    /// Run one tick synchronously and return its delta
    ///
    /// The delta is also dispatched to the listener. Works without a tokio
    /// runtime and without `start()`, which makes it the hook for callers
    /// that drive polling themselves. Waits for a timer tick in progress;
    /// calling it from inside the listener deadlocks.
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::Watcher)` once the watcher has been stopped.
    pub fn poll_now(&self) -> Result<WatchDelta> {
        if self.state() == WatchState::Stopped {
            return Err(FsError::Watcher(format!(
                "Watcher for {} is stopped",
                self.shared.config.path.display()
            )));
        }
        Ok(self.shared.tick(None))
    }

    /// Number of paths currently tracked in the snapshot
    #[must_use]
    pub fn tracked(&self) -> usize {
        lock(&self.shared.snapshot).len()
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ChangeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeWatcher")
            .field("config", &self.shared.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Timer task
// ============================================================================

async fn run(shared: Arc<Shared>, generation: u64, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            () = tokio::time::sleep(shared.config.interval) => {}
            _ = shutdown.changed() => break,
        }

        if !shared.begin_tick(generation) {
            break;
        }

        let worker = Arc::clone(&shared);
        if let Err(e) = tokio::task::spawn_blocking(move || worker.tick(Some(generation))).await {
            error!(
                "Watcher tick for {} did not complete: {e}",
                shared.config.path.display()
            );
        }

        if !shared.finish_tick(generation) {
            break;
        }
    }

    debug!(
        "Watcher task for {} (generation {generation}) exited",
        shared.config.path.display()
    );
}

impl Shared {
    /// Armed → Running, only for the current generation
    fn begin_tick(&self, generation: u64) -> bool {
        let mut control = lock(&self.control);
        if control.generation == generation && control.state == WatchState::Armed {
            control.state = WatchState::Running;
            true
        } else {
            false
        }
    }

    /// Running → Armed, only for the current generation
    fn finish_tick(&self, generation: u64) -> bool {
        let mut control = lock(&self.control);
        if control.generation == generation && control.state == WatchState::Running {
            control.state = WatchState::Armed;
            true
        } else {
            false
        }
    }

    fn may_dispatch(&self, generation: u64) -> bool {
        let control = lock(&self.control);
        control.generation == generation && control.state == WatchState::Running
    }

    /// List, diff and dispatch; `generation` is `None` for manual polls
    ///
    /// The snapshot only moves forward when the delta is dispatched.
    fn tick(&self, generation: Option<u64>) -> WatchDelta {
        let _gate = lock(&self.tick_gate);

        let listing = self.list_entries();
        let mut next = lock(&self.snapshot).clone();
        let delta = next.apply(listing);

        if delta.is_empty() {
            return delta;
        }

        debug!(
            "Tick on {}: {} created, {} edited, {} deleted",
            self.config.path.display(),
            delta.created.len(),
            delta.edited.len(),
            delta.deleted.len()
        );

        if generation.is_some_and(|generation| !self.may_dispatch(generation)) {
            debug!("Watcher stopped during tick; keeping the previous snapshot");
            return WatchDelta::default();
        }

        *lock(&self.snapshot) = next;
        self.dispatch(&delta);
        delta
    }

    fn dispatch(&self, delta: &WatchDelta) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.listener.on_delta(delta)));
        if let Err(payload) = outcome {
            error!(
                "Watch listener for {} panicked: {}",
                self.config.path.display(),
                panic_message(payload.as_ref())
            );
        }
    }

    fn list_entries(&self) -> Vec<(PathBuf, SystemTime)> {
        let directory = Directory::new(self.config.path.clone());
        let extension = self.config.extension.as_deref();

        let listed = if self.config.recursive {
            directory.list_files_recursively(extension)
        } else {
            directory.list_files_with_absolute_path(extension)
        };
        let paths = match listed {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Treating watched directory as empty: {e}");
                return Vec::new();
            }
        };

        paths
            .into_iter()
            .filter_map(|path| match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(modified) => Some((path, modified)),
                Err(e) => {
                    debug!("Skipping {} this tick: {e}", path.display());
                    None
                }
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]
    use super::*;
    use crate::watcher::Callbacks;
    use filetime::{set_file_mtime, FileTime};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    type Log = Arc<Mutex<Vec<Vec<PathBuf>>>>;

    fn combined(log: &Log) -> Callbacks {
        let log = Arc::clone(log);
        Callbacks::new()
            .on_change(move |paths: &[PathBuf]| log.lock().unwrap().push(paths.to_vec()))
    }

    fn bump_mtime(path: &Path, secs: i64) {
        set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
    }

    #[test]
    fn test_poll_scenario() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path().canonicalize()?;
        let log = Log::default();
        let watcher = ChangeWatcher::new(WatchConfig::new(&root), combined(&log));

        assert!(watcher.poll_now()?.is_empty());
        assert!(log.lock().unwrap().is_empty());

        let a = root.join("a.txt");
        fs::write(&a, "a")?;
        bump_mtime(&a, 1_000);
        assert_eq!(watcher.poll_now()?.created, vec![a.clone()]);

        bump_mtime(&a, 2_000);
        assert_eq!(watcher.poll_now()?.edited, vec![a.clone()]);

        fs::remove_file(&a)?;
        assert_eq!(watcher.poll_now()?.deleted, vec![a.clone()]);

        assert!(watcher.poll_now()?.is_empty());
        assert_eq!(watcher.tracked(), 0);

        let log = log.lock().unwrap();
        assert_eq!(*log, vec![vec![a.clone()], vec![a.clone()], vec![a]]);
        Ok(())
    }

    #[test]
    fn test_combined_create_and_delete_order() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path().canonicalize()?;
        let a = root.join("a.txt");
        fs::write(&a, "a")?;

        let log = Log::default();
        let watcher = ChangeWatcher::new(WatchConfig::new(&root), combined(&log));
        watcher.poll_now()?;

        let b = root.join("b.txt");
        fs::remove_file(&a)?;
        fs::write(&b, "b")?;
        watcher.poll_now()?;

        let log = log.lock().unwrap();
        assert_eq!(log.last(), Some(&vec![b, a]));
        Ok(())
    }

    #[test]
    fn test_extension_filter_and_recursion() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path().canonicalize()?;
        fs::create_dir(root.join("sub"))?;
        fs::write(root.join("top.py"), "")?;
        fs::write(root.join("top.txt"), "")?;
        fs::write(root.join("sub").join("deep.py"), "")?;

        let flat =
            ChangeWatcher::new(WatchConfig::new(&root).extension("py"), |_: &WatchDelta| {});
        assert_eq!(flat.poll_now()?.created, vec![root.join("top.py")]);

        let deep = ChangeWatcher::new(
            WatchConfig::new(&root).extension(".py").recursive(true),
            |_: &WatchDelta| {},
        );
        assert_eq!(
            deep.poll_now()?.created,
            vec![root.join("sub").join("deep.py"), root.join("top.py")]
        );
        Ok(())
    }

    #[test]
    fn test_missing_directory_is_an_empty_listing() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let watched = temp.path().join("watched");
        fs::create_dir(&watched)?;
        fs::write(watched.join("x.txt"), "")?;

        let watcher = ChangeWatcher::new(WatchConfig::new(&watched), |_: &WatchDelta| {});
        assert_eq!(watcher.poll_now()?.created.len(), 1);

        fs::remove_dir_all(&watched)?;
        let delta = watcher.poll_now()?;
        assert_eq!(delta.deleted.len(), 1);
        assert!(watcher.poll_now()?.is_empty());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subfolder_does_not_report_deletions() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new()?;
        let root = temp.path().canonicalize()?;
        let sub = root.join("sub");
        fs::create_dir(&sub)?;
        fs::write(root.join("top.txt"), "")?;

        let config = WatchConfig::new(&root).recursive(true);
        let watcher = ChangeWatcher::new(config, |_: &WatchDelta| {});
        assert_eq!(watcher.poll_now()?.created, vec![root.join("top.txt")]);

        fs::set_permissions(&sub, fs::Permissions::from_mode(0o000))?;
        let delta = watcher.poll_now();
        fs::set_permissions(&sub, fs::Permissions::from_mode(0o755))?;

        assert!(delta?.deleted.is_empty());
        assert_eq!(watcher.tracked(), 1);
        Ok(())
    }

    #[test]
    fn test_listener_panic_is_contained() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let watcher = ChangeWatcher::new(WatchConfig::new(temp.path()), move |_: &WatchDelta| {
            counter.fetch_add(1, Ordering::SeqCst);
            panic!("listener failure");
        });

        fs::write(temp.path().join("one"), "")?;
        assert_eq!(watcher.poll_now()?.created.len(), 1);
        fs::write(temp.path().join("two"), "")?;
        assert_eq!(watcher.poll_now()?.created.len(), 1);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[test]
    fn test_start_requires_runtime() {
        let watcher = ChangeWatcher::new(WatchConfig::new("."), |_: &WatchDelta| {});
        assert!(matches!(watcher.start(), Err(FsError::Watcher(_))));
        assert_eq!(watcher.state(), WatchState::Idle);
    }

    #[test]
    fn test_poll_after_stop_fails() {
        let watcher = ChangeWatcher::new(WatchConfig::new("."), |_: &WatchDelta| {});
        watcher.stop();
        assert_eq!(watcher.state(), WatchState::Stopped);
        assert!(matches!(watcher.poll_now(), Err(FsError::Watcher(_))));
    }

    #[test]
    fn test_refused_tick_keeps_snapshot() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path().canonicalize()?;
        let log = Log::default();
        let watcher = ChangeWatcher::new(WatchConfig::new(&root), combined(&log));

        let file = root.join("pending.txt");
        fs::write(&file, "")?;

        // Generation 1 was never armed, as after a stop() landing mid-tick
        assert!(watcher.shared.tick(Some(1)).is_empty());
        assert_eq!(watcher.tracked(), 0);
        assert!(log.lock().unwrap().is_empty());

        assert_eq!(watcher.poll_now()?.created, vec![file.clone()]);
        assert_eq!(*log.lock().unwrap(), vec![vec![file]]);
        Ok(())
    }

    #[test]
    fn test_concurrent_polls_report_each_file_once() -> anyhow::Result<()> {
        const FILES: usize = 200;
        let temp = TempDir::new()?;
        let root = temp.path().canonicalize()?;

        let created = Arc::new(AtomicUsize::new(0));
        let deleted = Arc::new(AtomicUsize::new(0));
        let (created_count, deleted_count) = (Arc::clone(&created), Arc::clone(&deleted));
        let watcher = ChangeWatcher::new(WatchConfig::new(&root), move |delta: &WatchDelta| {
            created_count.fetch_add(delta.created.len(), Ordering::SeqCst);
            deleted_count.fetch_add(delta.deleted.len(), Ordering::SeqCst);
        });

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        watcher.poll_now().unwrap();
                    }
                });
            }
            for i in 0..FILES {
                fs::write(root.join(format!("{i:04}.txt")), "").unwrap();
            }
        });
        watcher.poll_now()?;

        assert_eq!(created.load(Ordering::SeqCst), FILES);
        assert_eq!(deleted.load(Ordering::SeqCst), 0);
        assert_eq!(watcher.tracked(), FILES);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timer_reports_changes_until_stopped() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path().canonicalize()?;
        let config = WatchConfig::new(&root).interval(Duration::from_millis(20));
        let (watcher, mut events) = ChangeWatcher::with_channel(config);

        watcher.start()?;
        assert!(matches!(watcher.state(), WatchState::Armed | WatchState::Running));
        watcher.start()?;

        let file = root.join("job.json");
        fs::write(&file, "{}")?;
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv()).await?;
        assert_eq!(event, Some(WatchEvent::Created(file.clone())));

        watcher.stop();
        assert_eq!(watcher.state(), WatchState::Stopped);

        fs::write(root.join("late.json"), "{}")?;
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(events.try_recv().is_err());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_restart_resumes_from_snapshot() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path().canonicalize()?;
        let first = root.join("first");
        fs::write(&first, "")?;

        let config = WatchConfig::new(&root).interval(Duration::from_millis(20));
        let (watcher, mut events) = ChangeWatcher::with_channel(config);
        watcher.poll_now()?;
        assert_eq!(events.try_recv()?, WatchEvent::Created(first));

        watcher.stop();
        let second = root.join("second");
        fs::write(&second, "")?;
        watcher.start()?;

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv()).await?;
        assert_eq!(event, Some(WatchEvent::Created(second)));
        Ok(())
    }
}
