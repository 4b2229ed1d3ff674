//! Watcher configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Interval between two ticks unless configured otherwise
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// What a [`ChangeWatcher`](super::ChangeWatcher) watches and how often
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Directory to watch
    pub path: PathBuf,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Only watch files with this extension (without the leading dot)
    pub extension: Option<String>,
    /// Time between the end of one tick and the start of the next
    pub interval: Duration,
}

impl WatchConfig {
    /// Watch the immediate files of `path`, every file type, at the default interval
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: false,
            extension: None,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Watch subdirectories too
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Restrict the watch to one extension; a leading dot is stripped
    #[must_use]
    pub fn extension(mut self, extension: impl AsRef<str>) -> Self {
        let extension = extension.as_ref().trim_start_matches('.');
        self.extension = (!extension.is_empty()).then(|| extension.to_string());
        self
    }

    /// Set the polling interval
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Watched directory
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WatchConfig::new("/tmp/watched");
        assert_eq!(config.path(), Path::new("/tmp/watched"));
        assert!(!config.recursive);
        assert_eq!(config.extension, None);
        assert_eq!(config.interval, Duration::from_secs(1));
    }

    #[test]
    fn test_extension_normalization() {
        assert_eq!(
            WatchConfig::new("/w").extension(".py").extension,
            Some("py".to_string())
        );
        assert_eq!(
            WatchConfig::new("/w").extension("py").extension,
            Some("py".to_string())
        );
        assert_eq!(WatchConfig::new("/w").extension("").extension, None);
    }
}
