//! Command-line interface definitions
//!
//! Arguments are grouped by the subcommand that consumes them; output and
//! logging options are shared by every subcommand.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::version::{FileQuery, FolderQuery, VersionSelector};
use crate::watcher::{WatchConfig, DEFAULT_INTERVAL};

/// Resolve versioned folders and files, watch directories for changes
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Output and logging configuration
    #[command(flatten)]
    pub output: OutputConfig,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List or pick versioned entries of a directory
    Versions(VersionsArgs),

    /// Print created, edited and deleted files until interrupted
    Watch(WatchArgs),

    /// Print a path with mixed or repeated separators in native form
    Normalize {
        /// Path to normalize
        #[arg(value_name = "PATH")]
        path: String,
    },
}

// ============================================================================
// SUBCOMMAND GROUPS
// ============================================================================

/// Options of `fskit versions`
///
/// Used by: `resolve_folders()`, `resolve_files()`
#[derive(clap::Args, Debug, Clone)]
pub struct VersionsArgs {
    /// Directory holding the versioned entries
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,

    /// Resolve `name.v###.ext` files instead of `1.2.3` folders
    #[arg(long)]
    pub files: bool,

    /// all, latest, current, first, last, previous, or an explicit version
    #[arg(short, long, default_value = "all", value_name = "SELECTOR")]
    pub select: VersionSelector,

    /// Print absolute paths instead of names
    #[arg(short, long)]
    pub absolute: bool,

    /// Accept folder names like `v1.2` or `1.2.0-rc1`
    #[arg(long, conflicts_with = "files")]
    pub lenient: bool,

    /// Fail on folder names that are not versions (requires --lenient)
    #[arg(long, requires = "lenient")]
    pub strict: bool,

    /// Create the directory when it is missing
    #[arg(long)]
    pub create: bool,
}

impl VersionsArgs {
    /// Folder query described by these options
    #[must_use]
    pub fn folder_query(&self) -> FolderQuery {
        FolderQuery::new(self.select.clone())
            .absolute_path(self.absolute)
            .semantic_only(!self.lenient)
            .ignore(!self.strict)
            .create_path(self.create)
    }

    /// File query described by these options
    #[must_use]
    pub fn file_query(&self) -> FileQuery {
        FileQuery::new(self.select.clone())
            .absolute_path(self.absolute)
            .create_path(self.create)
    }
}

/// Options of `fskit watch`
///
/// Used by: `ChangeWatcher::new()`
#[derive(clap::Args, Debug, Clone)]
pub struct WatchArgs {
    /// Directory to watch
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,

    /// Watch subdirectories too
    #[arg(short, long)]
    pub recursive: bool,

    /// Only watch files with this extension
    #[arg(short, long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Seconds between two polls
    #[arg(short, long, default_value = "1.0", value_name = "SECONDS")]
    pub interval: f64,
}

impl WatchArgs {
    /// Watcher configuration described by these options
    ///
    /// An interval rejected by [`Args::validate`] falls back to the default.
    #[must_use]
    pub fn watch_config(&self) -> WatchConfig {
        let interval = Duration::try_from_secs_f64(self.interval).unwrap_or(DEFAULT_INTERVAL);
        let config = WatchConfig::new(&self.directory)
            .recursive(self.recursive)
            .interval(interval);
        match &self.extension {
            Some(extension) => config.extension(extension),
            None => config,
        }
    }
}

/// Output and logging configuration
///
/// Used by: `main()` when installing the tracing subscriber
#[derive(clap::Args, Debug, Clone, Default)]
#[command(next_help_heading = "Output Options")]
pub struct OutputConfig {
    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl OutputConfig {
    /// Maximum tracing level for the configured verbosity
    #[must_use]
    pub const fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

// ============================================================================
// IMPLEMENTATION: Validation
// ============================================================================

impl Args {
    /// Validate command-line arguments
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - Both --quiet and --verbose options are used
    /// - The watched directory does not exist
    /// - The watch interval is not a positive number of seconds
    pub fn validate(&self) -> Result<()> {
        if self.output.quiet && self.output.verbose > 0 {
            anyhow::bail!("Cannot use both --quiet and --verbose options");
        }

        if let Command::Watch(watch) = &self.command {
            if !watch.directory.is_dir() {
                anyhow::bail!(
                    "Watched directory does not exist: {}",
                    watch.directory.display()
                );
            }

            match Duration::try_from_secs_f64(watch.interval) {
                Ok(interval) if !interval.is_zero() => {}
                _ => anyhow::bail!(
                    "Watch interval must be a positive number of seconds, got: {}",
                    watch.interval
                ),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]
    use super::*;
    use crate::version::RequestedVersion;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("fskit").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_versions_defaults() {
        let args = parse(&["versions", "/opt/releases"]);
        let Command::Versions(versions) = args.command else {
            panic!("expected versions subcommand");
        };

        assert_eq!(versions.select, VersionSelector::All);
        let query = versions.folder_query();
        assert!(query.semantic_only);
        assert!(query.ignore);
        assert!(!query.absolute_path);
        assert!(!query.create_path);
    }

    #[test]
    fn test_versions_selector_parsing() {
        let args = parse(&["versions", "/opt/releases", "--files", "-s", "1", "--absolute"]);
        let Command::Versions(versions) = args.command else {
            panic!("expected versions subcommand");
        };

        assert!(versions.files);
        assert_eq!(
            versions.select,
            VersionSelector::Exact(RequestedVersion::Text("1".to_string()))
        );
        assert!(versions.file_query().absolute_path);
    }

    #[test]
    fn test_strict_requires_lenient() {
        assert!(Args::try_parse_from(["fskit", "versions", "/x", "--strict"]).is_err());

        let args = parse(&["versions", "/x", "--lenient", "--strict"]);
        let Command::Versions(versions) = args.command else {
            panic!("expected versions subcommand");
        };
        let query = versions.folder_query();
        assert!(!query.semantic_only);
        assert!(!query.ignore);
    }

    #[test]
    fn test_lenient_conflicts_with_files() {
        assert!(Args::try_parse_from(["fskit", "versions", "/x", "--files", "--lenient"]).is_err());
    }

    #[test]
    fn test_watch_config() {
        let args = parse(&["watch", "/w", "-r", "-e", ".py", "--interval", "0.25"]);
        let Command::Watch(watch) = args.command else {
            panic!("expected watch subcommand");
        };

        let config = watch.watch_config();
        assert!(config.recursive);
        assert_eq!(config.extension.as_deref(), Some("py"));
        assert_eq!(config.interval, Duration::from_millis(250));
    }

    #[test]
    fn test_oversized_interval_does_not_panic() {
        let args = parse(&["watch", "/w", "--interval", "1e20"]);
        let Command::Watch(watch) = args.command else {
            panic!("expected watch subcommand");
        };
        assert_eq!(watch.watch_config().interval, DEFAULT_INTERVAL);
    }

    #[test]
    fn test_validate_watch() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let dir = temp.path().to_str().unwrap();

        assert!(parse(&["watch", dir]).validate().is_ok());
        assert!(parse(&["watch", dir, "--interval", "0"]).validate().is_err());
        assert!(parse(&["watch", dir, "--interval", "1e20"]).validate().is_err());
        assert!(parse(&["watch", dir, "--interval", "NaN"]).validate().is_err());
        assert!(parse(&["watch", "/nonexistent/fskit/dir"]).validate().is_err());
        Ok(())
    }

    #[test]
    fn test_quiet_and_verbose_conflict() {
        let args = parse(&["-q", "-v", "normalize", "a//b"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut output = OutputConfig::default();
        assert_eq!(output.log_level(), tracing::Level::WARN);
        output.verbose = 2;
        assert_eq!(output.log_level(), tracing::Level::DEBUG);
        output.quiet = true;
        assert_eq!(output.log_level(), tracing::Level::ERROR);
    }
}
