//! fskit - filesystem helpers
//!
//! # Module Organization
//!
//! - [`version`]: Pick versioned folders (`1.2.0`) and files (`name.v003.ext`)
//!   by selector: all, latest, first, previous or an explicit version
//! - [`watcher`]: Polling watcher reporting created, edited and deleted files
//! - [`directory`]: Directory handle with sorted listings and path helpers
//! - [`document`]: File, JSON and template wrappers
//! - [`error`]: Error type shared by all modules
//! - [`cli`]: Command-line arguments of the `fskit` binary

pub mod cli;
pub mod directory;
pub mod document;
pub mod error;
pub mod version;
pub mod watcher;

pub use error::{FsError, Result};
