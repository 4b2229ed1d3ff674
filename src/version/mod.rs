//! Versioned entry resolution
//!
//! Directories holding many releases of the same thing usually name each
//! release after its version: folders called `1.0.0`, `2.1.0`, `10.0.0`, or
//! files called `scene.v001.ma`, `scene.v002.ma`. This module picks entries out
//! of such directories by [`VersionSelector`].
//!
//! # Module Organization
//!
//! - `semantic`: Dot-separated numeric folder versions
//! - `file`: `name.v###.ext` file versions
//! - `resolver`: Filtering, ordering and selection
//! - `mod`: Selectors and results (this file)
//!
//! # Examples
//!
//! ```rust
//! use fskit::version::{resolve_folder_names, FolderQuery, Resolution, VersionSelector};
//!
//! # fn main() -> fskit::Result<()> {
//! let names = ["2.0.0", "10.0.0", "1.0.0", "3.0.0"];
//!
//! let latest = resolve_folder_names(names, &FolderQuery::new(VersionSelector::Latest))?;
//! assert_eq!(latest, Resolution::Found("10.0.0".to_string()));
//!
//! let previous = resolve_folder_names(names, &FolderQuery::new(VersionSelector::Previous))?;
//! assert_eq!(previous.found(), Some("3.0.0"));
//! # Ok(())
//! # }
//! ```

mod file;
mod resolver;
mod semantic;

pub use file::FileVersion;
pub use resolver::{
    resolve_file_names, resolve_files, resolve_folder_names, resolve_folders, FileQuery,
    FolderQuery,
};
pub use semantic::SemanticVersion;

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Version explicitly requested by a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedVersion {
    /// Textual version, e.g. `"1.0.0"`, `"1"` or `"v001"`
    Text(String),
    /// Numeric version, e.g. `1` (matches `file.v001.txt` or folder `1.0.0`)
    Number(u64),
}

impl From<&str> for RequestedVersion {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RequestedVersion {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for RequestedVersion {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for RequestedVersion {
    fn from(value: u32) -> Self {
        Self::Number(u64::from(value))
    }
}

impl fmt::Display for RequestedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

/// Which versioned entries to return
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VersionSelector {
    /// Every versioned entry, oldest first
    #[default]
    All,
    /// The newest entry
    Latest,
    /// Alias of [`VersionSelector::Latest`]
    Current,
    /// The oldest entry
    First,
    /// Alias of [`VersionSelector::Latest`]
    Last,
    /// The entry immediately before the newest one
    Previous,
    /// The entry whose version equals the requested one
    Exact(RequestedVersion),
}

impl VersionSelector {
    /// Select an explicit version
    #[must_use]
    pub fn exact(version: impl Into<RequestedVersion>) -> Self {
        Self::Exact(version.into())
    }
}

impl FromStr for VersionSelector {
    type Err = Infallible;

    /// Keywords are matched case-insensitively; anything else is an explicit version
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "all" => Self::All,
            "latest" => Self::Latest,
            "current" => Self::Current,
            "first" => Self::First,
            "last" => Self::Last,
            "previous" => Self::Previous,
            _ => Self::Exact(RequestedVersion::Text(s.trim().to_string())),
        })
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Latest => f.write_str("latest"),
            Self::Current => f.write_str("current"),
            Self::First => f.write_str("first"),
            Self::Last => f.write_str("last"),
            Self::Previous => f.write_str("previous"),
            Self::Exact(version) => write!(f, "{version}"),
        }
    }
}

/// Outcome of a resolution
///
/// Entries are names, or absolute paths rendered as strings when the query
/// asked for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every versioned entry in ascending version order
    All(Vec<String>),
    /// The single entry picked by the selector
    Found(String),
    /// The selector matched nothing
    NotFound,
}

impl Resolution {
    /// Result for a selector when there are no candidates at all
    #[must_use]
    pub fn empty(selector: &VersionSelector) -> Self {
        match selector {
            VersionSelector::All => Self::All(Vec::new()),
            _ => Self::NotFound,
        }
    }

    /// The selected entry, if a single entry was found
    #[must_use]
    pub fn found(&self) -> Option<&str> {
        match self {
            Self::Found(entry) => Some(entry),
            _ => None,
        }
    }

    /// Check for the not-found outcome
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// All entries of the resolution
    ///
    /// `Found` yields one entry, `NotFound` none.
    #[must_use]
    pub fn into_entries(self) -> Vec<String> {
        match self {
            Self::All(entries) => entries,
            Self::Found(entry) => vec![entry],
            Self::NotFound => Vec::new(),
        }
    }

    /// Transform every entry, keeping the shape of the result
    #[must_use]
    pub fn map<F>(self, mut f: F) -> Self
    where
        F: FnMut(String) -> String,
    {
        match self {
            Self::All(entries) => Self::All(entries.into_iter().map(f).collect()),
            Self::Found(entry) => Self::Found(f(entry)),
            Self::NotFound => Self::NotFound,
        }
    }
}
