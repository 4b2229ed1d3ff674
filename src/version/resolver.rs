//! Filtering, ordering and selection of versioned entries
//!
//! Resolution always runs in three steps:
//!
//! 1. keep only version-shaped names (see [`FolderQuery`] for the folder rules,
//!    [`FileVersion`] for the file rule);
//! 2. sort ascending by version, ties broken by name so the order is total;
//! 3. apply the [`VersionSelector`].
//!
//! The `*_names` functions work on a caller-supplied candidate list and never
//! touch the filesystem. [`resolve_folders`] and [`resolve_files`] list a
//! directory first. A missing directory is never an error: it resolves to an
//! empty result, after creating the directory when `create_path` is set.

use super::{FileVersion, RequestedVersion, Resolution, SemanticVersion, VersionSelector};
use crate::directory::Directory;
use crate::error::{FsError, Result};
use std::path::Path;
use tracing::{debug, trace};

// ============================================================================
// QUERIES
// ============================================================================

/// Options for resolving version-named folders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderQuery {
    /// Which entries to return
    pub selector: VersionSelector,
    /// Return absolute paths instead of bare folder names
    pub absolute_path: bool,
    /// Only accept strict numeric tuples with a consistent segment count
    ///
    /// The segment count is fixed by the first valid name in listing order;
    /// names with a different count are skipped.
    pub semantic_only: bool,
    /// Skip names that fail lenient parsing instead of failing the call
    ///
    /// Only consulted when `semantic_only` is false.
    pub ignore: bool,
    /// Create the directory when it does not exist
    pub create_path: bool,
}

impl FolderQuery {
    /// Query with the given selector and default options
    ///
    /// Defaults: bare names, semantic-only filtering, ignore malformed names,
    /// no directory creation.
    #[must_use]
    pub fn new(selector: VersionSelector) -> Self {
        Self {
            selector,
            absolute_path: false,
            semantic_only: true,
            ignore: true,
            create_path: false,
        }
    }

    /// Return absolute paths
    #[must_use]
    pub fn absolute_path(mut self, absolute_path: bool) -> Self {
        self.absolute_path = absolute_path;
        self
    }

    /// Toggle semantic-only filtering
    #[must_use]
    pub fn semantic_only(mut self, semantic_only: bool) -> Self {
        self.semantic_only = semantic_only;
        self
    }

    /// Toggle skipping of malformed names in lenient mode
    #[must_use]
    pub fn ignore(mut self, ignore: bool) -> Self {
        self.ignore = ignore;
        self
    }

    /// Toggle creation of a missing directory
    #[must_use]
    pub fn create_path(mut self, create_path: bool) -> Self {
        self.create_path = create_path;
        self
    }
}

impl Default for FolderQuery {
    fn default() -> Self {
        Self::new(VersionSelector::All)
    }
}

/// Options for resolving `name.v###.ext` files
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileQuery {
    /// Which entries to return
    pub selector: VersionSelector,
    /// Return absolute paths instead of bare file names
    pub absolute_path: bool,
    /// Create the directory when it does not exist
    pub create_path: bool,
}

impl FileQuery {
    /// Query with the given selector and default options
    #[must_use]
    pub fn new(selector: VersionSelector) -> Self {
        Self {
            selector,
            absolute_path: false,
            create_path: false,
        }
    }

    /// Return absolute paths
    #[must_use]
    pub fn absolute_path(mut self, absolute_path: bool) -> Self {
        self.absolute_path = absolute_path;
        self
    }

    /// Toggle creation of a missing directory
    #[must_use]
    pub fn create_path(mut self, create_path: bool) -> Self {
        self.create_path = create_path;
        self
    }
}

// ============================================================================
// CANDIDATE LISTS
// ============================================================================

/// Resolve version-named folders from a list of candidate names
///
/// # Errors
///
/// Returns `Err(FsError::MalformedVersionName)` when `semantic_only` and
/// `ignore` are both false and a name does not parse as a version.
pub fn resolve_folder_names<I, S>(names: I, query: &FolderQuery) -> Result<Resolution>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut versioned = Vec::new();
    let mut expected_segments = None;

    for name in names {
        let name = name.as_ref();

        if query.semantic_only {
            let Ok(version) = SemanticVersion::parse_strict(name) else {
                trace!("Skipping non-semantic folder '{name}'");
                continue;
            };
            let expected = *expected_segments.get_or_insert(version.segment_count());
            if version.segment_count() != expected {
                trace!("Skipping folder '{name}': expected {expected} version segments");
                continue;
            }
            versioned.push((version, name.to_string()));
        } else {
            match SemanticVersion::parse_lenient(name) {
                Ok(version) => versioned.push((version, name.to_string())),
                Err(err) if query.ignore => debug!("Ignoring folder: {err}"),
                Err(err) => return Err(err),
            }
        }
    }

    let requested = match &query.selector {
        VersionSelector::Exact(RequestedVersion::Text(text)) => {
            SemanticVersion::parse_lenient(text).ok()
        }
        VersionSelector::Exact(RequestedVersion::Number(number)) => {
            SemanticVersion::from_components(vec![*number])
        }
        _ => None,
    };

    Ok(select(versioned, &query.selector, requested.as_ref()))
}

/// Resolve `name.v###.ext` files from a list of candidate names
///
/// Names without a version marker are skipped. An explicit request matches on
/// the integer value, so `1`, `"1"`, `"001"` and `"v001"` all select
/// `file.v001.txt`.
#[must_use]
pub fn resolve_file_names<I, S>(names: I, selector: &VersionSelector) -> Resolution
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let versioned: Vec<_> = names
        .into_iter()
        .filter_map(|name| {
            let name = name.as_ref();
            FileVersion::from_file_name(name).map(|version| (version.number(), name.to_string()))
        })
        .collect();

    let requested = match selector {
        VersionSelector::Exact(RequestedVersion::Text(text)) => {
            FileVersion::parse_request(text).map(|version| version.number())
        }
        VersionSelector::Exact(RequestedVersion::Number(number)) => Some(*number),
        _ => None,
    };

    select(versioned, selector, requested.as_ref())
}

/// Order `entries` and apply `selector`
///
/// `requested` is the parsed explicit version; `None` for an explicit selector
/// means the request itself was unparseable and nothing can match.
fn select<K: Ord>(
    mut entries: Vec<(K, String)>,
    selector: &VersionSelector,
    requested: Option<&K>,
) -> Resolution {
    entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let picked = match selector {
        VersionSelector::All => {
            return Resolution::All(entries.into_iter().map(|(_, name)| name).collect());
        }
        VersionSelector::Latest | VersionSelector::Current | VersionSelector::Last => {
            entries.pop()
        }
        VersionSelector::First => entries.into_iter().next(),
        VersionSelector::Previous => {
            let len = entries.len();
            if len < 2 {
                None
            } else {
                Some(entries.swap_remove(len - 2))
            }
        }
        VersionSelector::Exact(_) => requested.and_then(|wanted| {
            entries
                .into_iter()
                .find(|(version, _)| version.cmp(wanted).is_eq())
        }),
    };

    picked.map_or(Resolution::NotFound, |(_, name)| Resolution::Found(name))
}

// ============================================================================
// DIRECTORIES
// ============================================================================

/// Resolve version-named child folders of `directory`
///
/// # Errors
///
/// Returns `Err(FsError)` if:
/// - The directory exists but cannot be listed
/// - `create_path` is set and the directory cannot be created
/// - Strict lenient-mode parsing fails (see [`resolve_folder_names`])
pub fn resolve_folders(directory: &Path, query: &FolderQuery) -> Result<Resolution> {
    if !prepare_directory(directory, query.create_path)? {
        return Ok(Resolution::empty(&query.selector));
    }

    let names = match Directory::new(directory).list_folders() {
        Ok(names) => names,
        Err(FsError::DirectoryNotFound(_)) => return Ok(Resolution::empty(&query.selector)),
        Err(err) => return Err(err),
    };
    debug!(
        "Resolving '{}' among {} folders in {}",
        query.selector,
        names.len(),
        directory.display()
    );

    let resolution = resolve_folder_names(&names, query)?;
    Ok(absolutize(resolution, directory, query.absolute_path))
}

/// Resolve `name.v###.ext` files directly inside `directory`
///
/// # Errors
///
/// Returns `Err(FsError)` if:
/// - The directory exists but cannot be listed
/// - `create_path` is set and the directory cannot be created
pub fn resolve_files(directory: &Path, query: &FileQuery) -> Result<Resolution> {
    if !prepare_directory(directory, query.create_path)? {
        return Ok(Resolution::empty(&query.selector));
    }

    let names = match Directory::new(directory).list_files(None) {
        Ok(names) => names,
        Err(FsError::DirectoryNotFound(_)) => return Ok(Resolution::empty(&query.selector)),
        Err(err) => return Err(err),
    };
    debug!(
        "Resolving '{}' among {} files in {}",
        query.selector,
        names.len(),
        directory.display()
    );

    let resolution = resolve_file_names(&names, &query.selector);
    Ok(absolutize(resolution, directory, query.absolute_path))
}

impl Directory {
    /// Resolve version-named child folders of this directory
    ///
    /// # Errors
    ///
    /// See [`resolve_folders`].
    pub fn list_versioned_folders(&self, query: &FolderQuery) -> Result<Resolution> {
        resolve_folders(self.path(), query)
    }

    /// Resolve `name.v###.ext` files in this directory
    ///
    /// # Errors
    ///
    /// See [`resolve_files`].
    pub fn list_versioned_files(&self, query: &FileQuery) -> Result<Resolution> {
        resolve_files(self.path(), query)
    }
}

/// Returns whether the directory exists and should be listed
fn prepare_directory(directory: &Path, create_path: bool) -> Result<bool> {
    if directory.is_dir() {
        return Ok(true);
    }

    if create_path {
        Directory::new(directory).create()?;
        debug!("Created missing version directory {}", directory.display());
    } else {
        debug!("Version directory {} does not exist", directory.display());
    }

    Ok(false)
}

fn absolutize(resolution: Resolution, directory: &Path, absolute_path: bool) -> Resolution {
    if !absolute_path {
        return resolution;
    }
    resolution.map(|name| directory.join(name).to_string_lossy().into_owned())
}
