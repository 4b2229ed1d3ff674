//! Directory wrapper and listing operations
//!
//! This module provides the directory-listing capability used by both the
//! version resolver and the change watcher, plus the handful of directory
//! management helpers (create, rename, remove) the rest of the crate needs.
//!
//! # Module Organization
//!
//! - `paths`: Path string helpers (separator canonicalization, navigating up)
//! - `mod`: `Directory` wrapper and listing operations (this file)
//!
//! # Ordering
//!
//! Every listing is sorted by entry name. Recursive listings are depth-first
//! with each level sorted by name, so `a/z/1.txt` comes before `a/b.txt` only
//! when `z` sorts before `b.txt`. Results are therefore identical across
//! platforms and across repeated calls on an unchanged tree.

mod paths;

pub use paths::{navigate_up, normalize_separators, to_native_separators};

use crate::error::{FsError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Kind of entry a listing should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Folder,
}

/// A directory on the local filesystem
///
/// `Directory` is a thin handle around a path. It does not keep the directory
/// open; every operation goes back to the filesystem, so results always
/// reflect the current state of the tree.
///
/// # Examples
///
/// ```rust,no_run
/// use fskit::directory::Directory;
///
/// # fn main() -> fskit::Result<()> {
/// let dir = Directory::new("/opt/libs/boost");
/// for name in dir.list_folders()? {
///     println!("{name}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    /// Path of the directory
    path: PathBuf,
}

impl Directory {
    /// Create a handle for `path`
    ///
    /// The directory does not need to exist.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the directory
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point this handle at another directory
    pub fn set_directory(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }

    /// Check whether the directory currently exists
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Check whether `path` is an existing directory
    #[must_use]
    pub fn directory_exists(path: &Path) -> bool {
        path.is_dir()
    }

    /// Last component of the directory path
    #[must_use]
    pub fn base_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Create the directory, including missing parents
    ///
    /// # Returns
    ///
    /// Returns `Ok(true)` if the directory was created and `Ok(false)` if it
    /// already existed.
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError)` if the directory (or a parent) cannot be created.
    pub fn create(&self) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }

        fs::create_dir_all(&self.path)
            .map_err(|e| FsError::io_context("Failed to create directory", &self.path, &e))?;
        debug!("Created directory {}", self.path.display());

        Ok(true)
    }

    /// Create a child folder named `name`
    ///
    /// When `enter` is true the handle is moved into the new folder, so that
    /// successive calls build a nested chain (`a`, then `a/b`, ...).
    ///
    /// # Returns
    ///
    /// Returns the absolute path of the created folder.
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError)` if the folder cannot be created.
    pub fn create_folder(&mut self, name: &str, enter: bool) -> Result<PathBuf> {
        let folder = self.path.join(name);
        fs::create_dir_all(&folder)
            .map_err(|e| FsError::io_context("Failed to create folder", &folder, &e))?;

        if enter {
            self.path.clone_from(&folder);
        }

        Ok(folder)
    }

    /// Rename the directory within its parent
    ///
    /// The handle follows the directory to its new location.
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError)` if:
    /// - The directory has no parent (filesystem root)
    /// - The rename fails (target exists, permission denied, ...)
    pub fn rename(&mut self, new_name: &str) -> Result<PathBuf> {
        let parent = self.path.parent().ok_or_else(|| {
            FsError::FileSystem(format!(
                "Cannot rename directory without parent: {}",
                self.path.display()
            ))
        })?;
        let target = parent.join(new_name);

        fs::rename(&self.path, &target)
            .map_err(|e| FsError::io_context("Failed to rename directory", &self.path, &e))?;
        self.path.clone_from(&target);

        Ok(target)
    }

    /// Remove the directory and everything below it
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError)` if the directory does not exist or cannot be
    /// removed.
    pub fn remove(&self) -> Result<()> {
        fs::remove_dir_all(&self.path)
            .map_err(|e| FsError::io_context("Failed to remove directory", &self.path, &e))
    }

    // ========== Immediate children ==========

    /// Names of the immediate child folders, sorted
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::DirectoryNotFound)` if the directory is missing,
    /// or `Err(FsError)` if it cannot be read.
    pub fn list_folders(&self) -> Result<Vec<String>> {
        Ok(self
            .read_children(EntryKind::Folder, None)?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    /// Absolute paths of the immediate child folders, sorted
    ///
    /// # Errors
    ///
    /// Same as [`Directory::list_folders`].
    pub fn list_folders_with_absolute_path(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .read_children(EntryKind::Folder, None)?
            .into_iter()
            .map(|(_, path)| path)
            .collect())
    }

    /// Names of the immediate child files, optionally filtered by extension
    ///
    /// The extension may be given with or without a leading dot.
    ///
    /// # Errors
    ///
    /// Same as [`Directory::list_folders`].
    pub fn list_files(&self, extension: Option<&str>) -> Result<Vec<String>> {
        Ok(self
            .read_children(EntryKind::File, extension)?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    /// Absolute paths of the immediate child files, optionally filtered by extension
    ///
    /// # Errors
    ///
    /// Same as [`Directory::list_folders`].
    pub fn list_files_with_absolute_path(&self, extension: Option<&str>) -> Result<Vec<PathBuf>> {
        Ok(self
            .read_children(EntryKind::File, extension)?
            .into_iter()
            .map(|(_, path)| path)
            .collect())
    }

    // ========== Recursive listings ==========

    /// Absolute paths of every file below the directory, optionally filtered by extension
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::DirectoryNotFound)` if the directory is missing,
    /// or `Err(FsError)` if it cannot be read. Unreadable entries further
    /// down the tree are logged and skipped.
    pub fn list_files_recursively(&self, extension: Option<&str>) -> Result<Vec<PathBuf>> {
        self.walk(EntryKind::File, extension)
    }

    /// Absolute paths of every folder below the directory
    ///
    /// # Errors
    ///
    /// Same as [`Directory::list_files_recursively`].
    pub fn list_directories_recursively(&self) -> Result<Vec<PathBuf>> {
        self.walk(EntryKind::Folder, None)
    }

    fn ensure_exists(&self) -> Result<()> {
        if self.exists() {
            Ok(())
        } else {
            Err(FsError::DirectoryNotFound(self.path.clone()))
        }
    }

    fn read_children(
        &self,
        kind: EntryKind,
        extension: Option<&str>,
    ) -> Result<Vec<(String, PathBuf)>> {
        let entries = fs::read_dir(&self.path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                FsError::DirectoryNotFound(self.path.clone())
            } else {
                FsError::io_context("Failed to read directory", &self.path, &e)
            }
        })?;

        let mut children = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {e}", self.path.display());
                    continue;
                }
            };
            let path = entry.path();

            // Follows symlinks, so a link to a folder counts as a folder
            let matches_kind = match kind {
                EntryKind::File => path.is_file(),
                EntryKind::Folder => path.is_dir(),
            };
            if !matches_kind || !has_extension(&path, extension) {
                continue;
            }

            children.push((entry.file_name().to_string_lossy().into_owned(), path));
        }

        children.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(children)
    }

    fn walk(&self, kind: EntryKind, extension: Option<&str>) -> Result<Vec<PathBuf>> {
        self.ensure_exists()?;

        let mut found = Vec::new();
        for entry in WalkDir::new(&self.path)
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                // Only the root itself is fatal; anything below is skipped
                Err(e) if e.depth() == 0 => {
                    return Err(FsError::FileSystem(format!(
                        "Failed to walk {}: {e}",
                        self.path.display()
                    )));
                }
                Err(e) => {
                    warn!("Skipping unreadable entry below {}: {e}", self.path.display());
                    continue;
                }
            };

            let file_type = entry.file_type();
            let matches_kind = match kind {
                EntryKind::File => file_type.is_file(),
                EntryKind::Folder => file_type.is_dir(),
            };
            if matches_kind && has_extension(entry.path(), extension) {
                found.push(entry.into_path());
            }
        }

        Ok(found)
    }
}

/// Check `path` against an optional extension filter
fn has_extension(path: &Path, extension: Option<&str>) -> bool {
    let Some(wanted) = extension else {
        return true;
    };
    let wanted = wanted.trim_start_matches('.');

    path.extension()
        .is_some_and(|ext| ext.to_string_lossy() == wanted)
}
