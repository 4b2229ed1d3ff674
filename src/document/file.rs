//! Single-file handle with cached metadata

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use filetime::FileTime;
use tracing::debug;

use crate::error::{FsError, Result};

/// Handle to one file on disk
///
/// The handle only stores the path and the metadata seen by the last
/// [`File::update`]; every content operation goes straight to disk.
///
/// # Examples
///
/// ```rust,no_run
/// use fskit::document::File;
///
/// # fn main() -> fskit::Result<()> {
/// let file = File::create("/tmp/fskit/notes.txt", true)?;
/// file.write("hello\n")?;
/// assert_eq!(file.read()?, "hello\n");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
    metadata: Option<fs::Metadata>,
}

impl File {
    /// Handle to `path` without touching the filesystem
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            metadata: None,
        }
    }

    /// Handle to an existing file
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::FileNotFound)` if `path` is not a file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut file = Self::new(path);
        if !file.update() {
            return Err(FsError::FileNotFound(file.path));
        }
        Ok(file)
    }

    /// Create an empty file, creating missing parent directories
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::FileAlreadyExists)` if the file exists and
    /// `overwrite` is false, or `Err(FsError)` if it cannot be written.
    pub fn create(path: impl Into<PathBuf>, overwrite: bool) -> Result<Self> {
        let mut file = Self::new(path);
        ensure_writable(&file.path, overwrite)?;
        create_parent(&file.path)?;

        fs::write(&file.path, "")
            .map_err(|e| FsError::io_context("Failed to create file", &file.path, &e))?;
        debug!("Created file {}", file.path.display());

        file.update();
        Ok(file)
    }

    /// Point the handle at another file
    ///
    /// Returns false and leaves the handle unchanged if `path` is not a file.
    pub fn set_file(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if !Self::file_exists(&path) {
            return false;
        }
        self.path = path;
        self.update()
    }

    /// Check whether `path` is an existing file
    #[must_use]
    pub fn file_exists(path: &Path) -> bool {
        path.is_file()
    }

    /// Check whether the handled file exists
    #[must_use]
    pub fn exists(&self) -> bool {
        Self::file_exists(&self.path)
    }

    /// Refresh cached metadata; false if the file is gone
    pub fn update(&mut self) -> bool {
        self.metadata = fs::metadata(&self.path).ok().filter(fs::Metadata::is_file);
        self.metadata.is_some()
    }

    // ========== Path accessors ==========

    /// Path of the file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the file
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// File name without its extension
    #[must_use]
    pub fn base_name(&self) -> Option<String> {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    }

    /// Extension without the leading dot
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
    }

    /// File size from the cached metadata, 0 if unknown
    #[must_use]
    pub fn size(&self) -> u64 {
        self.metadata.as_ref().map_or(0, fs::Metadata::len)
    }

    /// Modification time from the cached metadata
    #[must_use]
    pub fn modified(&self) -> Option<SystemTime> {
        self.metadata.as_ref().and_then(|m| m.modified().ok())
    }

    // ========== Content ==========

    /// Read the whole file as UTF-8
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::FileNotFound)` if the file is missing, or
    /// `Err(FsError)` if it cannot be read.
    pub fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| self.io_error("Failed to read", &e))
    }

    /// Read the file as lines, each keeping its trailing newline
    ///
    /// # Errors
    ///
    /// Same as [`File::read`].
    pub fn read_lines(&self) -> Result<Vec<String>> {
        Ok(self
            .read()?
            .split_inclusive('\n')
            .map(str::to_string)
            .collect())
    }

    /// Replace the file's content
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError)` if the file cannot be written.
    pub fn write(&self, content: &str) -> Result<()> {
        fs::write(&self.path, content).map_err(|e| self.io_error("Failed to write", &e))
    }

    /// Replace the file's content with `lines` written back to back
    ///
    /// No separator is inserted; include line endings in the items.
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError)` if the file cannot be written.
    pub fn write_lines<I, S>(&self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let content: String = lines.into_iter().map(|line| line.as_ref().to_string()).collect();
        self.write(&content)
    }

    // ========== Filesystem operations ==========

    /// Copy the file to `destination`
    ///
    /// # Returns
    ///
    /// The destination path.
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::FileAlreadyExists)` if `destination` exists and
    /// `overwrite` is false, or `Err(FsError)` if the copy fails.
    pub fn copy(&self, destination: impl AsRef<Path>, overwrite: bool) -> Result<PathBuf> {
        let destination = destination.as_ref();
        ensure_writable(destination, overwrite)?;
        create_parent(destination)?;

        fs::copy(&self.path, destination).map_err(|e| self.io_error("Failed to copy", &e))?;
        debug!("Copied {} to {}", self.path.display(), destination.display());
        Ok(destination.to_path_buf())
    }

    /// Copy the file into `directory`, keeping its name
    ///
    /// # Errors
    ///
    /// Same as [`File::copy`].
    pub fn copy_to_path(&self, directory: impl AsRef<Path>, overwrite: bool) -> Result<PathBuf> {
        let name = self
            .path
            .file_name()
            .ok_or_else(|| FsError::FileSystem(format!("No file name in {}", self.path.display())))?;
        self.copy(directory.as_ref().join(name), overwrite)
    }

    /// Rename the file within its directory and follow it
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::FileAlreadyExists)` if the new name is taken, or
    /// `Err(FsError)` if the rename fails.
    pub fn rename(&mut self, new_name: &str) -> Result<PathBuf> {
        let target = self.directory().join(new_name);
        ensure_writable(&target, false)?;

        fs::rename(&self.path, &target).map_err(|e| self.io_error("Failed to rename", &e))?;
        debug!("Renamed {} to {}", self.path.display(), target.display());

        self.path = target;
        self.update();
        Ok(self.path.clone())
    }

    /// Delete the file
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::FileNotFound)` if the file is missing, or
    /// `Err(FsError)` if it cannot be removed.
    pub fn remove(&mut self) -> Result<()> {
        fs::remove_file(&self.path).map_err(|e| self.io_error("Failed to remove", &e))?;
        self.metadata = None;
        Ok(())
    }

    /// Set the modification time to now, creating the file if needed
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError)` if the file cannot be created or stamped.
    pub fn touch(&mut self) -> Result<()> {
        if !self.exists() {
            create_parent(&self.path)?;
            fs::write(&self.path, "").map_err(|e| self.io_error("Failed to create", &e))?;
        }
        filetime::set_file_mtime(&self.path, FileTime::now())
            .map_err(|e| self.io_error("Failed to set modification time of", &e))?;
        self.update();
        Ok(())
    }

    fn io_error(&self, action: &str, err: &std::io::Error) -> FsError {
        if err.kind() == ErrorKind::NotFound {
            FsError::FileNotFound(self.path.clone())
        } else {
            FsError::io_context(action, &self.path, err)
        }
    }
}

/// Fail with `FileAlreadyExists` when `target` is taken and may not be replaced
pub(crate) fn ensure_writable(target: &Path, overwrite: bool) -> Result<()> {
    if target.is_file() && !overwrite {
        return Err(FsError::FileAlreadyExists(target.to_path_buf()));
    }
    Ok(())
}

/// Create the parent directories of `path` if they are missing
pub(crate) fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            fs::create_dir_all(parent)
                .map_err(|e| FsError::io_context("Failed to create directory", parent, &e))
        }
        _ => Ok(()),
    }
}
