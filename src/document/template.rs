//! Text templates with literal placeholder replacement

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::file::{create_parent, ensure_writable};
use super::File;
use crate::error::{FsError, Result};

/// A template file and the result of filling it in
///
/// Placeholders are plain substrings; [`TemplateFile::replace`] substitutes
/// them one pair at a time, in the order given.
///
/// # Examples
///
/// ```rust,no_run
/// use fskit::document::TemplateFile;
///
/// # fn main() -> fskit::Result<()> {
/// let mut template = TemplateFile::open("/etc/fskit/motd.template")?;
/// template.replace([("{{HOST}}", "build-01"), ("{{USER}}", "ci")]);
/// template.write("/tmp/motd", true)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateFile {
    file: Option<File>,
    content: String,
    replace_data: Vec<(String, String)>,
    replaced_content: Option<String>,
}

impl TemplateFile {
    /// Empty template, not bound to a file
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the template at `path`
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::FileNotFound)` if `path` is not a file, or
    /// `Err(FsError)` if it cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut template = Self::new();
        let path = path.into();
        if !template.set_file(&path)? {
            return Err(FsError::FileNotFound(path));
        }
        Ok(template)
    }

    /// In-memory template, mostly useful for tests and generated templates
    #[must_use]
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Bind to the file at `path` and load its content
    ///
    /// Returns `Ok(false)` and leaves the template unchanged if the file does
    /// not exist. A previous replacement result is discarded.
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError)` if the file exists but cannot be read.
    pub fn set_file(&mut self, path: impl Into<PathBuf>) -> Result<bool> {
        let mut file = self.file.clone().unwrap_or_else(|| File::new(PathBuf::new()));
        if !file.set_file(path) {
            return Ok(false);
        }

        self.content = file.read()?;
        self.file = Some(file);
        self.replace_data.clear();
        self.replaced_content = None;
        Ok(true)
    }

    /// Template file, if one is bound
    #[must_use]
    pub fn file(&self) -> Option<&File> {
        self.file.as_ref()
    }

    /// Raw template text
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Pairs used by the last [`TemplateFile::replace`]
    #[must_use]
    pub fn replace_data(&self) -> &[(String, String)] {
        &self.replace_data
    }

    /// Result of the last replacement
    #[must_use]
    pub fn replaced_content(&self) -> Option<&str> {
        self.replaced_content.as_deref()
    }

    /// Substitute every `(placeholder, value)` pair into the template
    ///
    /// Each pair is applied to the output of the previous one, so a value
    /// containing a later placeholder is replaced again.
    pub fn replace<I, K, V>(&mut self, data: I) -> &str
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.replace_data = data
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        let replaced = self
            .replace_data
            .iter()
            .fold(self.content.clone(), |text, (key, value)| {
                if key.is_empty() {
                    text
                } else {
                    text.replace(key.as_str(), value)
                }
            });

        self.replaced_content.insert(replaced).as_str()
    }

    /// Produce the replaced content with a custom function of the template text
    pub fn replace_with<F>(&mut self, f: F) -> &str
    where
        F: FnOnce(&str) -> String,
    {
        let replaced = f(&self.content);
        self.replaced_content.insert(replaced).as_str()
    }

    /// Write the replaced content (or the raw template if nothing was replaced) to `output`
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::FileAlreadyExists)` if `output` exists and
    /// `overwrite` is false, or `Err(FsError)` if the write fails.
    pub fn write(&self, output: impl AsRef<Path>, overwrite: bool) -> Result<()> {
        let output = output.as_ref();
        ensure_writable(output, overwrite)?;
        create_parent(output)?;

        let text = self.replaced_content.as_deref().unwrap_or(&self.content);
        fs::write(output, text)
            .map_err(|e| FsError::io_context("Failed to write template output", output, &e))?;
        debug!("Wrote template output {}", output.display());
        Ok(())
    }
}
