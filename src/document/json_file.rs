//! JSON document backed by a file

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use super::File;
use crate::error::{FsError, Result};

/// A file holding one JSON value
///
/// The value lives in memory between [`JsonFile::read`] and
/// [`JsonFile::write`]; nothing is parsed or serialized implicitly.
#[derive(Debug, Clone)]
pub struct JsonFile {
    file: File,
    content: Value,
}

impl JsonFile {
    /// Handle to `path` with `null` content
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: File::new(path),
            content: Value::Null,
        }
    }

    /// Create an empty file at `path`
    ///
    /// # Errors
    ///
    /// Same as [`File::create`].
    pub fn create(path: impl Into<PathBuf>, overwrite: bool) -> Result<Self> {
        Ok(Self {
            file: File::create(path, overwrite)?,
            content: Value::Null,
        })
    }

    /// Point at another existing file; false if it does not exist
    pub fn set_file(&mut self, path: impl Into<PathBuf>) -> bool {
        self.file.set_file(path)
    }

    /// Underlying file handle
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Path of the underlying file
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// In-memory JSON value
    #[must_use]
    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Replace the in-memory value; nothing is written until [`JsonFile::write`]
    pub fn set_content(&mut self, content: Value) {
        self.content = content;
    }

    /// Serialize the content into the file
    ///
    /// `None` writes compact JSON, `Some(n)` pretty-prints with `n` spaces
    /// per level.
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError)` if serialization or the write fails.
    pub fn write(&self, indent: Option<usize>) -> Result<()> {
        let text = match indent {
            None => serde_json::to_string(&self.content).map_err(|e| self.json_error(&e))?,
            Some(width) => {
                let indent = " ".repeat(width);
                let mut buffer = Vec::new();
                let formatter = PrettyFormatter::with_indent(indent.as_bytes());
                let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
                self.content
                    .serialize(&mut serializer)
                    .map_err(|e| self.json_error(&e))?;
                String::from_utf8(buffer)
                    .map_err(|e| FsError::InvalidJson(format!("{}: {e}", self.path().display())))?
            }
        };
        self.file.write(&text)
    }

    /// Parse the file and keep the result as the content
    ///
    /// # Errors
    ///
    /// Returns `Err(FsError::FileNotFound)` if the file is missing, or
    /// `Err(FsError::InvalidJson)` if it does not hold valid JSON.
    pub fn read(&mut self) -> Result<&Value> {
        let text = self.file.read()?;
        self.content = serde_json::from_str(&text).map_err(|e| self.json_error(&e))?;
        Ok(&self.content)
    }

    /// Parse the file straight into `T`
    ///
    /// # Errors
    ///
    /// Same as [`JsonFile::read`], plus `Err(FsError::InvalidJson)` if the
    /// JSON does not match `T`.
    pub fn read_as<T: DeserializeOwned>(&self) -> Result<T> {
        let text = self.file.read()?;
        serde_json::from_str(&text).map_err(|e| self.json_error(&e))
    }

    /// Replace the content with `value` and write it out
    ///
    /// # Errors
    ///
    /// Same as [`JsonFile::write`].
    pub fn write_value<T: Serialize>(&mut self, value: &T, indent: Option<usize>) -> Result<()> {
        self.content = serde_json::to_value(value).map_err(|e| self.json_error(&e))?;
        self.write(indent)
    }

    fn json_error(&self, err: &serde_json::Error) -> FsError {
        FsError::InvalidJson(format!("{}: {err}", self.path().display()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use tempfile::TempDir;

    fn fixture() -> anyhow::Result<(TempDir, JsonFile)> {
        let temp = TempDir::new()?;
        let file = JsonFile::create(temp.path().join("testFile.json"), false)?;
        Ok((temp, file))
    }

    #[test]
    fn test_set_file() -> anyhow::Result<()> {
        let (_temp, mut file) = fixture()?;
        let path = file.path().to_path_buf();

        assert!(file.set_file(&path));
        std::fs::remove_file(&path)?;
        assert!(!file.set_file(&path));
        Ok(())
    }

    #[test]
    fn test_write_then_read() -> anyhow::Result<()> {
        let (_temp, mut file) = fixture()?;
        let data = json!([{"attr": "value"}]);

        file.set_content(data.clone());
        file.write(None)?;
        assert_eq!(file.file().read()?, r#"[{"attr":"value"}]"#);

        file.set_content(Value::Null);
        assert_eq!(file.read()?, &data);
        assert_eq!(file.content(), &data);
        Ok(())
    }

    #[test]
    fn test_indented_write() -> anyhow::Result<()> {
        let (_temp, mut file) = fixture()?;

        file.set_content(json!({"a": 1}));
        file.write(Some(4))?;

        assert_eq!(file.file().read()?, "{\n    \"a\": 1\n}");
        Ok(())
    }

    #[test]
    fn test_typed_round_trip() -> anyhow::Result<()> {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Package {
            name: String,
            versions: Vec<String>,
        }

        let (_temp, mut file) = fixture()?;
        let package = Package {
            name: "boost".to_string(),
            versions: vec!["1.66.0".to_string(), "1.70.0".to_string()],
        };

        file.write_value(&package, Some(2))?;
        assert_eq!(file.read_as::<Package>()?, package);
        assert_eq!(file.content()["name"], "boost");
        Ok(())
    }

    #[test]
    fn test_invalid_json() -> anyhow::Result<()> {
        let (_temp, mut file) = fixture()?;

        file.file().write("{not json")?;
        assert!(matches!(file.read(), Err(FsError::InvalidJson(_))));

        file.file().write("")?;
        assert!(matches!(file.read(), Err(FsError::InvalidJson(_))));
        Ok(())
    }
}
