//! Single-file wrappers
//!
//! # Module Organization
//!
//! - `file`: [`File`], a path plus cached metadata with read/write/copy/rename
//! - `json_file`: [`JsonFile`], a file holding one `serde_json::Value`
//! - `template`: [`TemplateFile`], literal placeholder replacement into an output file

mod file;
mod json_file;
mod template;

pub use file::File;
pub use json_file::JsonFile;
pub use template::TemplateFile;
