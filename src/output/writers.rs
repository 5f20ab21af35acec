//! Index file writers
//!
//! Files are written to a uniquely named sibling temporary file first and
//! renamed into place, so readers never observe a half-written index and
//! concurrent writers of the same path never share a temporary file.

use crate::error::{IndexError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Trait for output writers
pub trait OutputWriter {
    /// Write content to the output destination
    fn write(&self, content: &str) -> Result<()>;
}

/// Writer replacing one file atomically
#[derive(Debug)]
pub struct FileWriter {
    path: PathBuf,
}

impl FileWriter {
    /// Create a new file writer
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the temporary file is created in
    fn temp_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn write_error(&self, source: std::io::Error) -> IndexError {
        IndexError::OutputWrite {
            path: self.path.clone(),
            source,
        }
    }
}

impl OutputWriter for FileWriter {
    fn write(&self, content: &str) -> Result<()> {
        let mut temp = NamedTempFile::new_in(self.temp_dir()).map_err(|e| self.write_error(e))?;
        temp.write_all(content.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| self.write_error(e))?;
        // An unpersisted temporary file is removed when dropped
        temp.persist(&self.path).map_err(|e| self.write_error(e.error))?;

        tracing::debug!("wrote {} ({} bytes)", self.path.display(), content.len());
        Ok(())
    }
}

/// Pretty-printed JSON with a trailing newline
pub fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

/// Serialize `value` as pretty JSON into `path`; returns the bytes written
pub fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<usize> {
    let json = to_pretty_json(value)?;
    FileWriter::new(path).write(&json)?;
    Ok(json.len())
}
