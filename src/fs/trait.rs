//! FileSystem trait definition
//!
//! All paths are relative to the root of the project snapshot being analyzed.

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
}

/// A file entry returned by `list_files`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub file_type: FileType,
}

impl FileEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        self.path.file_name().and_then(|n| n.to_str()).unwrap_or("")
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }
}

/// Abstraction over project snapshot operations for testability
pub trait FileSystem: Send + Sync {
    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Create or overwrite a file, creating parent directories as needed
    fn write(&self, path: &Path, content: &str) -> Result<()>;

    /// Move a file to a new path
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// All files in the snapshot, sorted by path
    fn list_files(&self) -> Result<Vec<FileEntry>>;

    /// Directory on disk backing the snapshot, if any
    fn root(&self) -> Option<&Path> {
        None
    }
}
