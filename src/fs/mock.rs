use super::{FileEntry, FileSystem, FileType};
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

/// In-memory project snapshot
pub struct MockFileSystem {
    files: RwLock<BTreeMap<PathBuf, String>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
        }
    }

    /// Build a snapshot from `(path, content)` pairs
    pub fn of<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let fs = Self::new();
        for (path, content) in files {
            fs.add_file(path, content);
        }
        fs
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = normalize_path(path.as_ref());
        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path, content.to_string());
    }

    pub fn file_count(&self) -> usize {
        self.files.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.contains_key(&path) || files.keys().any(|p| p.starts_with(&path))
    }

    fn is_file(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let normalized = normalize_path(path);
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&normalized)
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        self.add_file(path, content);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from_normalized = normalize_path(from);
        let to_normalized = normalize_path(to);
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        let content = files
            .remove(&from_normalized)
            .ok_or_else(|| anyhow!("File not found: {:?}", from))?;
        files.insert(to_normalized, content);
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<FileEntry>> {
        Ok(self
            .files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .map(|path| FileEntry {
                path: path.clone(),
                file_type: FileType::File,
            })
            .collect())
    }
}
