use super::{FileEntry, FileSystem, FileType};
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

/// Project snapshot backed by a directory on disk
pub struct RealFileSystem {
    root: PathBuf,
}

impl RealFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl FileSystem for RealFileSystem {
    fn root(&self) -> Option<&Path> {
        Some(&self.root)
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let full = self.resolve(path);
        fs::read_to_string(&full).context(format!("Failed to read file {:?}", full))
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create directory {:?}", parent))?;
        }
        fs::write(&full, content).context(format!("Failed to write file {:?}", full))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let source = self.resolve(from);
        let target = self.resolve(to);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create directory {:?}", parent))?;
        }
        fs::rename(&source, &target)
            .context(format!("Failed to move {:?} to {:?}", source, target))
    }

    fn list_files(&self) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        let has_git_dir = self.root.join(".git").exists();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(has_git_dir)
            .git_global(false)
            .git_exclude(false)
            .filter_entry(|e| e.file_name() != ".git")
            .build();

        for entry in walker {
            let entry = entry.context("Failed to walk project directory")?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .context("Walked outside project root")?
                .to_path_buf();
            entries.push(FileEntry {
                path: relative,
                file_type: FileType::File,
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
