use serde::{Deserialize, Serialize};
use std::path::Path;

/// Decides whether a push touched anything worth building
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialChangeTest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

impl MaterialChangeTest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions.extend(extensions.iter().map(|e| e.to_string()));
        self
    }

    pub fn with_directories(mut self, directories: &[&str]) -> Self {
        self.directories.extend(directories.iter().map(|d| d.to_string()));
        self
    }

    pub fn with_files(mut self, files: &[&str]) -> Self {
        self.files.extend(files.iter().map(|f| f.to_string()));
        self
    }

    pub fn matches_path(&self, path: &str) -> bool {
        let p = Path::new(path);
        let extension = p.extension().and_then(|e| e.to_str());
        let file_name = p.file_name().and_then(|n| n.to_str());

        if let Some(extension) = extension {
            if self.extensions.iter().any(|e| e == extension) {
                return true;
            }
        }
        if self
            .directories
            .iter()
            .any(|d| path.starts_with(&format!("{}/", d.trim_end_matches('/'))))
        {
            return true;
        }
        self.files
            .iter()
            .any(|f| f == path || Some(f.as_str()) == file_name)
    }

    /// Whether any of `changed_files` is material
    pub fn is_material(&self, changed_files: &[String]) -> bool {
        changed_files.iter().any(|f| self.matches_path(f))
    }
}
