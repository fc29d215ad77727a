//! Project snapshots and push context
//!
//! A [`Project`] is a read/write view of one repository revision. Scanners read
//! it, transforms write to it. Glob matching uses gitignore semantics: a
//! leading `/` anchors to the project root, `**/` matches any depth.

use crate::fs::FileSystem;
use anyhow::{Context, Result};
use ignore::overrides::{Override, OverrideBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifies a repository revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            url: None,
            branch: None,
            sha: None,
            path: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = Some(sha.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// `owner/repo`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// The push that triggered an evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushContext {
    pub repo: RepoRef,
    pub branch: String,
    pub default_branch: String,
    #[serde(default)]
    pub changed_files: Vec<String>,
    /// First push to a newly created repository
    #[serde(default)]
    pub first_push: bool,
}

impl PushContext {
    pub fn new(repo: RepoRef, branch: impl Into<String>, default_branch: impl Into<String>) -> Self {
        Self {
            repo,
            branch: branch.into(),
            default_branch: default_branch.into(),
            changed_files: Vec::new(),
            first_push: false,
        }
    }

    pub fn with_first_push(mut self, first_push: bool) -> Self {
        self.first_push = first_push;
        self
    }

    pub fn with_changed_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changed_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_default_branch(&self) -> bool {
        self.branch == self.default_branch
    }
}

/// A file found in a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub path: PathBuf,
}

impl ProjectFile {
    pub fn name(&self) -> &str {
        self.path.file_name().and_then(|n| n.to_str()).unwrap_or("")
    }

    /// File name without its final extension
    pub fn stem(&self) -> &str {
        self.path.file_stem().and_then(|n| n.to_str()).unwrap_or("")
    }

    pub fn path_str(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }
}

/// Read/write view of a repository snapshot
#[derive(Clone)]
pub struct Project {
    id: RepoRef,
    fs: Arc<dyn FileSystem>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project").field("id", &self.id).finish()
    }
}

impl Project {
    pub fn new(id: RepoRef, fs: Arc<dyn FileSystem>) -> Self {
        Self { id, fs }
    }

    pub fn id(&self) -> &RepoRef {
        &self.id
    }

    /// Same files under another repository identity, as when a seed becomes a new repository
    pub fn rebind(&self, id: RepoRef) -> Project {
        Project {
            id,
            fs: self.fs.clone(),
        }
    }

    /// Repository name, used by transforms that rename project artifacts
    pub fn name(&self) -> &str {
        &self.id.repo
    }

    /// Checkout directory for tools that must run inside the project
    pub fn base_dir(&self) -> Option<&Path> {
        self.fs.root()
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.fs.is_file(Path::new(path))
    }

    /// Content of `path`, or `None` when it does not exist or cannot be read
    pub fn get_file(&self, path: &str) -> Option<String> {
        if !self.has_file(path) {
            return None;
        }
        self.fs.read_to_string(Path::new(path)).ok()
    }

    pub fn read_file(&self, path: &str) -> Result<String> {
        self.fs
            .read_to_string(Path::new(path))
            .with_context(|| format!("Failed to read {} in {}", path, self.id.slug()))
    }

    pub fn add_file(&self, path: &str, content: &str) -> Result<()> {
        self.fs
            .write(Path::new(path), content)
            .with_context(|| format!("Failed to write {} in {}", path, self.id.slug()))
    }

    pub fn move_file(&self, from: &str, to: &str) -> Result<()> {
        self.fs
            .rename(Path::new(from), Path::new(to))
            .with_context(|| format!("Failed to move {} to {} in {}", from, to, self.id.slug()))
    }

    /// All files matching any of `globs`, sorted by path
    pub fn gather(&self, globs: &[&str]) -> Result<Vec<ProjectFile>> {
        let matcher = build_matcher(globs)?;
        let files = self.fs.list_files()?;
        Ok(files
            .into_iter()
            .filter(|entry| entry.is_file() && matcher.matched(&entry.path, false).is_whitelist())
            .map(|entry| ProjectFile { path: entry.path })
            .collect())
    }

    /// First file (in path order) matching any of `globs`
    pub fn first_match(&self, globs: &[&str]) -> Result<Option<ProjectFile>> {
        Ok(self.gather(globs)?.into_iter().next())
    }
}

fn build_matcher(globs: &[&str]) -> Result<Override> {
    let mut builder = OverrideBuilder::new(".");
    for glob in globs {
        builder
            .add(glob)
            .with_context(|| format!("Invalid glob pattern: {}", glob))?;
    }
    builder.build().context("Failed to build glob matcher")
}
