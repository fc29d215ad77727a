//! Obtaining a working copy of a seed repository

use crate::fs::RealFileSystem;
use crate::project::{Project, RepoRef};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

#[async_trait]
pub trait ProjectLoader: Send + Sync {
    /// Working copy of `repo`, narrowed to `repo.path` when set
    async fn load(&self, repo: &RepoRef) -> Result<Project>;
}

fn narrowed(root: PathBuf, repo: &RepoRef) -> PathBuf {
    match repo.path.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => root.join(path),
        None => root,
    }
}

/// Shallow `git clone` into a work directory
pub struct GitCloneLoader {
    work_dir: PathBuf,
}

impl GitCloneLoader {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    fn clone_url(repo: &RepoRef) -> String {
        repo.url
            .clone()
            .unwrap_or_else(|| format!("https://github.com/{}/{}.git", repo.owner, repo.repo))
    }

    async fn git(dir: &Path, args: &[&str]) -> Result<()> {
        debug!(dir = %dir.display(), "git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .await
            .context("Failed to run git")?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectLoader for GitCloneLoader {
    async fn load(&self, repo: &RepoRef) -> Result<Project> {
        let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S%3f");
        let checkout = self.work_dir.join(format!("{}-{}-{}", repo.owner, repo.repo, stamp));
        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.work_dir.display()))?;

        let url = Self::clone_url(repo);
        let target = checkout.to_string_lossy().to_string();
        info!("Cloning {} into {}", url, target);
        match (&repo.sha, &repo.branch) {
            (Some(sha), _) => {
                Self::git(&self.work_dir, &["clone", &url, &target]).await?;
                Self::git(&checkout, &["checkout", sha]).await?;
            }
            (None, Some(branch)) => {
                Self::git(&self.work_dir, &["clone", "--depth", "1", "--branch", branch, &url, &target]).await?;
            }
            (None, None) => {
                Self::git(&self.work_dir, &["clone", "--depth", "1", &url, &target]).await?;
            }
        }

        let root = narrowed(checkout, repo);
        Ok(Project::new(repo.clone(), Arc::new(RealFileSystem::new(root))))
    }
}

/// Seeds that are already checked out under `<root>/<owner>/<repo>`
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ProjectLoader for DirectoryLoader {
    async fn load(&self, repo: &RepoRef) -> Result<Project> {
        let dir = self.root.join(&repo.owner).join(&repo.repo);
        if !dir.is_dir() {
            bail!("No checkout of {} at {}", repo.slug(), dir.display());
        }
        Ok(Project::new(repo.clone(), Arc::new(RealFileSystem::new(narrowed(dir, repo)))))
    }
}
