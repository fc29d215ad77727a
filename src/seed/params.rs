//! Parameters shared by the seed-driven commands

use super::selected_repo::{GitUrl, SelectedRepo};
use crate::project::RepoRef;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Branch name or sha
pub const REF_PATTERN: &str = r"^\w(?:[./]?[-\w])*$";
/// Relative path inside a repository
pub const PATH_PATTERN: &str = r"^([\w$]+/?)+$";
/// A GitHub URL typed in by hand, https or scp-style
pub const FREE_TEXT_SEED_URL_PATTERN: &str = r"(git@|https?://)[^:/]+[:/][^\s^.]+";

const DROP_DOWN_DESCRIPTION_MAX: usize = 72;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("'{0}' is not a valid seed URL; expected a GitHub URL, such as https://github.com/myorg/myrepo")]
    InvalidSeedUrl(String),

    #[error("'{0}' is not a valid git branch name or sha")]
    InvalidRef(String),

    #[error("'{0}' is not a valid path within a repository")]
    InvalidPath(String),

    #[error("Seed at {0} is not usable as a seed repo: Only Node seeds are presently supported")]
    NotUsable(String),

    #[error("Seed project {0} is already registered")]
    AlreadyRegistered(String),

    #[error("No seed project registered from {0}")]
    NotRegistered(String),

    #[error("Parameter '{name}' is required")]
    MissingParameter { name: String },

    #[error("Value '{value}' is not valid for parameter '{name}'")]
    InvalidParameter { name: String, value: String },
}

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("valid regex"))
}

fn ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    pattern(&PATTERN, REF_PATTERN)
}

fn path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    pattern(&PATTERN, PATH_PATTERN)
}

fn seed_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    pattern(&PATTERN, FREE_TEXT_SEED_URL_PATTERN)
}

/// A full 40 character hex sha
pub fn is_valid_sha1(s: &str) -> bool {
    s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDrivenCommandParams {
    pub seed_url: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl SeedDrivenCommandParams {
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            git_ref: None,
            path: None,
        }
    }

    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = Some(git_ref.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Empty ref and path count as absent
    pub fn validate(&self) -> Result<(), SeedError> {
        if !seed_url_pattern().is_match(&self.seed_url) {
            return Err(SeedError::InvalidSeedUrl(self.seed_url.clone()));
        }
        if let Some(git_ref) = self.git_ref.as_deref().filter(|r| !r.is_empty()) {
            if !ref_pattern().is_match(git_ref) {
                return Err(SeedError::InvalidRef(git_ref.to_string()));
            }
        }
        if let Some(path) = self.path.as_deref().filter(|p| !p.is_empty()) {
            if !path_pattern().is_match(path) {
                return Err(SeedError::InvalidPath(path.to_string()));
            }
        }
        Ok(())
    }

    /// Repository reference for the seed; a full sha pins the commit, anything else names a branch
    pub fn to_repo_ref(&self) -> Result<RepoRef, SeedError> {
        let git_url =
            GitUrl::parse(&self.seed_url).ok_or_else(|| SeedError::InvalidSeedUrl(self.seed_url.clone()))?;
        let mut repo = RepoRef::new(git_url.owner, git_url.name).with_url(self.seed_url.clone());
        repo.path = self.path.clone().filter(|p| !p.is_empty());
        match self.git_ref.as_deref().filter(|r| !r.is_empty()) {
            Some(sha) if is_valid_sha1(sha) => Ok(repo.with_sha(sha)),
            Some(branch) => Ok(repo.with_branch(branch)),
            None => Ok(repo),
        }
    }
}

/// One entry of a seed drop-down
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropDownOption {
    pub value: String,
    pub description: String,
}

/// Truncate to `max` characters, ending in `...` when cut
pub fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Drop-down options for a fixed seed list; seeds without a parseable URL are left out
pub fn drop_down_seed_options(seeds: &[SelectedRepo]) -> Vec<DropDownOption> {
    seeds
        .iter()
        .filter_map(|seed| {
            let git_url = GitUrl::parse(&seed.url)?;
            Some(DropDownOption {
                value: seed.url.clone(),
                description: format!(
                    "{}: {}/{}",
                    shorten(&seed.description, DROP_DOWN_DESCRIPTION_MAX),
                    git_url.owner,
                    git_url.name
                ),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA: &str = "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3";

    #[test]
    fn test_branch_ref() {
        let repo = SeedDrivenCommandParams::new("https://github.com/acme/seed")
            .with_ref("feature/x")
            .to_repo_ref()
            .unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.repo, "seed");
        assert_eq!(repo.branch.as_deref(), Some("feature/x"));
        assert_eq!(repo.sha, None);
    }

    #[test]
    fn test_sha_ref() {
        let repo = SeedDrivenCommandParams::new("https://github.com/acme/seed")
            .with_ref(SHA)
            .to_repo_ref()
            .unwrap();
        assert_eq!(repo.sha.as_deref(), Some(SHA));
        assert_eq!(repo.branch, None);
    }

    #[test]
    fn test_no_ref_and_path() {
        let repo = SeedDrivenCommandParams::new("git@github.com:acme/seed.git")
            .with_path("packages/api")
            .to_repo_ref()
            .unwrap();
        assert_eq!(repo.repo, "seed");
        assert_eq!(repo.branch, None);
        assert_eq!(repo.sha, None);
        assert_eq!(repo.path.as_deref(), Some("packages/api"));
    }

    #[test]
    fn test_validation() {
        assert!(SeedDrivenCommandParams::new("https://github.com/acme/seed").validate().is_ok());
        assert_eq!(
            SeedDrivenCommandParams::new("github.com/acme/seed").validate(),
            Err(SeedError::InvalidSeedUrl("github.com/acme/seed".to_string()))
        );
        assert_eq!(
            SeedDrivenCommandParams::new("https://github.com/acme/seed")
                .with_ref("bad ref")
                .validate(),
            Err(SeedError::InvalidRef("bad ref".to_string()))
        );
        assert_eq!(
            SeedDrivenCommandParams::new("https://github.com/acme/seed")
                .with_path("../etc")
                .validate(),
            Err(SeedError::InvalidPath("../etc".to_string()))
        );
        assert!(SeedDrivenCommandParams::new("https://github.com/acme/seed")
            .with_ref("release/1.2")
            .with_path("seeds/node/")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_is_valid_sha1() {
        assert!(is_valid_sha1(SHA));
        assert!(!is_valid_sha1("master"));
        assert!(!is_valid_sha1(&SHA[..39]));
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("short", 72), "short");
        let long = "x".repeat(80);
        let shortened = shorten(&long, 72);
        assert_eq!(shortened.len(), 72);
        assert!(shortened.ends_with("..."));
    }

    #[test]
    fn test_drop_down_options() {
        let seeds = vec![
            SelectedRepo::new("https://github.com/acme/node-seed", "Node seed"),
            SelectedRepo::new("nonsense", "Broken"),
        ];
        assert_eq!(
            drop_down_seed_options(&seeds),
            vec![DropDownOption {
                value: "https://github.com/acme/node-seed".to_string(),
                description: "Node seed: acme/node-seed".to_string(),
            }]
        );
    }
}
