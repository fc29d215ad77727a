//! Repositories of interest, mostly generator seeds

use crate::transform::CodeTransform;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use url::Url;

#[derive(Clone, Serialize, Deserialize)]
pub struct SelectedRepo {
    /// e.g. `https://github.com/my-org/my-node-seed`
    pub url: String,
    /// Branch or sha
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    /// Path within the repo; `None` or empty means the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub description: String,
    /// Applied when the repo is used as a seed
    #[serde(skip)]
    pub transform: Option<Arc<dyn CodeTransform>>,
}

impl SelectedRepo {
    pub fn new(url: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            git_ref: None,
            path: None,
            description: description.into(),
            transform: None,
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

    pub fn with_transform(mut self, transform: Arc<dyn CodeTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Seeds are identified by url, ref and path together
    pub fn is_same_seed(&self, url: &str, git_ref: Option<&str>, path: Option<&str>) -> bool {
        self.url == url && self.git_ref.as_deref() == git_ref && self.path.as_deref() == path
    }
}

impl fmt::Debug for SelectedRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedRepo")
            .field("url", &self.url)
            .field("ref", &self.git_ref)
            .field("path", &self.path)
            .field("description", &self.description)
            .field("transform", &self.transform.as_ref().map(|t| t.name().to_string()))
            .finish()
    }
}

impl PartialEq for SelectedRepo {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_seed(&other.url, other.git_ref.as_deref(), other.path.as_deref())
            && self.description == other.description
    }
}

/// Owner and repository parsed from an https or scp-style git URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitUrl {
    pub host: String,
    pub owner: String,
    pub name: String,
    /// Path after `/tree/<branch>/` or `/blob/<branch>/`
    pub filepath: Option<String>,
}

impl GitUrl {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix("git@") {
            let (host, path) = rest.split_once(':')?;
            return Self::from_segments(host, path.split('/').collect());
        }
        let url = Url::parse(raw).ok()?;
        let host = url.host_str()?.to_string();
        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        Self::from_segments(&host, segments)
    }

    fn from_segments(host: &str, segments: Vec<&str>) -> Option<Self> {
        let owner = segments.first()?;
        let name = segments.get(1)?.trim_end_matches(".git");
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        let filepath = match segments.get(2) {
            Some(&"tree") | Some(&"blob") if segments.len() > 4 => Some(segments[4..].join("/")),
            _ => None,
        };
        Some(Self {
            host: host.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
            filepath,
        })
    }
}

/// Somewhere seeds can be listed from
#[async_trait]
pub trait SelectedRepoSource: Send + Sync {
    fn description(&self) -> &str;

    async fn find(&self) -> Result<Vec<SelectedRepo>>;
}

/// A fixed list of seeds
pub struct StaticSeedSource {
    description: String,
    seeds: Vec<SelectedRepo>,
}

impl StaticSeedSource {
    pub fn new(description: impl Into<String>, seeds: Vec<SelectedRepo>) -> Self {
        Self {
            description: description.into(),
            seeds,
        }
    }

    /// The built-in Node seeds
    pub fn global() -> Self {
        Self::new("Global seeds", default_seeds())
    }
}

#[async_trait]
impl SelectedRepoSource for StaticSeedSource {
    fn description(&self) -> &str {
        &self.description
    }

    async fn find(&self) -> Result<Vec<SelectedRepo>> {
        Ok(self.seeds.clone())
    }
}

pub fn default_seeds() -> Vec<SelectedRepo> {
    vec![
        SelectedRepo::new(
            "https://github.com/sahat/hackathon-starter",
            "Node boilerplate (Hackathon starter)",
        ),
        SelectedRepo::new(
            "https://github.com/kimjuny/koa-react-universal",
            "Lightweight React-Koa2 universal boilerplate",
        ),
        SelectedRepo::new(
            "https://github.com/developit/express-es6-rest-api",
            "ES6 RESTful Express API",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https_url() {
        let parsed = GitUrl::parse("https://github.com/acme/node-seed.git").unwrap();
        assert_eq!(parsed.owner, "acme");
        assert_eq!(parsed.name, "node-seed");
        assert_eq!(parsed.host, "github.com");
        assert_eq!(parsed.filepath, None);
    }

    #[test]
    fn test_parse_tree_url_with_path() {
        let parsed = GitUrl::parse("https://github.com/acme/monorepo/tree/main/seeds/node").unwrap();
        assert_eq!(parsed.name, "monorepo");
        assert_eq!(parsed.filepath.as_deref(), Some("seeds/node"));
    }

    #[test]
    fn test_parse_scp_url() {
        let parsed = GitUrl::parse("git@github.com:acme/node-seed.git").unwrap();
        assert_eq!(parsed.host, "github.com");
        assert_eq!(parsed.owner, "acme");
        assert_eq!(parsed.name, "node-seed");
    }

    #[test]
    fn test_parse_rejects_non_repo_urls() {
        assert!(GitUrl::parse("https://github.com/acme").is_none());
        assert!(GitUrl::parse("not a url").is_none());
    }

    #[test]
    fn test_seed_identity_includes_ref_and_path() {
        let seed = SelectedRepo::new("https://github.com/acme/seed", "Seed").with_ref("v2");
        assert!(seed.is_same_seed("https://github.com/acme/seed", Some("v2"), None));
        assert!(!seed.is_same_seed("https://github.com/acme/seed", None, None));
    }

    #[test]
    fn test_serialized_ref_name() {
        let seed = SelectedRepo::new("https://github.com/acme/seed", "Seed").with_ref("main");
        let json = serde_json::to_value(&seed).unwrap();
        assert_eq!(json["ref"], "main");
        assert!(json.get("path").is_none());
        let back: SelectedRepo = serde_json::from_value(json).unwrap();
        assert_eq!(back, seed);
    }

    #[tokio::test]
    async fn test_global_source() {
        let source = StaticSeedSource::global();
        assert_eq!(source.find().await.unwrap().len(), 3);
    }
}
