//! Source hosting: topic publishing and repository deletion

use crate::notify::{bold, code_line, url, Action, Message, Notifier};
use crate::pipeline::ProjectAnalysis;
use crate::project::RepoRef;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Request};
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DELETE_REPO_COMMAND: &str = "DeleteRepo";
const TOPICS_ACCEPT: &str = "application/vnd.github.mercy-preview+json";

#[async_trait]
pub trait RepoHosting: Send + Sync {
    /// Replaces the repository's topics
    async fn put_topics(&self, repo: &RepoRef, names: &[String]) -> Result<()>;

    async fn delete_repo(&self, repo: &RepoRef) -> Result<()>;
}

/// GitHub REST API over reqwest
pub struct GitHubHosting {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubHosting {
    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("stackgoals/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn repo_url(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}", self.api_base, repo.owner, repo.repo)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.header("Authorization", format!("token {}", token)),
            None => builder,
        }
    }

    fn topics_request(&self, repo: &RepoRef, names: &[String]) -> Result<Request> {
        let builder = self
            .client
            .put(format!("{}/topics", self.repo_url(repo)))
            .header("Accept", TOPICS_ACCEPT)
            .json(&json!({ "names": names }));
        Ok(self.authorized(builder).build()?)
    }

    fn delete_request(&self, repo: &RepoRef) -> Result<Request> {
        let builder = self.client.delete(self.repo_url(repo));
        Ok(self.authorized(builder).build()?)
    }

    async fn execute(&self, request: Request) -> Result<()> {
        let target = request.url().to_string();
        let response = self
            .client
            .execute(request)
            .await
            .with_context(|| format!("Request to {} failed", target))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("{} returned {}: {}", target, status, body);
        }
        Ok(())
    }
}

#[async_trait]
impl RepoHosting for GitHubHosting {
    async fn put_topics(&self, repo: &RepoRef, names: &[String]) -> Result<()> {
        let request = self.topics_request(repo, names)?;
        self.execute(request).await
    }

    async fn delete_repo(&self, repo: &RepoRef) -> Result<()> {
        let request = self.delete_request(repo)?;
        self.execute(request).await
    }
}

fn repo_link(repo: &RepoRef) -> String {
    repo.url
        .clone()
        .unwrap_or_else(|| format!("https://github.com/{}/{}", repo.owner, repo.repo))
}

/// Element names, without `preferences`, as topics of the repository.
///
/// Failures are logged and otherwise ignored.
pub async fn publish_topics_for_elements(
    hosting: &dyn RepoHosting,
    analysis: &ProjectAnalysis,
    notifier: &dyn Notifier,
) -> Vec<String> {
    let names: Vec<String> = analysis
        .element_names()
        .into_iter()
        .filter(|name| name != "preferences")
        .collect();
    let repo = &analysis.id;

    let published = async {
        hosting.put_topics(repo, &names).await?;
        let topics: Vec<String> = names.iter().map(|n| code_line(n)).collect();
        notifier
            .send(Message::info(
                "Create Project",
                format!(
                    "Published GitHub topics {} for {}",
                    topics.join(", "),
                    bold(&url(&repo_link(repo), Some(&repo.slug())))
                ),
            ))
            .await
    };
    match published.await {
        Ok(()) => {
            info!(repo = %repo.slug(), "Published topics {:?}", names);
            names
        }
        Err(e) => {
            warn!(repo = %repo.slug(), "Failed to publish topics: {:#}", e);
            Vec::new()
        }
    }
}

/// Asks for confirmation before anything is deleted
pub async fn select_repo_to_delete(repo: &RepoRef, notifier: &dyn Notifier) -> Result<()> {
    let link = repo_link(repo);
    notifier
        .send(
            Message::warning(
                "Delete Repository",
                format!("Really delete repo at {}? {}", url(&link, None), bold("Cannot be undone")),
            )
            .with_action(
                Action::button(format!("Delete repo at {}?", link), DELETE_REPO_COMMAND)
                    .with_parameter("owner", &repo.owner)
                    .with_parameter("repo", &repo.repo),
            ),
        )
        .await
}

pub async fn delete_repo(hosting: &dyn RepoHosting, repo: &RepoRef, notifier: &dyn Notifier) -> Result<()> {
    notifier
        .send(Message::info(
            "Delete Repository",
            format!("Deleting {}", bold(&repo.slug())),
        ))
        .await?;
    hosting
        .delete_repo(repo)
        .await
        .with_context(|| format!("Failed to delete {}", repo.slug()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{MessageKind, RecordingNotifier};
    use crate::stack::{ReactStack, ScanOptions, TechnologyElement};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHosting {
        topics: Mutex<Vec<(String, Vec<String>)>>,
        deleted: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl RepoHosting for RecordingHosting {
        async fn put_topics(&self, repo: &RepoRef, names: &[String]) -> Result<()> {
            if self.fail {
                bail!("403 Forbidden");
            }
            self.topics.lock().unwrap().push((repo.slug(), names.to_vec()));
            Ok(())
        }

        async fn delete_repo(&self, repo: &RepoRef) -> Result<()> {
            self.deleted.lock().unwrap().push(repo.slug());
            Ok(())
        }
    }

    fn react_analysis() -> ProjectAnalysis {
        let mut analysis = ProjectAnalysis::new(RepoRef::new("acme", "widget"), ScanOptions::full());
        analysis.add_element(TechnologyElement::React(ReactStack {
            version: Some("16.8.0".to_string()),
        }));
        analysis
    }

    #[tokio::test]
    async fn test_publishes_element_topics() {
        let hosting = RecordingHosting::default();
        let notifier = RecordingNotifier::new();
        let published = publish_topics_for_elements(&hosting, &react_analysis(), &notifier).await;
        assert_eq!(published, vec!["react"]);
        assert_eq!(
            hosting.topics.lock().unwrap()[0],
            ("acme/widget".to_string(), vec!["react".to_string()])
        );
        assert!(notifier.last().unwrap().text.contains("`react`"));
    }

    #[tokio::test]
    async fn test_topic_failure_is_swallowed() {
        let hosting = RecordingHosting {
            fail: true,
            ..RecordingHosting::default()
        };
        let notifier = RecordingNotifier::new();
        let published = publish_topics_for_elements(&hosting, &react_analysis(), &notifier).await;
        assert!(published.is_empty());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let notifier = RecordingNotifier::new();
        let repo = RepoRef::new("acme", "widget");
        select_repo_to_delete(&repo, &notifier).await.unwrap();
        let message = notifier.last().unwrap();
        assert_eq!(message.kind, MessageKind::Warning);
        assert_eq!(message.actions[0].command, DELETE_REPO_COMMAND);
        assert_eq!(message.actions[0].parameters["repo"], "widget");

        let hosting = RecordingHosting::default();
        delete_repo(&hosting, &repo, &notifier).await.unwrap();
        assert_eq!(*hosting.deleted.lock().unwrap(), vec!["acme/widget"]);
    }

    #[test]
    fn test_topics_request_headers() {
        let hosting = GitHubHosting::new("https://api.github.com/", Some("abc".to_string())).unwrap();
        let request = hosting
            .topics_request(&RepoRef::new("acme", "widget"), &["node".to_string()])
            .unwrap();
        assert_eq!(request.method(), reqwest::Method::PUT);
        assert_eq!(request.url().as_str(), "https://api.github.com/repos/acme/widget/topics");
        assert_eq!(request.headers()["Accept"], TOPICS_ACCEPT);
        assert_eq!(request.headers()["Authorization"], "token abc");
    }

    #[test]
    fn test_no_auth_header_without_token() {
        let hosting = GitHubHosting::new(DEFAULT_API_BASE, None).unwrap();
        let request = hosting.delete_request(&RepoRef::new("acme", "widget")).unwrap();
        assert_eq!(request.method(), reqwest::Method::DELETE);
        assert!(request.headers().get("Authorization").is_none());
    }
}
