//! Seeds registered for an organization, stored as a workspace preference

use super::loader::ProjectLoader;
use super::params::{SeedDrivenCommandParams, SeedError};
use super::selected_repo::{GitUrl, SelectedRepo, SelectedRepoSource};
use crate::notify::{italic, url, Action, Attachment, Message, Notifier};
use crate::pipeline::ProjectAnalyzer;
use crate::preference::{PreferenceScope, Preferences};
use crate::project::Project;
use crate::stack::{ScanContext, ScanOptions};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const SEEDS_KEY: &str = "seeds";
pub const ADD_SEED_COMMAND: &str = "AddSeed";
pub const REMOVE_SEED_COMMAND: &str = "RemoveSeed";
const SEEDS_TITLE: &str = "Seeds";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Seeds {
    #[serde(default)]
    seeds: Vec<SelectedRepo>,
}

async fn load_seeds(preferences: &Preferences) -> Result<Seeds> {
    Ok(preferences
        .get::<Seeds>(SEEDS_KEY, PreferenceScope::Workspace)
        .await?
        .unwrap_or_default())
}

/// Carries the whole identity of the seed so that `remove` can match it
fn remove_button(seed: &SelectedRepo) -> Action {
    let mut action = Action::button("Remove Seed", REMOVE_SEED_COMMAND).with_parameter("seedUrl", &seed.url);
    if let Some(git_ref) = &seed.git_ref {
        action = action.with_parameter("ref", git_ref);
    }
    if let Some(path) = &seed.path {
        action = action.with_parameter("path", path);
    }
    action
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

pub struct SeedRegistry {
    preferences: Preferences,
    notifier: Arc<dyn Notifier>,
}

impl SeedRegistry {
    pub fn new(preferences: Preferences, notifier: Arc<dyn Notifier>) -> Self {
        Self { preferences, notifier }
    }

    pub async fn seeds(&self) -> Result<Vec<SelectedRepo>> {
        Ok(load_seeds(&self.preferences).await?.seeds)
    }

    /// Sends the registered seeds with add and remove buttons
    pub async fn list(&self) -> Result<Vec<SelectedRepo>> {
        let seeds = self.seeds().await?;
        let mut message = Message::info(
            SEEDS_TITLE,
            format!(
                "You have {} seed project{} registered in your organization",
                seeds.len(),
                plural(seeds.len())
            ),
        )
        .with_action(Action::button("Add Seed", ADD_SEED_COMMAND));
        for seed in &seeds {
            message = message.with_attachment(Attachment {
                text: seed.description.clone(),
                fallback: seed.description.clone(),
                footer: Some(url(&seed.url, None)),
                actions: vec![remove_button(seed)],
            });
        }
        self.notifier.send(message).await?;
        Ok(seeds)
    }

    /// Registers without validating; a seed with the same url, ref and path is rejected
    pub async fn add(&self, seed: SelectedRepo) -> Result<()> {
        let mut seeds = load_seeds(&self.preferences).await?;
        if seeds
            .seeds
            .iter()
            .any(|s| s.is_same_seed(&seed.url, seed.git_ref.as_deref(), seed.path.as_deref()))
        {
            let err = SeedError::AlreadyRegistered(seed.url.clone());
            self.notifier.send(Message::error(SEEDS_TITLE, err.to_string())).await?;
            return Err(err.into());
        }
        let text = format!(
            "Successfully added seed project {} from {}",
            italic(&seed.description),
            url(&seed.url, None)
        );
        info!(seed = %seed.url, "Registering seed");
        seeds.seeds.push(seed);
        self.preferences
            .put(SEEDS_KEY, &seeds, PreferenceScope::Workspace)
            .await?;
        self.notifier.send(Message::success(SEEDS_TITLE, text)).await
    }

    /// Validates the seed first; nothing is stored when validation fails
    pub async fn add_validated(
        &self,
        analyzer: &ProjectAnalyzer,
        loader: &dyn ProjectLoader,
        ctx: &ScanContext,
        params: &SeedDrivenCommandParams,
        description: &str,
    ) -> Result<()> {
        validate_seed(analyzer, loader, ctx, params, self.notifier.as_ref()).await?;
        let mut seed = SelectedRepo::new(&params.seed_url, description);
        seed.git_ref = params.git_ref.clone().filter(|r| !r.is_empty());
        seed.path = params.path.clone().filter(|p| !p.is_empty());
        self.add(seed).await
    }

    /// Removes only the seed matching url, ref and path together
    pub async fn remove(&self, params: &SeedDrivenCommandParams) -> Result<()> {
        let mut seeds = load_seeds(&self.preferences).await?;
        let before = seeds.seeds.len();
        seeds
            .seeds
            .retain(|seed| !seed.is_same_seed(&params.seed_url, params.git_ref.as_deref(), params.path.as_deref()));
        if seeds.seeds.len() == before {
            warn!(seed = %params.seed_url, "No registered seed matched");
            let err = SeedError::NotRegistered(params.seed_url.clone());
            self.notifier.send(Message::error(SEEDS_TITLE, err.to_string())).await?;
            return Err(err.into());
        }
        self.preferences
            .put(SEEDS_KEY, &seeds, PreferenceScope::Workspace)
            .await?;
        self.notifier
            .send(Message::success(
                SEEDS_TITLE,
                format!("Successfully removed seed project from {}", url(&params.seed_url, None)),
            ))
            .await
    }

    pub fn source(&self) -> PreferencesSeedSource {
        PreferencesSeedSource::new(self.preferences.clone())
    }
}

/// Loads and fully analyzes a candidate seed; only usable Node projects pass
pub async fn validate_seed(
    analyzer: &ProjectAnalyzer,
    loader: &dyn ProjectLoader,
    ctx: &ScanContext,
    params: &SeedDrivenCommandParams,
    notifier: &dyn Notifier,
) -> Result<Project> {
    if let Err(e) = params.validate() {
        notifier.send(Message::error(SEEDS_TITLE, e.to_string())).await?;
        return Err(e.into());
    }
    let repo = params.to_repo_ref()?;
    let project = loader.load(&repo).await?;
    let analysis = analyzer.analyze(&project, ctx, ScanOptions::full()).await?;
    if analysis.is_usable_as_seed() && analysis.node().is_some() {
        return Ok(project);
    }

    let text = format!(
        "Seed at {} is not usable as a seed repo: Only Node seeds are presently supported",
        url(&params.seed_url, None)
    );
    notifier.send(Message::plain(format!(":no_entry: {}", text))).await?;
    notifier.send(Message::error(SEEDS_TITLE, text)).await?;
    Err(SeedError::NotUsable(params.seed_url.clone()).into())
}

/// Seeds registered in the organization's preferences
pub struct PreferencesSeedSource {
    preferences: Preferences,
}

impl PreferencesSeedSource {
    pub fn new(preferences: Preferences) -> Self {
        Self { preferences }
    }
}

#[async_trait]
impl SelectedRepoSource for PreferencesSeedSource {
    fn description(&self) -> &str {
        "Seeds from your organization"
    }

    async fn find(&self) -> Result<Vec<SelectedRepo>> {
        Ok(load_seeds(&self.preferences).await?.seeds)
    }
}

/// One attachment per seed with a button invoking `command`
pub fn selected_repo_attachments(seeds: &[SelectedRepo], command: &str) -> Vec<Attachment> {
    seeds
        .iter()
        .map(|seed| {
            let name = GitUrl::parse(&seed.url)
                .map(|g| g.name)
                .unwrap_or_else(|| seed.url.clone());
            Attachment {
                text: format!("{} - {}", italic(&seed.description), seed.url),
                fallback: seed.url.clone(),
                footer: None,
                actions: vec![Action::button(format!("Create from {}", name), command).with_parameter("seedUrl", &seed.url)],
            }
        })
        .collect()
}

/// Lists seeds from each source in order, at most `to_show` per source
pub async fn select_seed(
    sources: &[Arc<dyn SelectedRepoSource>],
    generator_command: &str,
    to_show: usize,
    notifier: &dyn Notifier,
) -> Result<()> {
    for source in sources {
        let caption = italic(source.description());
        notifier.send(Message::plain(caption.clone())).await?;
        let seeds = source.find().await?;
        if seeds.is_empty() {
            notifier.send(Message::plain("No repos to show")).await?;
            continue;
        }
        let message = selected_repo_attachments(&seeds, generator_command)
            .into_iter()
            .take(to_show)
            .fold(Message::plain(caption), Message::with_attachment);
        notifier.send(message).await?;
    }
    Ok(())
}
