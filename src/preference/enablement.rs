//! Per-organization and per-repository machine enablement
//!
//! The effective state for a push is the repository state if set, else the
//! organization state if set, else the configured default.

use super::store::{PreferenceScope, Preferences};
use crate::notify::{bold, code_line, italic, Message, Notifier};
use crate::project::RepoRef;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnablementState {
    Enabled,
    Disabled,
}

impl EnablementState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, EnablementState::Enabled)
    }

    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            EnablementState::Enabled
        } else {
            EnablementState::Disabled
        }
    }
}

impl fmt::Display for EnablementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnablementState::Enabled => write!(f, "enabled"),
            EnablementState::Disabled => write!(f, "disabled"),
        }
    }
}

impl FromStr for EnablementState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "enabled" | "enable" | "true" | "on" => Ok(EnablementState::Enabled),
            "disabled" | "disable" | "false" | "off" => Ok(EnablementState::Disabled),
            other => Err(format!("unknown enablement state '{}'", other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum EnablementError {
    #[error("Goal '{goal}' is not optional; optional goals are: {available}")]
    UnknownGoal { goal: String, available: String },
}

/// Repo wins over org, org wins over the default
pub fn resolve_enablement(
    repo: Option<EnablementState>,
    org: Option<EnablementState>,
    default_state: EnablementState,
) -> EnablementState {
    repo.or(org).unwrap_or(default_state)
}

pub fn org_enablement_key(owner: &str) -> String {
    format!("{}:enablement_state", owner)
}

pub fn repo_enablement_key(owner: &str, repo: &str) -> String {
    format!("{}/{}:enablement_state", owner, repo)
}

pub fn goal_enablement_key(goal: &str) -> String {
    format!("{}:enabled", goal)
}

/// An organization, or one repository within it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnablementTarget {
    pub owner: String,
    pub repo: Option<String>,
}

impl EnablementTarget {
    pub fn org(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: None,
        }
    }

    pub fn repo(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: Some(repo.into()),
        }
    }

    pub fn slug(&self) -> String {
        match &self.repo {
            Some(repo) => format!("{}/{}", self.owner, repo),
            None => self.owner.clone(),
        }
    }

    fn key(&self) -> String {
        match &self.repo {
            Some(repo) => repo_enablement_key(&self.owner, repo),
            None => org_enablement_key(&self.owner),
        }
    }
}

/// Reads and writes enablement state
#[derive(Debug, Clone)]
pub struct Enablement {
    preferences: Preferences,
    default_state: EnablementState,
}

impl Enablement {
    pub fn new(preferences: Preferences, default_state: EnablementState) -> Self {
        Self {
            preferences,
            default_state,
        }
    }

    pub async fn stored_state(&self, target: &EnablementTarget) -> Result<Option<EnablementState>> {
        self.preferences.get(&target.key(), PreferenceScope::Sdm).await
    }

    pub async fn effective_state(&self, repo: &RepoRef) -> Result<EnablementState> {
        let repo_state = self
            .stored_state(&EnablementTarget::repo(&repo.owner, &repo.repo))
            .await?;
        let org_state = self.stored_state(&EnablementTarget::org(&repo.owner)).await?;
        let state = resolve_enablement(repo_state, org_state, self.default_state);
        debug!(
            repo = %repo.slug(),
            repo_state = ?repo_state,
            org_state = ?org_state,
            effective = %state,
            "Resolved enablement"
        );
        Ok(state)
    }

    pub async fn is_sdm_enabled(&self, repo: &RepoRef) -> Result<bool> {
        Ok(self.effective_state(repo).await?.is_enabled())
    }

    pub async fn is_sdm_disabled(&self, repo: &RepoRef) -> Result<bool> {
        Ok(!self.is_sdm_enabled(repo).await?)
    }

    /// Store the state and tell the user
    pub async fn toggle(
        &self,
        target: &EnablementTarget,
        opt_in: bool,
        sdm_name: &str,
        notifier: &dyn Notifier,
    ) -> Result<()> {
        let state = EnablementState::from_flag(opt_in);
        self.preferences
            .put(&target.key(), &state, PreferenceScope::Sdm)
            .await?;
        info!(target = %target.slug(), state = %state, "Updated enablement");

        let message = if opt_in {
            Message::success(
                "Enable SDM",
                format!(
                    "Successfully enabled {} for {}",
                    code_line(sdm_name),
                    bold(&target.slug())
                ),
            )
        } else {
            Message::warning(
                "Disable SDM",
                format!(
                    "Successfully disabled {} for {}",
                    code_line(sdm_name),
                    bold(&target.slug())
                ),
            )
        };
        notifier.send(message).await
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }
}

/// Whether an optional goal has been switched on; unset means disabled
pub async fn is_goal_enabled(preferences: &Preferences, goal: &str) -> Result<bool> {
    Ok(preferences
        .get::<bool>(&goal_enablement_key(goal), PreferenceScope::Sdm)
        .await?
        .unwrap_or(false))
}

pub async fn toggle_goal_enablement(
    preferences: &Preferences,
    optional_goals: &[String],
    goal: &str,
    opt_in: bool,
    notifier: &dyn Notifier,
) -> Result<()> {
    if !optional_goals.iter().any(|g| g == goal) {
        let error = EnablementError::UnknownGoal {
            goal: goal.to_string(),
            available: optional_goals.join(", "),
        };
        notifier
            .send(Message::error(
                if opt_in { "Enable Goal" } else { "Disable Goal" },
                error.to_string(),
            ))
            .await?;
        return Err(error.into());
    }

    preferences
        .put(&goal_enablement_key(goal), &opt_in, PreferenceScope::Sdm)
        .await?;

    let message = if opt_in {
        Message::success("Enable Goal", format!("Successfully enabled {} goal", italic(goal)))
    } else {
        Message::warning("Disable Goal", format!("Successfully disabled {} goal", italic(goal)))
    };
    notifier.send(message).await
}
