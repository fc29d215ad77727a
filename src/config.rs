//! Machine configuration
//!
//! Settings load from environment variables with defaults through
//! [`MachineConfig::from_env`]; [`MachineConfig::default`] gives the defaults
//! alone.
//!
//! # Environment Variables
//!
//! - `STACKGOALS_NAME`: Machine name - default: "stackgoals"
//! - `STACKGOALS_WORKSPACE_ID`: Workspace identifier, used for namespaces and routes
//! - `STACKGOALS_ENVIRONMENT`: Deployment environment - default: "sdm"
//! - `STACKGOALS_DEFAULT_ENABLEMENT`: `enabled|disabled` - default: "disabled"
//! - `STACKGOALS_EXTENDED_GOALS`: `any|default-branch` - default: "any"
//! - `STACKGOALS_OPTIONAL_GOALS`: Comma separated goal names that must be opted into
//! - `STACKGOALS_EPHEMERAL_DEPLOYMENTS`: Deploy non-default branches temporarily - default: "false"
//! - `STACKGOALS_PREFERENCES_PATH`: Preferences file - default: user config dir
//! - `STACKGOALS_K8S_CLUSTERS`: Comma separated `name=url` (or bare `name`) clusters
//! - `STACKGOALS_LOG_LEVEL`: Logging level - default: "info"
//! - `STACKGOALS_GITHUB_API`: GitHub API base - default: "https://api.github.com"
//! - `GITHUB_TOKEN`: Token for GitHub API calls

use crate::github::DEFAULT_API_BASE;
use crate::k8s::KubernetesCluster;
use crate::preference::EnablementState;
use crate::project::PushContext;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_NAME: &str = "stackgoals";
const DEFAULT_ENVIRONMENT: &str = "sdm";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error("Workspace id not configured. Set STACKGOALS_WORKSPACE_ID")]
    MissingWorkspaceId,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Which pushes get goals beyond the checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtendedGoals {
    #[default]
    Any,
    DefaultBranch,
}

impl ExtendedGoals {
    pub fn admits(&self, push: &PushContext) -> bool {
        match self {
            ExtendedGoals::Any => true,
            ExtendedGoals::DefaultBranch => push.is_default_branch(),
        }
    }
}

impl FromStr for ExtendedGoals {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" => Ok(ExtendedGoals::Any),
            "default-branch" | "default_branch" => Ok(ExtendedGoals::DefaultBranch),
            other => Err(format!("unknown policy '{}'; expected any or default-branch", other)),
        }
    }
}

impl fmt::Display for ExtendedGoals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtendedGoals::Any => write!(f, "any"),
            ExtendedGoals::DefaultBranch => write!(f, "default-branch"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MachineConfig {
    pub name: String,
    pub workspace_id: Option<String>,
    pub environment: String,
    pub default_enablement: EnablementState,
    pub extended_goals: ExtendedGoals,
    /// Goals planned only after being enabled
    pub optional_goals: Vec<String>,
    pub ephemeral_deployments: bool,
    pub preferences_path: Option<PathBuf>,
    pub k8s_clusters: Vec<KubernetesCluster>,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    pub github_api: String,
    pub github_token: Option<String>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            workspace_id: None,
            environment: DEFAULT_ENVIRONMENT.to_string(),
            default_enablement: EnablementState::Disabled,
            extended_goals: ExtendedGoals::Any,
            optional_goals: Vec::new(),
            ephemeral_deployments: false,
            preferences_path: None,
            k8s_clusters: Vec::new(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            github_api: DEFAULT_API_BASE.to_string(),
            github_token: None,
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: fmt::Display,
{
    var(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::ParseError {
                field: key.to_string(),
                error: e.to_string(),
            })
        })
        .transpose()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// `name=url` entries; a bare name registers a cluster without a URL
pub fn parse_clusters(raw: &str) -> Vec<KubernetesCluster> {
    split_list(raw)
        .into_iter()
        .map(|entry| match entry.split_once('=') {
            Some((name, url)) => KubernetesCluster::new(name.trim()).with_url(url.trim()),
            None => KubernetesCluster::new(entry),
        })
        .collect()
}

impl MachineConfig {
    /// Defaults overridden by whatever `STACKGOALS_*` variables are set
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            name: var("STACKGOALS_NAME").unwrap_or(defaults.name),
            workspace_id: var("STACKGOALS_WORKSPACE_ID"),
            environment: var("STACKGOALS_ENVIRONMENT").unwrap_or(defaults.environment),
            default_enablement: parse_var("STACKGOALS_DEFAULT_ENABLEMENT")?.unwrap_or(defaults.default_enablement),
            extended_goals: parse_var("STACKGOALS_EXTENDED_GOALS")?.unwrap_or(defaults.extended_goals),
            optional_goals: var("STACKGOALS_OPTIONAL_GOALS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            ephemeral_deployments: parse_var("STACKGOALS_EPHEMERAL_DEPLOYMENTS")?
                .unwrap_or(defaults.ephemeral_deployments),
            preferences_path: var("STACKGOALS_PREFERENCES_PATH").map(PathBuf::from),
            k8s_clusters: var("STACKGOALS_K8S_CLUSTERS")
                .map(|raw| parse_clusters(&raw))
                .unwrap_or_default(),
            log_level: var("STACKGOALS_LOG_LEVEL")
                .map(|l| l.to_lowercase())
                .unwrap_or(defaults.log_level),
            github_api: var("STACKGOALS_GITHUB_API").unwrap_or(defaults.github_api),
            github_token: var("GITHUB_TOKEN"),
        })
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any validation fails
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("Machine name must not be empty".to_string()));
        }

        if let Some(id) = &self.workspace_id {
            if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid workspace id: {}. Only letters, digits, '-' and '_' are allowed",
                    id
                )));
            }
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        if let Err(e) = url::Url::parse(&self.github_api) {
            return Err(ConfigError::ParseError {
                field: "STACKGOALS_GITHUB_API".to_string(),
                error: e.to_string(),
            });
        }

        if let Some(cluster) = self.k8s_clusters.iter().find(|c| c.name.is_empty()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Kubernetes cluster with URL {:?} has no name",
                cluster.url
            )));
        }
        Ok(())
    }

    pub fn require_workspace_id(&self) -> Result<&str, ConfigError> {
        self.workspace_id.as_deref().ok_or(ConfigError::MissingWorkspaceId)
    }

    pub fn is_optional_goal(&self, goal: &str) -> bool {
        self.optional_goals.iter().any(|g| g == goal)
    }
}

impl fmt::Display for MachineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Machine Configuration:")?;
        writeln!(f, "  Name: {}", self.name)?;
        writeln!(f, "  Workspace: {}", self.workspace_id.as_deref().unwrap_or("(unset)"))?;
        writeln!(f, "  Environment: {}", self.environment)?;
        writeln!(f, "  Default Enablement: {}", self.default_enablement)?;
        writeln!(f, "  Extended Goals: {}", self.extended_goals)?;
        if !self.optional_goals.is_empty() {
            writeln!(f, "  Optional Goals: {}", self.optional_goals.join(", "))?;
        }
        writeln!(f, "  Ephemeral Deployments: {}", self.ephemeral_deployments)?;
        if let Some(ref path) = self.preferences_path {
            writeln!(f, "  Preferences: {}", path.display())?;
        }
        for cluster in &self.k8s_clusters {
            writeln!(f, "  Cluster: {}", cluster.name)?;
        }
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  GitHub API: {}", self.github_api)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::RepoRef;
    use serial_test::serial;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(value) => env::set_var(&self.key, value),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    fn test_defaults() {
        let config = MachineConfig::default();
        assert_eq!(config.name, "stackgoals");
        assert_eq!(config.environment, "sdm");
        assert_eq!(config.default_enablement, EnablementState::Disabled);
        assert_eq!(config.extended_goals, ExtendedGoals::Any);
        assert!(!config.ephemeral_deployments);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let _g1 = EnvGuard::set("STACKGOALS_WORKSPACE_ID", "T123");
        let _g2 = EnvGuard::set("STACKGOALS_DEFAULT_ENABLEMENT", "enabled");
        let _g3 = EnvGuard::set("STACKGOALS_EXTENDED_GOALS", "default-branch");
        let _g4 = EnvGuard::set("STACKGOALS_OPTIONAL_GOALS", "production, tag");
        let _g5 = EnvGuard::set("STACKGOALS_K8S_CLUSTERS", "gke=https://35.1.2.3,minikube");
        let _g6 = EnvGuard::set("STACKGOALS_LOG_LEVEL", "DEBUG");

        let config = MachineConfig::from_env().unwrap();
        assert_eq!(config.require_workspace_id().unwrap(), "T123");
        assert_eq!(config.default_enablement, EnablementState::Enabled);
        assert_eq!(config.extended_goals, ExtendedGoals::DefaultBranch);
        assert_eq!(config.optional_goals, vec!["production", "tag"]);
        assert!(config.is_optional_goal("tag"));
        assert_eq!(config.k8s_clusters.len(), 2);
        assert_eq!(config.k8s_clusters[0].url.as_deref(), Some("https://35.1.2.3"));
        assert_eq!(config.k8s_clusters[1].url, None);
        assert_eq!(config.log_level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_invalid_policy_is_a_parse_error() {
        let _g = EnvGuard::set("STACKGOALS_EXTENDED_GOALS", "sometimes");
        let err = MachineConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { ref field, .. } if field == "STACKGOALS_EXTENDED_GOALS"));
    }

    #[test]
    #[serial]
    fn test_missing_workspace_id() {
        let _g = EnvGuard::set("STACKGOALS_WORKSPACE_ID", "");
        let config = MachineConfig::from_env().unwrap();
        assert_eq!(config.require_workspace_id(), Err(ConfigError::MissingWorkspaceId));
    }

    #[test]
    fn test_validation_failures() {
        let config = MachineConfig {
            log_level: "loud".to_string(),
            ..MachineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MachineConfig {
            workspace_id: Some("T 123".to_string()),
            ..MachineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MachineConfig {
            github_api: "not a url".to_string(),
            ..MachineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_extended_goals_policy() {
        let feature = PushContext::new(RepoRef::new("acme", "widget"), "feature", "main");
        let main = PushContext::new(RepoRef::new("acme", "widget"), "main", "main");
        assert!(ExtendedGoals::Any.admits(&feature));
        assert!(!ExtendedGoals::DefaultBranch.admits(&feature));
        assert!(ExtendedGoals::DefaultBranch.admits(&main));
    }

    #[test]
    fn test_config_display() {
        let display = format!("{}", MachineConfig::default());
        assert!(display.contains("Machine Configuration:"));
        assert!(display.contains("Extended Goals: any"));
    }
}
