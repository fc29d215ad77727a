//! Deployment target preferences
//!
//! Maps the `testing` and `production` phases to a cluster and namespace.

use super::store::{PreferenceScope, Preferences};
use crate::k8s::client::DeploymentClient;
use crate::notify::{code_line, italic, Message, Notifier};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

const CLUSTER_REGISTRATION_PREFIX: &str = "@atomist/k8s-sdm_";
const TITLE_CONFIGURE: &str = "Configure Deployment";
const TITLE_SHOW: &str = "Deployment Configuration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentPhase {
    Testing,
    Production,
}

impl DeploymentPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentPhase::Testing => "testing",
            DeploymentPhase::Production => "production",
        }
    }

    pub fn preference_key(&self) -> String {
        format!("k8s.deployment.{}", self.as_str())
    }
}

impl fmt::Display for DeploymentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentPhase {
    type Err = DeploymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "testing" => Ok(DeploymentPhase::Testing),
            "production" => Ok(DeploymentPhase::Production),
            other => Err(DeploymentError::UnknownPhase(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAndNamespace {
    pub cluster: String,
    pub ns: String,
}

impl fmt::Display for ClusterAndNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cluster, self.ns)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testing: Option<ClusterAndNamespace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production: Option<ClusterAndNamespace>,
}

impl DeploymentMapping {
    pub fn get(&self, phase: DeploymentPhase) -> Option<&ClusterAndNamespace> {
        match phase {
            DeploymentPhase::Testing => self.testing.as_ref(),
            DeploymentPhase::Production => self.production.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.testing.is_none() && self.production.is_none()
    }
}

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("No Kubernetes clusters have been registered with this workspace")]
    NoClusters,

    #[error("No Kubernetes cluster '{0}' configured")]
    UnknownCluster(String),

    #[error("Unknown deployment phase '{0}'; expected testing or production")]
    UnknownPhase(String),
}

/// Registration name shortened for display, e.g. `@atomist/k8s-sdm_prod` to `prod`
pub fn cluster_display_name(name: &str) -> String {
    let without_scope = match (name.starts_with('@'), name.find('/')) {
        (true, Some(idx)) => &name[idx + 1..],
        _ => name,
    };
    match without_scope.find('_') {
        Some(idx) => without_scope[idx + 1..].to_string(),
        None => without_scope.to_string(),
    }
}

pub async fn get_deployment_mapping(preferences: &Preferences) -> Result<DeploymentMapping> {
    Ok(DeploymentMapping {
        testing: preferences
            .get(&DeploymentPhase::Testing.preference_key(), PreferenceScope::Sdm)
            .await?,
        production: preferences
            .get(&DeploymentPhase::Production.preference_key(), PreferenceScope::Sdm)
            .await?,
    })
}

/// Validate `cluster` against registered clusters and store the mapping for `phase`
pub async fn configure_deployment(
    preferences: &Preferences,
    client: &dyn DeploymentClient,
    notifier: &dyn Notifier,
    phase: DeploymentPhase,
    cluster: &str,
    ns: &str,
) -> Result<ClusterAndNamespace> {
    let clusters = client.clusters().await?;
    if clusters.is_empty() {
        notifier
            .send(Message::warning(
                TITLE_CONFIGURE,
                format!(
                    "{}.\n\nRegister a Kubernetes cluster before configuring deployments.",
                    DeploymentError::NoClusters
                ),
            ))
            .await?;
        return Err(DeploymentError::NoClusters.into());
    }

    let qualified = format!("{}{}", CLUSTER_REGISTRATION_PREFIX, cluster);
    let Some(found) = clusters
        .iter()
        .find(|c| c.name == cluster || c.name == qualified)
    else {
        notifier
            .send(Message::error(
                TITLE_CONFIGURE,
                format!("No Kubernetes cluster {} configured", code_line(cluster)),
            ))
            .await?;
        return Err(DeploymentError::UnknownCluster(cluster.to_string()).into());
    };

    let target = ClusterAndNamespace {
        cluster: found.name.clone(),
        ns: ns.to_string(),
    };
    preferences
        .put(&phase.preference_key(), &target, PreferenceScope::Sdm)
        .await?;
    info!(phase = %phase, target = %target, "Configured deployment target");

    notifier
        .send(Message::success(
            TITLE_CONFIGURE,
            format!(
                "Successfully configured {} deployments for {}",
                italic(phase.as_str()),
                code_line(&format!("{}:{}", cluster, ns))
            ),
        ))
        .await?;
    Ok(target)
}

pub async fn show_deployment(
    preferences: &Preferences,
    notifier: &dyn Notifier,
    sdm_name: &str,
) -> Result<DeploymentMapping> {
    let mapping = get_deployment_mapping(preferences).await?;
    if mapping.is_empty() {
        notifier
            .send(Message::info(TITLE_SHOW, "No k8s cluster deployment configured"))
            .await?;
        return Ok(mapping);
    }

    let mut lines = Vec::new();
    for phase in [DeploymentPhase::Testing, DeploymentPhase::Production] {
        if let Some(target) = mapping.get(phase) {
            lines.push(format!(
                "{} deployments -> {}",
                code_line(phase.as_str()),
                italic(&target.to_string())
            ));
        }
    }

    notifier
        .send(Message::success(
            TITLE_SHOW,
            format!(
                "The following k8s deployment targets are configured:\n\n{}\n\nRun {} to change this configuration.",
                lines.join("\n"),
                code_line(&format!("configure deployment {}", sdm_name))
            ),
        ))
        .await?;
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::client::{KubernetesCluster, StaticDeploymentClient};
    use crate::notify::{MessageKind, RecordingNotifier};

    fn client() -> StaticDeploymentClient {
        StaticDeploymentClient::new(vec![
            KubernetesCluster::new("@atomist/k8s-sdm_gke-int"),
            KubernetesCluster::new("minikube"),
        ])
    }

    #[test]
    fn test_cluster_display_name() {
        assert_eq!(cluster_display_name("@atomist/k8s-sdm_gke-int"), "gke-int");
        assert_eq!(cluster_display_name("minikube"), "minikube");
    }

    #[tokio::test]
    async fn test_configure_with_suffix() {
        let prefs = Preferences::in_memory();
        let notifier = RecordingNotifier::new();

        let target = configure_deployment(
            &prefs,
            &client(),
            &notifier,
            DeploymentPhase::Testing,
            "gke-int",
            "testing",
        )
        .await
        .unwrap();

        assert_eq!(target.cluster, "@atomist/k8s-sdm_gke-int");
        let mapping = get_deployment_mapping(&prefs).await.unwrap();
        assert_eq!(mapping.testing, Some(target));
        assert!(mapping.production.is_none());
        assert_eq!(
            notifier.last().unwrap().text,
            "Successfully configured _testing_ deployments for `gke-int:testing`"
        );
    }

    #[tokio::test]
    async fn test_unknown_cluster_does_not_mutate() {
        let prefs = Preferences::in_memory();
        let notifier = RecordingNotifier::new();

        let result = configure_deployment(
            &prefs,
            &client(),
            &notifier,
            DeploymentPhase::Production,
            "nope",
            "production",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(notifier.last().unwrap().kind, MessageKind::Error);
        assert!(get_deployment_mapping(&prefs).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_clusters_warns() {
        let prefs = Preferences::in_memory();
        let notifier = RecordingNotifier::new();

        let result = configure_deployment(
            &prefs,
            &StaticDeploymentClient::default(),
            &notifier,
            DeploymentPhase::Testing,
            "minikube",
            "testing",
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeploymentError>(),
            Some(DeploymentError::NoClusters)
        ));
        assert_eq!(notifier.last().unwrap().kind, MessageKind::Warning);
        assert!(get_deployment_mapping(&prefs).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_show_deployment() {
        let prefs = Preferences::in_memory();
        let notifier = RecordingNotifier::new();

        show_deployment(&prefs, &notifier, "stackgoals").await.unwrap();
        assert_eq!(notifier.last().unwrap().text, "No k8s cluster deployment configured");

        configure_deployment(&prefs, &client(), &notifier, DeploymentPhase::Testing, "minikube", "t")
            .await
            .unwrap();
        let mapping = show_deployment(&prefs, &notifier, "stackgoals").await.unwrap();
        assert!(mapping.testing.is_some());
        let text = notifier.last().unwrap().text;
        assert!(text.contains("`testing` deployments -> _minikube:t_"));
        assert!(!text.contains("production"));
    }

    #[test]
    fn test_phase_parsing() {
        assert_eq!("Production".parse::<DeploymentPhase>().unwrap(), DeploymentPhase::Production);
        assert!("staging".parse::<DeploymentPhase>().is_err());
        assert_eq!(DeploymentPhase::Testing.preference_key(), "k8s.deployment.testing");
    }
}
