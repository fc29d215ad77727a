//! Kubernetes API seam
//!
//! The machine never talks to a cluster directly; it lists registered
//! clusters, finds deployments by label and deletes them through this trait.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// A cluster registered with the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubernetesCluster {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl KubernetesCluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Docker registry login used to build image pull secrets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCredential {
    pub url: String,
    pub username: String,
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub cluster: String,
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[async_trait]
pub trait DeploymentClient: Send + Sync {
    async fn clusters(&self) -> Result<Vec<KubernetesCluster>>;

    /// Deployments in `namespace` whose labels include every entry of `selector`
    async fn list_deployments(
        &self,
        cluster: &str,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<Deployment>>;

    async fn delete_deployment(&self, cluster: &str, namespace: &str, name: &str) -> Result<()>;

    async fn registry_credentials(&self) -> Result<Vec<RegistryCredential>>;
}

/// Fixed cluster list with deployments kept in memory
#[derive(Debug, Default)]
pub struct StaticDeploymentClient {
    clusters: Vec<KubernetesCluster>,
    registries: Vec<RegistryCredential>,
    deployments: Mutex<Vec<Deployment>>,
}

impl StaticDeploymentClient {
    pub fn new(clusters: Vec<KubernetesCluster>) -> Self {
        Self {
            clusters,
            ..Self::default()
        }
    }

    pub fn with_registry(mut self, credential: RegistryCredential) -> Self {
        self.registries.push(credential);
        self
    }

    pub fn add_deployment(&self, deployment: Deployment) {
        self.deployments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(deployment);
    }

    pub fn deployments(&self) -> Vec<Deployment> {
        self.deployments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl DeploymentClient for StaticDeploymentClient {
    async fn clusters(&self) -> Result<Vec<KubernetesCluster>> {
        Ok(self.clusters.clone())
    }

    async fn list_deployments(
        &self,
        cluster: &str,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<Deployment>> {
        Ok(self
            .deployments()
            .into_iter()
            .filter(|d| d.cluster == cluster && d.namespace == namespace)
            .filter(|d| selector.iter().all(|(k, v)| d.labels.get(k) == Some(v)))
            .collect())
    }

    async fn delete_deployment(&self, cluster: &str, namespace: &str, name: &str) -> Result<()> {
        let mut deployments = self.deployments.lock().unwrap_or_else(|e| e.into_inner());
        let before = deployments.len();
        deployments.retain(|d| !(d.cluster == cluster && d.namespace == namespace && d.name == name));
        if deployments.len() == before {
            return Err(anyhow!(
                "Deployment {}/{} not found in cluster {}",
                namespace,
                name,
                cluster
            ));
        }
        Ok(())
    }

    async fn registry_credentials(&self) -> Result<Vec<RegistryCredential>> {
        Ok(self.registries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployment(name: &str, branch: &str) -> Deployment {
        Deployment {
            cluster: "k8s-internal".to_string(),
            namespace: "testing".to_string(),
            name: name.to_string(),
            labels: BTreeMap::from([("atomist.com/branch".to_string(), branch.to_string())]),
        }
    }

    #[tokio::test]
    async fn test_list_by_selector() {
        let client = StaticDeploymentClient::new(vec![KubernetesCluster::new("k8s-internal")]);
        client.add_deployment(deployment("widget-feature", "feature"));
        client.add_deployment(deployment("widget-main", "main"));

        let selector = BTreeMap::from([("atomist.com/branch".to_string(), "feature".to_string())]);
        let found = client
            .list_deployments("k8s-internal", "testing", &selector)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "widget-feature");
    }

    #[tokio::test]
    async fn test_delete_missing_fails() {
        let client = StaticDeploymentClient::default();
        assert!(client.delete_deployment("c", "ns", "nope").await.is_err());
    }
}
