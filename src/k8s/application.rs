//! Application data for Kubernetes deploy goals

use super::client::DeploymentClient;
use super::manifests::{image_pull_secret, Secret, IMAGE_PULL_SECRET_NAME};
use super::namespace::valid_name;
use crate::preference::ClusterAndNamespace;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use url::{Host, Url};

const REWRITE_TARGET_ANNOTATION: &str = "nginx.ingress.kubernetes.io/rewrite-target";

/// Ingress host and path for an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRoute {
    pub host: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Everything a deploy goal needs to render manifests for one application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesApplication {
    pub workspace_id: String,
    pub name: String,
    pub ns: String,
    pub cluster: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<HostRoute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<Secret>,
}

/// Route derived from the cluster API URL.
///
/// An IP address host yields a `nip.io` wildcard name served at `/`; a
/// domain host yields `<workspace>-<ns>.<host>` with the application under
/// `/<name>` and a rewrite annotation.
pub fn derive_route(cluster_url: &str, name: &str, ns: &str, workspace_id: &str) -> Option<HostRoute> {
    let url = Url::parse(cluster_url).ok()?;
    match url.host()? {
        Host::Ipv4(ip) => Some(HostRoute {
            host: format!("{}.{}.{}.nip.io", name, ns, ip),
            path: "/".to_string(),
            annotations: BTreeMap::new(),
        }),
        Host::Ipv6(_) => None,
        Host::Domain(domain) => Some(HostRoute {
            host: format!("{}-{}.{}", workspace_id, ns, domain).to_lowercase(),
            path: format!("/{}", name),
            annotations: BTreeMap::from([(REWRITE_TARGET_ANNOTATION.to_string(), "/".to_string())]),
        }),
    }
}

/// Build application data for deploying `project_name` to `target`.
///
/// The route needs a cluster URL; the pull secret needs registry
/// credentials. Either is omitted when unavailable.
pub async fn application_data(
    client: &dyn DeploymentClient,
    project_name: &str,
    workspace_id: &str,
    target: &ClusterAndNamespace,
    port: Option<u16>,
) -> Result<KubernetesApplication> {
    let name = valid_name(project_name);
    let clusters = client
        .clusters()
        .await
        .context("Failed to list Kubernetes clusters")?;

    let route = clusters
        .iter()
        .find(|c| c.name == target.cluster)
        .and_then(|c| c.url.as_deref())
        .and_then(|url| derive_route(url, &name, &target.ns, workspace_id));
    if route.is_none() {
        debug!(cluster = %target.cluster, "No ingress route derivable for cluster");
    }

    let secret = match client.registry_credentials().await {
        Ok(credentials) => image_pull_secret(&credentials),
        Err(e) => {
            warn!("Failed to read registry credentials: {:#}", e);
            None
        }
    };

    Ok(KubernetesApplication {
        workspace_id: workspace_id.to_string(),
        name,
        ns: target.ns.clone(),
        cluster: target.cluster.clone(),
        port,
        route,
        image_pull_secret: secret.as_ref().map(|_| IMAGE_PULL_SECRET_NAME.to_string()),
        secrets: secret.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::client::{KubernetesCluster, RegistryCredential, StaticDeploymentClient};

    #[test]
    fn test_ip_host_route() {
        let route = derive_route("https://35.1.2.3:8443", "widget", "testing", "T123").unwrap();
        assert_eq!(route.host, "widget.testing.35.1.2.3.nip.io");
        assert_eq!(route.path, "/");
        assert!(route.annotations.is_empty());
    }

    #[test]
    fn test_domain_host_route() {
        let route = derive_route("https://K8s.Example.com", "widget", "production", "T123").unwrap();
        assert_eq!(route.host, "t123-production.k8s.example.com");
        assert_eq!(route.path, "/widget");
        assert_eq!(route.annotations[REWRITE_TARGET_ANNOTATION], "/");
    }

    #[test]
    fn test_invalid_url_has_no_route() {
        assert!(derive_route("not a url", "widget", "testing", "T123").is_none());
    }

    #[tokio::test]
    async fn test_application_data() {
        let client = StaticDeploymentClient::new(vec![
            KubernetesCluster::new("minikube").with_url("https://192.168.99.100:8443")
        ])
        .with_registry(RegistryCredential {
            url: "registry.example.com".to_string(),
            username: "bot".to_string(),
            secret: "pw".to_string(),
        });
        let target = ClusterAndNamespace {
            cluster: "minikube".to_string(),
            ns: "testing".to_string(),
        };

        let app = application_data(&client, "My_Widget", "T123", &target, Some(8080))
            .await
            .unwrap();

        assert_eq!(app.name, "my-widget");
        assert_eq!(app.port, Some(8080));
        assert_eq!(
            app.route.unwrap().host,
            "my-widget.testing.192.168.99.100.nip.io"
        );
        assert_eq!(app.image_pull_secret.as_deref(), Some("sdm-imagepullsecret"));
        assert_eq!(app.secrets.len(), 1);
    }

    #[tokio::test]
    async fn test_application_data_without_extras() {
        let client = StaticDeploymentClient::new(vec![KubernetesCluster::new("minikube")]);
        let target = ClusterAndNamespace {
            cluster: "minikube".to_string(),
            ns: "production".to_string(),
        };

        let app = application_data(&client, "widget", "T123", &target, None)
            .await
            .unwrap();

        assert!(app.route.is_none());
        assert!(app.image_pull_secret.is_none());
        assert!(app.secrets.is_empty());
    }
}
