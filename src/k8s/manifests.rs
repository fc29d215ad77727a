//! Kubernetes manifest fragments attached to goals and deployments

use super::client::RegistryCredential;
use crate::stack::Services;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const IMAGE_PULL_SECRET_NAME: &str = "sdm-imagepullsecret";
const DOCKER_CONFIG_JSON_TYPE: &str = "kubernetes.io/dockerconfigjson";
const MONGO_SERVICE: &str = "mongodb";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub name: String,
    pub container_port: u16,
    pub protocol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    pub limits: BTreeMap<String, String>,
    pub requests: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContext {
    pub allow_privilege_escalation: bool,
    pub privileged: bool,
    pub read_only_root_filesystem: bool,
    pub run_as_group: u32,
    pub run_as_user: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub mount_path: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    pub image_pull_policy: String,
    pub ports: Vec<ContainerPort>,
    pub resources: ResourceRequirements,
    pub security_context: SecurityContext,
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<BTreeMap<String, String>>,
}

impl Volume {
    pub fn empty_dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            empty_dir: Some(BTreeMap::new()),
        }
    }
}

/// Sidecar container and volumes added to a goal's pod
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct K8sServiceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct K8sServiceRegistration {
    pub name: String,
    pub spec: K8sServiceSpec,
}

/// MongoDB sidecar using image `mongo:<tag>`
pub fn mongo(tag: &str) -> K8sServiceRegistration {
    let container = Container {
        name: "mongo".to_string(),
        image: format!("mongo:{}", tag),
        image_pull_policy: "IfNotPresent".to_string(),
        ports: vec![ContainerPort {
            name: "http".to_string(),
            container_port: 27017,
            protocol: "TCP".to_string(),
        }],
        resources: ResourceRequirements {
            limits: BTreeMap::from([
                ("cpu".to_string(), "100m".to_string()),
                ("memory".to_string(), "512Mi".to_string()),
            ]),
            requests: BTreeMap::from([
                ("cpu".to_string(), "100m".to_string()),
                ("memory".to_string(), "256Mi".to_string()),
            ]),
        },
        security_context: SecurityContext {
            allow_privilege_escalation: false,
            privileged: false,
            read_only_root_filesystem: true,
            run_as_group: 999,
            run_as_user: 999,
        },
        volume_mounts: vec![
            VolumeMount {
                mount_path: "/data/db".to_string(),
                name: "mongo-data".to_string(),
            },
            VolumeMount {
                mount_path: "/tmp".to_string(),
                name: "mongo-tmp".to_string(),
            },
        ],
    };

    K8sServiceRegistration {
        name: "mongo".to_string(),
        spec: K8sServiceSpec {
            container: Some(container),
            volumes: vec![Volume::empty_dir("mongo-data"), Volume::empty_dir("mongo-tmp")],
            volume_mounts: Vec::new(),
        },
    }
}

/// Mongo sidecar, only when the analysis asks for a `mongodb` service
pub fn mongo_for(services: &Services, tag: &str) -> Option<K8sServiceRegistration> {
    services.contains_key(MONGO_SERVICE).then(|| mongo(tag))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(rename = "type")]
    pub secret_type: String,
    pub string_data: BTreeMap<String, String>,
}

/// Docker config pull secret built from registry credentials; `None` without credentials
pub fn image_pull_secret(credentials: &[RegistryCredential]) -> Option<Secret> {
    if credentials.is_empty() {
        return None;
    }

    let auths: serde_json::Map<String, serde_json::Value> = credentials
        .iter()
        .map(|c| {
            let auth = BASE64.encode(format!("{}:{}", c.username, c.secret));
            (c.url.clone(), serde_json::json!({ "auth": auth }))
        })
        .collect();
    let docker_config = serde_json::json!({ "auths": auths });

    Some(Secret {
        api_version: "v1".to_string(),
        kind: "Secret".to_string(),
        metadata: ObjectMeta {
            name: IMAGE_PULL_SECRET_NAME.to_string(),
        },
        secret_type: DOCKER_CONFIG_JSON_TYPE.to_string(),
        string_data: BTreeMap::from([(".dockerconfigjson".to_string(), docker_config.to_string())]),
    })
}
