//! Typed technology elements produced by scanners

use super::docker::DockerStack;
use super::dotnet::DotnetCoreStack;
use super::jhipster::JHipsterStack;
use super::k8s::K8sStack;
use super::node::NodeStack;
use super::react::ReactStack;
use super::travis::TravisCi;
use super::TechnologyId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A library the project depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub group: String,
    pub artifact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A backing service such as a database, keyed by name in [`Services`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(flatten)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

pub type Services = BTreeMap<String, ServiceSpec>;

/// One detected technology stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum TechnologyElement {
    #[serde(rename = "node")]
    Node(NodeStack),
    #[serde(rename = "dotnetcore")]
    DotnetCore(DotnetCoreStack),
    #[serde(rename = "docker")]
    Docker(DockerStack),
    #[serde(rename = "k8s")]
    K8s(K8sStack),
    #[serde(rename = "travis")]
    Travis(TravisCi),
    #[serde(rename = "jhipster")]
    JHipster(JHipsterStack),
    #[serde(rename = "react")]
    React(ReactStack),
}

impl TechnologyElement {
    pub fn id(&self) -> TechnologyId {
        match self {
            TechnologyElement::Node(_) => TechnologyId::Node,
            TechnologyElement::DotnetCore(_) => TechnologyId::DotnetCore,
            TechnologyElement::Docker(_) => TechnologyId::Docker,
            TechnologyElement::K8s(_) => TechnologyId::K8s,
            TechnologyElement::Travis(_) => TechnologyId::Travis,
            TechnologyElement::JHipster(_) => TechnologyId::JHipster,
            TechnologyElement::React(_) => TechnologyId::React,
        }
    }

    pub fn tags(&self) -> Vec<String> {
        vec![self.id().key().to_string()]
    }

    pub fn referenced_environment_variables(&self) -> Vec<String> {
        match self {
            TechnologyElement::Node(node) => node.referenced_environment_variables.clone(),
            _ => Vec::new(),
        }
    }

    pub fn services(&self) -> Services {
        match self {
            TechnologyElement::Node(node) => node.services.clone(),
            TechnologyElement::Travis(travis) => travis.services.clone(),
            _ => Services::new(),
        }
    }

    pub fn dependencies(&self) -> Vec<Dependency> {
        match self {
            TechnologyElement::Node(node) => node.dependencies.clone(),
            _ => Vec::new(),
        }
    }

    /// Project name as the stack itself declares it
    pub fn project_name(&self) -> Option<&str> {
        match self {
            TechnologyElement::Node(node) => node.package_json.name.as_deref(),
            TechnologyElement::Travis(travis) => Some(&travis.project_name),
            _ => None,
        }
    }
}
