//! Aggregated scanner output for one project

use crate::project::RepoRef;
use crate::stack::{
    Dependency, DockerStack, DotnetCoreStack, JHipsterStack, K8sStack, NodeStack, ReactStack,
    ScanOptions, Services, TechnologyElement, TechnologyId, TravisCi,
};
use crate::transform::SeedAnalysis;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// What was found in a project, keyed by technology
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAnalysis {
    pub id: RepoRef,
    pub options: ScanOptions,
    pub elements: BTreeMap<TechnologyId, TechnologyElement>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub referenced_environment_variables: BTreeSet<String>,
    #[serde(default)]
    pub services: Services,
    #[serde(default)]
    pub messages: Vec<String>,
    /// Present only when transform recipes were requested
    #[serde(skip)]
    pub seed_analysis: Option<SeedAnalysis>,
}

macro_rules! element_accessor {
    ($(#[$meta:meta])* $name:ident, $variant:ident, $stack:ty) => {
        $(#[$meta])*
        pub fn $name(&self) -> Option<&$stack> {
            match self.elements.get(&TechnologyId::$variant) {
                Some(TechnologyElement::$variant(stack)) => Some(stack),
                _ => None,
            }
        }
    };
}

impl ProjectAnalysis {
    pub fn new(id: RepoRef, options: ScanOptions) -> Self {
        Self {
            id,
            options,
            elements: BTreeMap::new(),
            dependencies: Vec::new(),
            referenced_environment_variables: BTreeSet::new(),
            services: Services::new(),
            messages: Vec::new(),
            seed_analysis: None,
        }
    }

    /// Merge one scanner result.
    ///
    /// The first element for an id wins; a later one is dropped with a
    /// warning and an analysis message. Returns whether it was added.
    pub fn add_element(&mut self, element: TechnologyElement) -> bool {
        let id = element.id();
        if self.elements.contains_key(&id) {
            warn!(element = %id.key(), "Duplicate technology element ignored");
            self.messages
                .push(format!("Duplicate element '{}' ignored", id.key()));
            return false;
        }

        self.dependencies.extend(element.dependencies());
        self.referenced_environment_variables
            .extend(element.referenced_environment_variables());
        for (name, spec) in element.services() {
            self.services.entry(name).or_insert(spec);
        }
        self.elements.insert(id, element);
        true
    }

    pub fn has(&self, id: &TechnologyId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn element(&self, id: &TechnologyId) -> Option<&TechnologyElement> {
        self.elements.get(id)
    }

    /// Serialized names of the detected technologies
    pub fn element_names(&self) -> Vec<String> {
        self.elements.keys().map(|id| id.key().to_string()).collect()
    }

    /// A full analysis that detected at least one technology
    pub fn is_usable_as_seed(&self) -> bool {
        self.options.full && !self.elements.is_empty()
    }

    element_accessor!(node, Node, NodeStack);
    element_accessor!(dotnet_core, DotnetCore, DotnetCoreStack);
    element_accessor!(docker, Docker, DockerStack);
    element_accessor!(k8s, K8s, K8sStack);
    element_accessor!(travis, Travis, TravisCi);
    element_accessor!(jhipster, JHipster, JHipsterStack);
    element_accessor!(react, React, ReactStack);
}
