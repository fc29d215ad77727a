//! Scanner and classifier contracts

use super::{TechnologyElement, TechnologyId};
use crate::pipeline::analysis::ProjectAnalysis;
use crate::preference::Preferences;
use crate::project::{Project, PushContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// `full = false` skips expensive work such as content greps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    pub full: bool,
}

impl ScanOptions {
    pub fn full() -> Self {
        Self { full: true }
    }

    pub fn fast() -> Self {
        Self { full: false }
    }
}

/// What a scanner may know besides the project itself
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub push: Option<PushContext>,
    pub preferences: Preferences,
    /// Produce k8s elements for non-default branches
    pub ephemeral_deployments: bool,
}

impl ScanContext {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            push: None,
            preferences,
            ephemeral_deployments: false,
        }
    }

    pub fn with_push(mut self, push: PushContext) -> Self {
        self.push = Some(push);
        self
    }

    pub fn with_ephemeral_deployments(mut self, enabled: bool) -> Self {
        self.ephemeral_deployments = enabled;
        self
    }
}

/// Cheap pre-scan verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologyClassification {
    pub name: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

/// Detects one technology.
///
/// Returning `None` means "not here". Malformed inputs are logged and
/// reported as `None` too; scanners never fail an analysis.
#[async_trait]
pub trait TechnologyScanner: Send + Sync {
    fn id(&self) -> TechnologyId;

    async fn scan(
        &self,
        project: &Project,
        ctx: &ScanContext,
        analysis: &ProjectAnalysis,
        options: ScanOptions,
    ) -> Option<TechnologyElement>;

    /// Must only look at file presence and small files
    async fn classify(&self, _project: &Project, _ctx: &ScanContext) -> Option<TechnologyClassification> {
        None
    }
}
