use super::docker::find_dockerfile;
use super::scanner::{ScanContext, ScanOptions, TechnologyScanner};
use super::{TechnologyElement, TechnologyId};
use crate::pipeline::analysis::ProjectAnalysis;
use crate::preference::{get_deployment_mapping, DeploymentMapping};
use crate::project::Project;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Deployment targets for a containerized project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct K8sStack {
    pub deployment_mapping: DeploymentMapping,
    /// Deploys a short-lived copy of a non-default branch
    #[serde(default)]
    pub ephemeral: bool,
}

pub struct K8sScanner;

#[async_trait]
impl TechnologyScanner for K8sScanner {
    fn id(&self) -> TechnologyId {
        TechnologyId::K8s
    }

    async fn scan(
        &self,
        project: &Project,
        ctx: &ScanContext,
        _analysis: &ProjectAnalysis,
        _options: ScanOptions,
    ) -> Option<TechnologyElement> {
        find_dockerfile(project)?;
        let push = ctx.push.as_ref()?;

        let deployment_mapping = match get_deployment_mapping(&ctx.preferences).await {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!("Failed to read deployment mapping: {:#}", e);
                return None;
            }
        };

        if push.is_default_branch() {
            return Some(TechnologyElement::K8s(K8sStack {
                deployment_mapping,
                ephemeral: false,
            }));
        }

        if ctx.ephemeral_deployments && deployment_mapping.testing.is_some() {
            debug!(branch = %push.branch, "Planning ephemeral branch deployment");
            return Some(TechnologyElement::K8s(K8sStack {
                deployment_mapping,
                ephemeral: true,
            }));
        }

        None
    }
}
