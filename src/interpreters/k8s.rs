//! Kubernetes deploy goals from the configured deployment mapping
//!
//! Default-branch pushes deploy to testing, verify, then deploy to
//! production after approval. Other branches get a short-lived testing
//! deployment that is torn down again once the review window closes.

use crate::goals::{
    Condition, Fulfillment, Goal, GoalDefinition, GoalEnvironment, GoalExecutor, GoalInvocation,
    GoalOutcome, GoalSlot, Goals, PreCondition,
};
use crate::interpret::{Interpretation, InterpretationPatch, Interpreter};
use crate::k8s::{valid_name, DeploymentClient};
use crate::pipeline::analysis::ProjectAnalysis;
use crate::preference::ClusterAndNamespace;
use crate::project::PushContext;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const APP_LABEL: &str = "app.kubernetes.io/name";
pub const BRANCH_LABEL: &str = "stackgoals.dev/branch";

const VERIFY_RETRIES: u32 = 10;
const VERIFY_INTERVAL: Duration = Duration::from_secs(60);
const EPHEMERAL_LIFETIME: Duration = Duration::from_secs(10 * 60);

/// Labels identifying the deployments of a push; branch-scoped when `ephemeral`
pub fn deployment_selector(push: &PushContext, ephemeral: bool) -> BTreeMap<String, String> {
    let mut selector = BTreeMap::from([(APP_LABEL.to_string(), valid_name(&push.repo.repo))]);
    if ephemeral {
        selector.insert(BRANCH_LABEL.to_string(), valid_name(&push.branch));
    }
    selector
}

/// Holds while the push has at least one matching deployment
pub struct DeploymentPresent {
    client: Arc<dyn DeploymentClient>,
    target: ClusterAndNamespace,
    ephemeral: bool,
}

impl DeploymentPresent {
    pub fn new(client: Arc<dyn DeploymentClient>, target: ClusterAndNamespace, ephemeral: bool) -> Self {
        Self {
            client,
            target,
            ephemeral,
        }
    }

    async fn present(&self, push: &PushContext) -> Result<bool> {
        let deployments = self
            .client
            .list_deployments(
                &self.target.cluster,
                &self.target.ns,
                &deployment_selector(push, self.ephemeral),
            )
            .await?;
        Ok(!deployments.is_empty())
    }
}

#[async_trait]
impl Condition for DeploymentPresent {
    fn name(&self) -> &str {
        "deployment-present"
    }

    async fn check(&self, push: &PushContext) -> Result<bool> {
        self.present(push).await
    }
}

/// Holds once the push's deployments are gone
pub struct DeploymentAbsent(DeploymentPresent);

#[async_trait]
impl Condition for DeploymentAbsent {
    fn name(&self) -> &str {
        "deployment-absent"
    }

    async fn check(&self, push: &PushContext) -> Result<bool> {
        Ok(!self.0.present(push).await?)
    }
}

/// Succeeds when the testing deployment is up
struct VerifyDeployment {
    condition: DeploymentPresent,
}

#[async_trait]
impl GoalExecutor for VerifyDeployment {
    fn name(&self) -> &str {
        "verify-deployment"
    }

    async fn execute(&self, invocation: &GoalInvocation) -> Result<GoalOutcome> {
        if self.condition.present(&invocation.push).await? {
            Ok(GoalOutcome::success().with_description(format!("Verified {}", self.condition.target)))
        } else {
            Ok(GoalOutcome::failure(format!("No deployment found in {}", self.condition.target)))
        }
    }
}

/// Deletes the branch deployments; failures are logged and skipped
struct StopDeployment {
    client: Arc<dyn DeploymentClient>,
    target: ClusterAndNamespace,
}

#[async_trait]
impl GoalExecutor for StopDeployment {
    fn name(&self) -> &str {
        "stop-deployment"
    }

    async fn execute(&self, invocation: &GoalInvocation) -> Result<GoalOutcome> {
        let selector = deployment_selector(&invocation.push, true);
        let deployments = match self
            .client
            .list_deployments(&self.target.cluster, &self.target.ns, &selector)
            .await
        {
            Ok(deployments) => deployments,
            Err(e) => {
                warn!("Failed to list branch deployments in {}: {:#}", self.target, e);
                return Ok(GoalOutcome::success().with_description("Nothing stopped"));
            }
        };

        let mut stopped = 0;
        for deployment in &deployments {
            if invocation.cancellation.is_cancelled() {
                return Ok(GoalOutcome::canceled());
            }
            match self
                .client
                .delete_deployment(&deployment.cluster, &deployment.namespace, &deployment.name)
                .await
            {
                Ok(()) => stopped += 1,
                Err(e) => warn!(deployment = %deployment.name, "Failed to delete deployment: {:#}", e),
            }
        }
        info!(stopped, branch = %invocation.push.branch, "Stopped branch deployments");
        Ok(GoalOutcome::success().with_description(format!("Stopped {} deployment(s)", stopped)))
    }
}

fn deploy_goal(name: &str, environment: GoalEnvironment, data: serde_json::Value) -> Goal {
    Goal::new(
        GoalDefinition::new(name, format!("deploy to {}", name)).in_environment(environment),
        Fulfillment::external("kubernetes-deploy"),
    )
    .with_data(data)
}

pub struct K8sDeployInterpreter {
    client: Arc<dyn DeploymentClient>,
}

impl K8sDeployInterpreter {
    pub fn new(client: Arc<dyn DeploymentClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Interpreter for K8sDeployInterpreter {
    fn name(&self) -> &str {
        "k8s-deploy"
    }

    async fn enrich(&self, analysis: &ProjectAnalysis, _interpretation: &Interpretation) -> Result<InterpretationPatch> {
        let Some(k8s) = analysis.k8s() else {
            return Ok(InterpretationPatch::none());
        };
        let Some(testing) = k8s.deployment_mapping.testing.clone() else {
            return Ok(InterpretationPatch::none());
        };
        let data = json!({ "k8s": k8s });
        let testing_deploy = deploy_goal("testing", GoalEnvironment::Testing, data.clone());

        let deploy = if k8s.ephemeral {
            let absent = DeploymentAbsent(DeploymentPresent::new(self.client.clone(), testing.clone(), true));
            let stop = Goal::new(
                GoalDefinition::new("stop testing", "stop testing deployment").in_environment(GoalEnvironment::Testing),
                Fulfillment::Executor(Arc::new(StopDeployment {
                    client: self.client.clone(),
                    target: testing,
                })),
            )
            .with_pre_condition(PreCondition::until_deadline(Arc::new(absent), VERIFY_INTERVAL, EPHEMERAL_LIFETIME));
            Goals::new("deploy")
                .plan(testing_deploy)
                .plan_after(stop, &["testing"])
        } else {
            let present = Arc::new(DeploymentPresent::new(self.client.clone(), testing.clone(), false));
            let verify = Goal::new(
                GoalDefinition::new("verify testing", "verify testing deployment")
                    .in_environment(GoalEnvironment::Testing)
                    .retry_feasible(),
                Fulfillment::Executor(Arc::new(VerifyDeployment {
                    condition: DeploymentPresent::new(self.client.clone(), testing, false),
                })),
            )
            .with_pre_condition(PreCondition::polling(present, VERIFY_RETRIES, VERIFY_INTERVAL));

            let mut deploy = Goals::new("deploy")
                .plan(testing_deploy)
                .plan_after(verify, &["testing"]);
            if k8s.deployment_mapping.production.is_some() {
                let production = deploy_goal("production", GoalEnvironment::Production, data).with_pre_approval();
                deploy = deploy.plan_after(production, &["testing", "verify testing"]);
            }
            deploy
        };

        Ok(InterpretationPatch::material().set(GoalSlot::Deploy, deploy))
    }
}
