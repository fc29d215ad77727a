//! Push evaluation: from a push to the goal graph handed to the scheduler
//!
//! Rules apply in order. A disabled repository gets no goals at all. A push
//! touching no material file gets no goals. Otherwise check goals are always
//! planned, while build, test, container, deploy and release goals need the
//! extended-goals policy to admit the push. Optional goals that were not
//! switched on are dropped from the graph. The first push to a repository also
//! publishes its technologies as topics, when source hosting is configured.

use crate::config::MachineConfig;
use crate::github::{publish_topics_for_elements, RepoHosting};
use crate::goals::{GoalEnvironment, GoalGraph, GoalSlot, Goals};
use crate::interpret::Interpretation;
use crate::k8s::{application_data, DeploymentClient};
use crate::notify::Notifier;
use crate::pipeline::{ProjectAnalysis, ProjectAnalyzer};
use crate::preference::{is_goal_enabled, DeploymentPhase, Enablement, Preferences};
use crate::project::{Project, PushContext};
use crate::stack::{ScanContext, ScanOptions};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of evaluating one push
#[derive(Debug)]
pub enum PushPlan {
    /// No goals, and nothing else may plan any
    Locked(String),
    Immaterial,
    Planned(PlannedPush),
}

#[derive(Debug)]
pub struct PlannedPush {
    pub graph: GoalGraph,
    pub analysis: ProjectAnalysis,
    pub interpretation: Interpretation,
    /// Whether goals beyond the checks were admitted
    pub extended: bool,
}

pub struct Machine {
    config: MachineConfig,
    analyzer: ProjectAnalyzer,
    preferences: Preferences,
    enablement: Enablement,
    client: Arc<dyn DeploymentClient>,
    hosting: Option<(Arc<dyn RepoHosting>, Arc<dyn Notifier>)>,
}

impl Machine {
    pub fn new(
        config: MachineConfig,
        analyzer: ProjectAnalyzer,
        preferences: Preferences,
        client: Arc<dyn DeploymentClient>,
    ) -> Self {
        let enablement = Enablement::new(preferences.clone(), config.default_enablement);
        Self {
            config,
            analyzer,
            preferences,
            enablement,
            client,
            hosting: None,
        }
    }

    /// Publish topics through `hosting` on first pushes
    pub fn with_hosting(mut self, hosting: Arc<dyn RepoHosting>, notifier: Arc<dyn Notifier>) -> Self {
        self.hosting = Some((hosting, notifier));
        self
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn enablement(&self) -> &Enablement {
        &self.enablement
    }

    pub fn scan_context(&self, push: &PushContext) -> ScanContext {
        ScanContext::new(self.preferences.clone())
            .with_push(push.clone())
            .with_ephemeral_deployments(self.config.ephemeral_deployments)
    }

    pub async fn plan_push(&self, project: &Project, push: &PushContext) -> Result<PushPlan> {
        if !self.enablement.is_sdm_enabled(project.id()).await? {
            info!(repo = %project.id().slug(), "Machine disabled; locking goals");
            return Ok(PushPlan::Locked("disabled".to_string()));
        }

        let interpreted = self
            .analyzer
            .interpret(project, &self.scan_context(push), ScanOptions::full())
            .await
            .with_context(|| format!("Failed to interpret {}", project.id().slug()))?;
        let interpretation = interpreted.interpretation;

        if push.first_push {
            self.publish_topics(&interpreted.analysis).await;
        }

        if !is_material_push(&interpretation, push) {
            info!(repo = %project.id().slug(), "Immaterial change");
            return Ok(PushPlan::Immaterial);
        }

        let extended = self.config.extended_goals.admits(push);
        let stages: Vec<(GoalSlot, Goals)> = if extended {
            GoalSlot::STAGES
                .iter()
                .filter_map(|&slot| interpretation.slot(slot).cloned().map(|goals| (slot, goals)))
                .collect()
        } else {
            debug!(branch = %push.branch, "Extended goals not admitted for push");
            Vec::new()
        };
        let mut graph = GoalGraph::compose(interpretation.check_goals.clone(), stages)?;

        self.remove_disabled_optional_goals(&mut graph).await?;
        self.add_application_data(&mut graph, project, &interpreted.analysis).await;

        info!(
            repo = %project.id().slug(),
            goals = graph.len(),
            "Planned goals: {}",
            graph.names().join(", ")
        );
        Ok(PushPlan::Planned(PlannedPush {
            graph,
            analysis: interpreted.analysis,
            interpretation,
            extended,
        }))
    }

    /// Best effort; the plan never depends on the hosting service
    async fn publish_topics(&self, analysis: &ProjectAnalysis) {
        match &self.hosting {
            Some((hosting, notifier)) => {
                publish_topics_for_elements(hosting.as_ref(), analysis, notifier.as_ref()).await;
            }
            None => debug!("No source hosting configured; topics not published"),
        }
    }

    async fn remove_disabled_optional_goals(&self, graph: &mut GoalGraph) -> Result<()> {
        for goal in &self.config.optional_goals {
            if graph.get(goal).is_none() {
                continue;
            }
            if !is_goal_enabled(&self.preferences, goal).await? {
                debug!(goal = %goal, "Optional goal not enabled");
                graph.remove_goal(goal);
            }
        }
        Ok(())
    }

    /// Deploy goals get the application they deploy; failures leave the goal as planned
    async fn add_application_data(&self, graph: &mut GoalGraph, project: &Project, analysis: &ProjectAnalysis) {
        let Some(k8s) = analysis.k8s() else {
            return;
        };
        let Some(workspace_id) = self.config.workspace_id.as_deref() else {
            debug!("No workspace id; deploy goals carry no application data");
            return;
        };
        let port = analysis.docker().and_then(|d| d.port());

        for phase in [DeploymentPhase::Testing, DeploymentPhase::Production] {
            let Some(target) = k8s.deployment_mapping.get(phase) else {
                continue;
            };
            let Some(node) = graph.get_mut(phase.as_str()) else {
                continue;
            };
            if node.goal.definition.environment == GoalEnvironment::Code {
                continue;
            }
            match application_data(self.client.as_ref(), project.name(), workspace_id, target, port).await {
                Ok(application) => {
                    let mut data = match node.goal.data.take() {
                        Some(Value::Object(map)) => map,
                        _ => serde_json::Map::new(),
                    };
                    data.insert("application".to_string(), json!(application));
                    node.goal.data = Some(Value::Object(data));
                }
                Err(e) => warn!(phase = %phase, "Failed to build application data: {:#}", e),
            }
        }
    }
}

/// With no material-change tests, or no known changed files, every push is material
pub fn is_material_push(interpretation: &Interpretation, push: &PushContext) -> bool {
    let tests = &interpretation.material_change_push_tests;
    if tests.is_empty() || push.changed_files.is_empty() {
        return true;
    }
    tests.iter().any(|t| t.is_material(&push.changed_files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtendedGoals;
    use crate::project::RepoRef;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use crate::k8s::{KubernetesCluster, StaticDeploymentClient};
    use crate::notify::RecordingNotifier;
    use crate::pipeline::default_analyzer;
    use crate::preference::{ClusterAndNamespace, EnablementState, EnablementTarget, PreferenceScope};
    use crate::testing::{project, push};

    const PACKAGE_JSON: &str = r#"{"name":"widget","scripts":{"build":"tsc","test":"mocha"}}"#;

    fn machine(config: MachineConfig, preferences: Preferences) -> Machine {
        let client: Arc<dyn DeploymentClient> = Arc::new(StaticDeploymentClient::new(vec![
            KubernetesCluster::new("gke").with_url("https://35.1.2.3")
        ]));
        let analyzer = default_analyzer(client.clone(), Vec::new()).build();
        Machine::new(config, analyzer, preferences, client)
    }

    fn enabled_config() -> MachineConfig {
        MachineConfig {
            default_enablement: EnablementState::Enabled,
            workspace_id: Some("T123".to_string()),
            ..MachineConfig::default()
        }
    }

    fn planned(plan: PushPlan) -> PlannedPush {
        match plan {
            PushPlan::Planned(planned) => planned,
            other => panic!("expected planned push, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_disabled_repo_is_locked() {
        let m = machine(MachineConfig::default(), Preferences::in_memory());
        let plan = m
            .plan_push(&project(&[("package.json", PACKAGE_JSON)]), &push("main"))
            .await
            .unwrap();
        assert!(matches!(plan, PushPlan::Locked(reason) if reason == "disabled"));
    }

    #[tokio::test]
    async fn test_repo_enablement_overrides_default() {
        let preferences = Preferences::in_memory();
        let m = machine(MachineConfig::default(), preferences);
        m.enablement()
            .toggle(&EnablementTarget::repo("acme", "widget"), true, "stackgoals", &RecordingNotifier::new())
            .await
            .unwrap();
        let plan = m
            .plan_push(&project(&[("package.json", PACKAGE_JSON)]), &push("main"))
            .await
            .unwrap();
        assert!(matches!(plan, PushPlan::Planned(_)));
    }

    #[tokio::test]
    async fn test_immaterial_change() {
        let m = machine(enabled_config(), Preferences::in_memory());
        let plan = m
            .plan_push(
                &project(&[("package.json", PACKAGE_JSON)]),
                &push("main").with_changed_files(["README.md"]),
            )
            .await
            .unwrap();
        assert!(matches!(plan, PushPlan::Immaterial));
    }

    #[tokio::test]
    async fn test_stages_are_chained() {
        let m = machine(enabled_config(), Preferences::in_memory());
        let planned = planned(
            m.plan_push(
                &project(&[("package.json", PACKAGE_JSON)]),
                &push("main").with_changed_files(["src/index.ts"]),
            )
            .await
            .unwrap(),
        );
        let graph = &planned.graph;
        assert!(planned.extended);
        assert!(graph.get("node-fingerprint").unwrap().after.is_empty());
        assert_eq!(graph.get("npm-run-build").unwrap().after, vec!["version"]);
        assert_eq!(graph.get("npm-run-test").unwrap().after, vec!["version", "npm-run-build"]);
    }

    #[tokio::test]
    async fn test_extended_goals_only_on_default_branch() {
        let config = MachineConfig {
            extended_goals: ExtendedGoals::DefaultBranch,
            ..enabled_config()
        };
        let m = machine(config, Preferences::in_memory());
        let planned = planned(
            m.plan_push(&project(&[("package.json", PACKAGE_JSON)]), &push("feature"))
                .await
                .unwrap(),
        );
        assert!(!planned.extended);
        assert_eq!(planned.graph.names(), vec!["node-fingerprint"]);
    }

    #[tokio::test]
    async fn test_optional_goal_needs_opt_in() {
        let preferences = Preferences::in_memory();
        let config = MachineConfig {
            optional_goals: vec!["npm-run-test".to_string()],
            ..enabled_config()
        };
        let m = machine(config, preferences.clone());
        let p = project(&[("package.json", PACKAGE_JSON)]);

        let graph = planned(m.plan_push(&p, &push("main")).await.unwrap()).graph;
        assert!(graph.get("npm-run-test").is_none());

        preferences
            .put("npm-run-test:enabled", &true, PreferenceScope::Sdm)
            .await
            .unwrap();
        let graph = planned(m.plan_push(&p, &push("main")).await.unwrap()).graph;
        assert!(graph.get("npm-run-test").is_some());
    }

    #[derive(Default)]
    struct RecordingHosting {
        topics: Mutex<Vec<(String, Vec<String>)>>,
        fail: bool,
    }

    #[async_trait]
    impl RepoHosting for RecordingHosting {
        async fn put_topics(&self, repo: &RepoRef, names: &[String]) -> Result<()> {
            if self.fail {
                anyhow::bail!("502 Bad Gateway");
            }
            self.topics.lock().unwrap().push((repo.slug(), names.to_vec()));
            Ok(())
        }

        async fn delete_repo(&self, _repo: &RepoRef) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_first_push_publishes_topics() {
        let hosting = Arc::new(RecordingHosting::default());
        let notifier = Arc::new(RecordingNotifier::new());
        let m = machine(enabled_config(), Preferences::in_memory()).with_hosting(hosting.clone(), notifier.clone());
        let p = project(&[
            ("package.json", PACKAGE_JSON),
            ("Dockerfile", "FROM node:10\n"),
        ]);

        m.plan_push(&p, &push("main")).await.unwrap();
        assert!(hosting.topics.lock().unwrap().is_empty());

        let plan = m.plan_push(&p, &push("main").with_first_push(true)).await.unwrap();
        assert!(matches!(plan, PushPlan::Planned(_)));
        let topics = hosting.topics.lock().unwrap().clone();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].0, "acme/widget");
        assert!(topics[0].1.contains(&"node".to_string()));
        assert!(topics[0].1.contains(&"docker".to_string()));
        assert!(notifier.last().unwrap().text.contains("Published GitHub topics"));
    }

    #[tokio::test]
    async fn test_topic_failure_does_not_block_planning() {
        let hosting = Arc::new(RecordingHosting {
            fail: true,
            ..RecordingHosting::default()
        });
        let notifier = Arc::new(RecordingNotifier::new());
        let m = machine(enabled_config(), Preferences::in_memory()).with_hosting(hosting, notifier.clone());
        let plan = m
            .plan_push(
                &project(&[("package.json", PACKAGE_JSON)]),
                &push("main").with_first_push(true),
            )
            .await
            .unwrap();
        assert!(matches!(plan, PushPlan::Planned(_)));
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_repo_publishes_nothing() {
        let hosting = Arc::new(RecordingHosting::default());
        let m = machine(MachineConfig::default(), Preferences::in_memory())
            .with_hosting(hosting.clone(), Arc::new(RecordingNotifier::new()));
        m.plan_push(
            &project(&[("package.json", PACKAGE_JSON)]),
            &push("main").with_first_push(true),
        )
        .await
        .unwrap();
        assert!(hosting.topics.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deploy_goals_carry_application() {
        let preferences = Preferences::in_memory();
        preferences
            .put(
                &DeploymentPhase::Testing.preference_key(),
                &ClusterAndNamespace {
                    cluster: "gke".to_string(),
                    ns: "testing".to_string(),
                },
                PreferenceScope::Sdm,
            )
            .await
            .unwrap();
        let m = machine(enabled_config(), preferences);
        let p = project(&[
            ("package.json", PACKAGE_JSON),
            ("Dockerfile", "FROM node:10\nEXPOSE 3000\n"),
        ]);
        let graph = planned(m.plan_push(&p, &push("main")).await.unwrap()).graph;

        let testing = graph.get("testing").unwrap();
        let data = testing.goal.data.as_ref().unwrap();
        assert_eq!(data["application"]["port"], 3000);
        assert_eq!(data["application"]["route"]["host"], "widget.testing.35.1.2.3.nip.io");
        assert!(data.get("k8s").is_some());
        assert_eq!(testing.after, vec!["docker-build"]);
    }
}
