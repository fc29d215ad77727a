use crate::goals::{
    Fulfillment, Goal, GoalDefinition, GoalDescriptions, GoalSlot, Goals, MaterialChangeTest,
    SpawnCommand,
};
use crate::interpret::{Interpretation, InterpretationPatch, Interpreter};
use crate::pipeline::analysis::ProjectAnalysis;
use anyhow::Result;
use async_trait::async_trait;

pub const DOCKER_BUILD: &str = "docker-build";

/// Unprivileged image build with kaniko; the image is not pushed
pub fn kaniko_build(dockerfile: &str) -> SpawnCommand {
    SpawnCommand::new(
        "/kaniko/executor",
        [
            format!("--dockerfile={}", dockerfile),
            "--context=dir://.".to_string(),
            "--snapshotMode=time".to_string(),
            "--single-snapshot".to_string(),
            "--no-push".to_string(),
        ],
    )
}

pub fn docker_build_goal(dockerfile: &str) -> Goal {
    Goal::new(
        GoalDefinition::new(DOCKER_BUILD, "docker build")
            .isolated()
            .retry_feasible()
            .with_descriptions(GoalDescriptions {
                planned: None,
                in_process: Some("Running docker build".to_string()),
                completed: Some("Docker build successful".to_string()),
                failed: Some("Docker build failed".to_string()),
            }),
        Fulfillment::Spawn(vec![kaniko_build(dockerfile)]),
    )
}

pub struct DockerInterpreter;

#[async_trait]
impl Interpreter for DockerInterpreter {
    fn name(&self) -> &str {
        "docker"
    }

    async fn enrich(&self, analysis: &ProjectAnalysis, _interpretation: &Interpretation) -> Result<InterpretationPatch> {
        let Some(docker) = analysis.docker() else {
            return Ok(InterpretationPatch::none());
        };
        Ok(InterpretationPatch::material()
            .set(
                GoalSlot::ContainerBuild,
                Goals::new("docker build").plan(docker_build_goal(&docker.docker_file.path)),
            )
            .with_material_change_test(MaterialChangeTest::new().with_files(&["Dockerfile"])))
    }
}
