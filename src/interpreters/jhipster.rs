//! JHipster applications: JVM build, jib image build and release tag

use super::docker::DOCKER_BUILD;
use super::versioning::{version_goal, VersionSource};
use crate::goals::{
    Fulfillment, Goal, GoalDefinition, GoalDescriptions, GoalSlot, Goals, MaterialChangeTest,
    SpawnCommand,
};
use crate::interpret::{Interpretation, InterpretationPatch, Interpreter};
use crate::pipeline::analysis::ProjectAnalysis;
use crate::stack::JvmBuildTool;
use anyhow::Result;
use async_trait::async_trait;

fn jvm_build(tool: JvmBuildTool) -> Goal {
    let command = match tool {
        JvmBuildTool::Gradle => "./gradlew build",
        JvmBuildTool::Maven => "./mvnw package",
    };
    Goal::new(
        GoalDefinition::new("build", "build").isolated(),
        Fulfillment::Spawn(vec![SpawnCommand::parse(command)]),
    )
}

fn jib_build(tool: JvmBuildTool) -> Goal {
    let command = match tool {
        JvmBuildTool::Gradle => "./gradlew jibDockerBuild -Djib.console=plain",
        JvmBuildTool::Maven => "./mvnw jib:dockerBuild",
    };
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
        Fulfillment::Spawn(vec![SpawnCommand::parse(command)]),
    )
}

fn tag() -> Goal {
    Goal::new(GoalDefinition::new("tag", "tag"), Fulfillment::external("tag"))
}

pub struct JHipsterInterpreter;

#[async_trait]
impl Interpreter for JHipsterInterpreter {
    fn name(&self) -> &str {
        "jhipster"
    }

    async fn enrich(&self, analysis: &ProjectAnalysis, _interpretation: &Interpretation) -> Result<InterpretationPatch> {
        let Some(jhipster) = analysis.jhipster() else {
            return Ok(InterpretationPatch::none());
        };
        let tool = jhipster.build_tool;
        let build = Goals::new("build")
            .plan(version_goal(VersionSource::Jvm))
            .plan_after(jvm_build(tool), &["version"]);

        Ok(InterpretationPatch::material()
            .set(GoalSlot::Build, build)
            .set(GoalSlot::ContainerBuild, Goals::new("docker build").plan(jib_build(tool)))
            .set(GoalSlot::Release, Goals::new("release").plan(tag()))
            .with_material_change_test(
                MaterialChangeTest::new()
                    .with_extensions(&[
                        "java", "kt", "kts", "xml", "properties", "gradle", "yml", "json", "pug", "html",
                        "css", "Dockerfile", "ts",
                    ])
                    .with_directories(&[".atomist"]),
            )
            .with_material_change_test(MaterialChangeTest::new().with_files(&["Dockerfile"])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::SlotChange;
    use crate::stack::{JHipsterStack, TechnologyElement};
    use crate::testing::{analysis, project};

    fn jhipster_analysis(build_tool: JvmBuildTool) -> ProjectAnalysis {
        let mut a = analysis(&project(&[]));
        a.add_element(TechnologyElement::JHipster(JHipsterStack {
            version: Some("5.8.2".to_string()),
            build_tool,
        }));
        a
    }

    fn command_of(patch: &InterpretationPatch, slot: GoalSlot, goal: &str) -> String {
        let Some(SlotChange::Set(goals)) = patch.change(slot) else {
            panic!("{} not set", slot);
        };
        goals.get(goal).unwrap().goal.fulfillment.spawn_commands()[0].command_line()
    }

    #[tokio::test]
    async fn test_maven_project() {
        let patch = JHipsterInterpreter
            .enrich(&jhipster_analysis(JvmBuildTool::Maven), &Interpretation::default())
            .await
            .unwrap();
        assert_eq!(command_of(&patch, GoalSlot::Build, "build"), "./mvnw package");
        assert_eq!(command_of(&patch, GoalSlot::ContainerBuild, DOCKER_BUILD), "./mvnw jib:dockerBuild");
        assert!(matches!(patch.change(GoalSlot::Release), Some(SlotChange::Set(_))));
        assert_eq!(patch.material_change_push_tests.len(), 2);
    }

    #[tokio::test]
    async fn test_gradle_project() {
        let patch = JHipsterInterpreter
            .enrich(&jhipster_analysis(JvmBuildTool::Gradle), &Interpretation::default())
            .await
            .unwrap();
        assert_eq!(command_of(&patch, GoalSlot::Build, "build"), "./gradlew build");
        assert_eq!(
            command_of(&patch, GoalSlot::ContainerBuild, DOCKER_BUILD),
            "./gradlew jibDockerBuild -Djib.console=plain"
        );
    }
}
