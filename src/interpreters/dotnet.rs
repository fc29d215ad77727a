use super::docker::docker_build_goal;
use super::versioning::{version_goal, VersionSource};
use crate::goals::{Fulfillment, Goal, GoalDefinition, GoalSlot, Goals, MaterialChangeTest, SpawnCommand};
use crate::interpret::{Interpretation, InterpretationPatch, Interpreter};
use crate::pipeline::analysis::ProjectAnalysis;
use anyhow::Result;
use async_trait::async_trait;

const DEFAULT_DOCKERFILE: &str = "Dockerfile";

fn dotnet_build() -> Goal {
    Goal::new(
        GoalDefinition::new("dotnet-build", "dotnet build").isolated(),
        Fulfillment::Spawn(vec![SpawnCommand::parse("dotnet build")]),
    )
}

pub struct DotnetCoreInterpreter;

#[async_trait]
impl Interpreter for DotnetCoreInterpreter {
    fn name(&self) -> &str {
        "dotnetcore"
    }

    async fn enrich(&self, analysis: &ProjectAnalysis, _interpretation: &Interpretation) -> Result<InterpretationPatch> {
        let Some(dotnet) = analysis.dotnet_core() else {
            return Ok(InterpretationPatch::none());
        };
        let build = Goals::new("dotnet build")
            .plan(version_goal(VersionSource::Csproj))
            .plan_after(dotnet_build(), &["version"]);
        let mut patch = InterpretationPatch::material()
            .set(GoalSlot::Build, build)
            .with_material_change_test(
                MaterialChangeTest::new()
                    .with_extensions(&["csproj", "cs", "cshtml", "json", "html", "css"])
                    .with_directories(&[".atomist"]),
            );

        if dotnet.has_docker_file {
            let dockerfile = analysis
                .docker()
                .map(|d| d.docker_file.path.clone())
                .unwrap_or_else(|| DEFAULT_DOCKERFILE.to_string());
            patch = patch.set(
                GoalSlot::ContainerBuild,
                Goals::new("docker build").plan(docker_build_goal(&dockerfile)),
            );
        }
        Ok(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::SlotChange;
    use crate::stack::{DotnetCoreStack, TechnologyElement};
    use crate::testing::{analysis, project};

    fn dotnet_analysis(has_docker_file: bool) -> ProjectAnalysis {
        let mut a = analysis(&project(&[]));
        a.add_element(TechnologyElement::DotnetCore(DotnetCoreStack {
            project_file: "app.csproj".to_string(),
            target: "netcoreapp2.1".to_string(),
            version: None,
            has_docker_file,
            docker_instructions: None,
        }));
        a
    }

    #[tokio::test]
    async fn test_build_goals() {
        let patch = DotnetCoreInterpreter
            .enrich(&dotnet_analysis(false), &Interpretation::default())
            .await
            .unwrap();
        let Some(SlotChange::Set(goals)) = patch.change(GoalSlot::Build) else {
            panic!("build not set");
        };
        assert_eq!(goals.names(), vec!["version", "dotnet-build"]);
        assert!(patch.change(GoalSlot::ContainerBuild).is_none());
        assert!(patch.material_change_push_tests[0].is_material(&["Controllers/Home.cs".to_string()]));
    }

    #[tokio::test]
    async fn test_container_build_with_dockerfile() {
        let patch = DotnetCoreInterpreter
            .enrich(&dotnet_analysis(true), &Interpretation::default())
            .await
            .unwrap();
        let Some(SlotChange::Set(goals)) = patch.change(GoalSlot::ContainerBuild) else {
            panic!("container build not set");
        };
        let command = &goals.get("docker-build").unwrap().goal.fulfillment.spawn_commands()[0];
        assert_eq!(command.args[0], "--dockerfile=Dockerfile");
    }
}
