use super::{CodeTransform, TransformParams, TransformRecipe, TransformRecipeContributor};
use crate::pipeline::analysis::ProjectAnalysis;
use crate::project::Project;
use crate::stack::dotnet::PROJECT_FILE_GLOB;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Renames the only root `.csproj` after the new project
pub struct DotnetCoreProjectFileTransform;

#[async_trait]
impl CodeTransform for DotnetCoreProjectFileTransform {
    fn name(&self) -> &str {
        "dotnetcore-project-file"
    }

    async fn apply(&self, project: &Project, _params: &TransformParams) -> Result<()> {
        let files = project.gather(&[PROJECT_FILE_GLOB])?;
        if files.len() != 1 {
            debug!(count = files.len(), "Not exactly one project file; leaving names alone");
            return Ok(());
        }

        let current = files[0].path_str();
        let target = format!("{}.csproj", project.name());
        if current == target {
            return Ok(());
        }
        project.move_file(&current, &target)
    }
}

pub struct DotnetCoreTransformRecipeContributor;

#[async_trait]
impl TransformRecipeContributor for DotnetCoreTransformRecipeContributor {
    async fn analyze(&self, _project: &Project, analysis: &ProjectAnalysis) -> Result<Option<TransformRecipe>> {
        if analysis.dotnet_core().is_none() {
            return Ok(None);
        }
        Ok(Some(
            TransformRecipe::default().with_transform(Arc::new(DotnetCoreProjectFileTransform)),
        ))
    }
}
