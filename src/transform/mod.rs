//! Code transforms and the recipes that bundle them
//!
//! When a project is analyzed as a generator seed, every registered
//! [`TransformRecipeContributor`] may contribute a [`TransformRecipe`]: the
//! parameters it needs, the transforms to run against the copy and any
//! messages for the user. The collected recipes form the [`SeedAnalysis`].

pub mod dotnet;
pub mod enablement;
pub mod env_vars;
pub mod node;
pub mod provenance;

use crate::pipeline::analysis::ProjectAnalysis;
use crate::project::Project;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub use dotnet::{DotnetCoreProjectFileTransform, DotnetCoreTransformRecipeContributor};
pub use enablement::SdmEnablementTransform;
pub use env_vars::ReferencedEnvironmentVariableTransformRecipeContributor;
pub use node::{
    EslintFix, NodeTransformRecipeContributor, PackageJsonFormat, UpdatePackageJsonIdentification,
    UpdateReadmeTitle,
};
pub use provenance::ProvenanceFile;

/// Parameter values collected from the user, keyed by parameter name
pub type TransformParams = BTreeMap<String, String>;

#[async_trait]
pub trait CodeTransform: Send + Sync {
    fn name(&self) -> &str;

    async fn apply(&self, project: &Project, params: &TransformParams) -> Result<()>;
}

/// A parameter a recipe needs before its transforms can run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ParameterSpec {
    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
            pattern: None,
            default_value: None,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

#[derive(Clone, Default)]
pub struct TransformRecipe {
    pub parameters: Vec<ParameterSpec>,
    pub transforms: Vec<Arc<dyn CodeTransform>>,
    pub messages: Vec<String>,
    pub warnings: Vec<String>,
}

impl TransformRecipe {
    pub fn with_transform(mut self, transform: Arc<dyn CodeTransform>) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
            && self.transforms.is_empty()
            && self.messages.is_empty()
            && self.warnings.is_empty()
    }

    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }
}

impl fmt::Debug for TransformRecipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRecipe")
            .field("parameters", &self.parameters)
            .field("transforms", &self.transform_names())
            .field("messages", &self.messages)
            .field("warnings", &self.warnings)
            .finish()
    }
}

#[async_trait]
pub trait TransformRecipeContributor: Send + Sync {
    /// `None` when the seed offers nothing for this contributor
    async fn analyze(&self, project: &Project, analysis: &ProjectAnalysis) -> Result<Option<TransformRecipe>>;
}

/// A contributor registered with the analyzer
#[derive(Clone)]
pub struct TransformRecipeContribution {
    pub originator: String,
    pub optional: bool,
    pub contributor: Arc<dyn TransformRecipeContributor>,
}

impl TransformRecipeContribution {
    pub fn new(originator: impl Into<String>, contributor: Arc<dyn TransformRecipeContributor>) -> Self {
        Self {
            originator: originator.into(),
            optional: false,
            contributor,
        }
    }
}

/// A recipe together with the contributor that produced it
#[derive(Debug, Clone)]
pub struct TransformRecipeRequest {
    pub originator: String,
    pub optional: bool,
    pub recipe: TransformRecipe,
}

#[derive(Debug, Clone, Default)]
pub struct SeedAnalysis {
    pub transform_recipes: Vec<TransformRecipeRequest>,
}

impl SeedAnalysis {
    /// Transforms of every mandatory recipe, in contribution order
    pub fn transforms(&self) -> Vec<Arc<dyn CodeTransform>> {
        self.mandatory()
            .flat_map(|r| r.recipe.transforms.iter().cloned())
            .collect()
    }

    pub fn parameters(&self) -> Vec<&ParameterSpec> {
        self.mandatory().flat_map(|r| r.recipe.parameters.iter()).collect()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.transform_recipes
            .iter()
            .flat_map(|r| r.recipe.messages.iter().map(String::as_str))
            .collect()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.transform_recipes
            .iter()
            .flat_map(|r| r.recipe.warnings.iter().map(String::as_str))
            .collect()
    }

    pub fn originators(&self) -> Vec<&str> {
        self.transform_recipes.iter().map(|r| r.originator.as_str()).collect()
    }

    fn mandatory(&self) -> impl Iterator<Item = &TransformRecipeRequest> {
        self.transform_recipes.iter().filter(|r| !r.optional)
    }
}

/// Run each recipe contributor against a seed project
pub async fn analyze_seed(
    contributions: &[TransformRecipeContribution],
    project: &Project,
    analysis: &ProjectAnalysis,
) -> SeedAnalysis {
    let mut seed = SeedAnalysis::default();
    for contribution in contributions {
        match contribution.contributor.analyze(project, analysis).await {
            Ok(Some(recipe)) => seed.transform_recipes.push(TransformRecipeRequest {
                originator: contribution.originator.clone(),
                optional: contribution.optional,
                recipe,
            }),
            Ok(None) => {}
            Err(e) => tracing::warn!(
                originator = %contribution.originator,
                "Transform recipe contributor failed: {:#}",
                e
            ),
        }
    }
    seed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{analysis, project};

    struct Named(&'static str);

    #[async_trait]
    impl CodeTransform for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn apply(&self, _project: &Project, _params: &TransformParams) -> Result<()> {
            Ok(())
        }
    }

    struct Fixed {
        recipe: Option<TransformRecipe>,
    }

    #[async_trait]
    impl TransformRecipeContributor for Fixed {
        async fn analyze(&self, _project: &Project, _analysis: &ProjectAnalysis) -> Result<Option<TransformRecipe>> {
            Ok(self.recipe.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl TransformRecipeContributor for Failing {
        async fn analyze(&self, _project: &Project, _analysis: &ProjectAnalysis) -> Result<Option<TransformRecipe>> {
            anyhow::bail!("boom")
        }
    }

    #[tokio::test]
    async fn test_analyze_seed_collects_recipes() {
        let p = project(&[]);
        let a = analysis(&p);
        let mut optional = TransformRecipeContribution::new(
            "optional",
            Arc::new(Fixed {
                recipe: Some(TransformRecipe::default().with_transform(Arc::new(Named("skipped")))),
            }),
        );
        optional.optional = true;

        let contributions = vec![
            TransformRecipeContribution::new(
                "first",
                Arc::new(Fixed {
                    recipe: Some(TransformRecipe {
                        messages: vec!["hello".to_string()],
                        ..TransformRecipe::default().with_transform(Arc::new(Named("a")))
                    }),
                }),
            ),
            TransformRecipeContribution::new("none", Arc::new(Fixed { recipe: None })),
            TransformRecipeContribution::new("failing", Arc::new(Failing)),
            optional,
        ];

        let seed = analyze_seed(&contributions, &p, &a).await;
        assert_eq!(seed.originators(), vec!["first", "optional"]);
        let names: Vec<String> = seed.transforms().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["a"]);
        assert_eq!(seed.messages(), vec!["hello"]);
    }
}
