use super::{TransformRecipe, TransformRecipeContributor};
use crate::pipeline::analysis::ProjectAnalysis;
use crate::project::Project;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Reminds the user of environment variables the seed reads
pub struct ReferencedEnvironmentVariableTransformRecipeContributor;

pub fn environment_variable_message(name: &str) -> String {
    format!("You'll probably need to set environment variable '{}'", name)
}

#[async_trait]
impl TransformRecipeContributor for ReferencedEnvironmentVariableTransformRecipeContributor {
    async fn analyze(&self, _project: &Project, analysis: &ProjectAnalysis) -> Result<Option<TransformRecipe>> {
        let names: BTreeSet<String> = analysis
            .elements
            .values()
            .flat_map(|e| e.referenced_environment_variables())
            .collect();

        Ok(Some(TransformRecipe {
            messages: names.iter().map(|n| environment_variable_message(n)).collect(),
            ..TransformRecipe::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{NodeScanner, ScanOptions, TechnologyScanner};
    use crate::testing::{analysis, project, scan_context};

    #[tokio::test]
    async fn test_messages_sorted_and_unique() {
        let p = project(&[
            ("package.json", r#"{"name":"seed"}"#),
            ("index.js", "const a = process.env.ZED; const b = process.env.ALPHA;"),
            ("lib/db.ts", "const c = process.env.ZED;"),
        ]);
        let mut a = analysis(&p);
        let node = NodeScanner
            .scan(&p, &scan_context(), &a, ScanOptions::full())
            .await
            .unwrap();
        a.add_element(node);

        let recipe = ReferencedEnvironmentVariableTransformRecipeContributor
            .analyze(&p, &a)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            recipe.messages,
            vec![
                "You'll probably need to set environment variable 'ALPHA'",
                "You'll probably need to set environment variable 'ZED'",
            ]
        );
        assert!(recipe.transforms.is_empty());
    }
}
