use crate::pipeline::context::AnalysisContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use crate::transform::{analyze_seed, TransformRecipeContribution};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Collects transform recipes when the project is to be used as a seed
pub struct SeedPhase {
    contributions: Arc<Vec<TransformRecipeContribution>>,
}

impl SeedPhase {
    pub fn new(contributions: Arc<Vec<TransformRecipeContribution>>) -> Self {
        Self { contributions }
    }
}

#[async_trait]
impl WorkflowPhase for SeedPhase {
    fn name(&self) -> &'static str {
        "seed"
    }

    async fn execute(&self, context: &mut AnalysisContext) -> Result<()> {
        if !context.request_recipes {
            debug!("Transform recipes not requested");
            return Ok(());
        }
        let seed = analyze_seed(&self.contributions, &context.project, &context.analysis).await;
        context.analysis.seed_analysis = Some(seed);
        Ok(())
    }
}
