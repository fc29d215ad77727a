use crate::pipeline::context::AnalysisContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::stack::{ScanContext, StackRegistry, TechnologyClassification};
use crate::project::Project;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Runs every scanner in registration order, each seeing what earlier ones found
pub struct ScanPhase {
    registry: Arc<StackRegistry>,
    progress: Option<Arc<dyn ProgressHandler>>,
}

impl ScanPhase {
    pub fn new(registry: Arc<StackRegistry>, progress: Option<Arc<dyn ProgressHandler>>) -> Self {
        Self { registry, progress }
    }
}

#[async_trait]
impl WorkflowPhase for ScanPhase {
    fn name(&self) -> &'static str {
        "scan"
    }

    async fn execute(&self, context: &mut AnalysisContext) -> Result<()> {
        for scanner in self.registry.scanners() {
            let id = scanner.id();
            let found = scanner
                .scan(&context.project, &context.scan, &context.analysis, context.options)
                .await;
            match found {
                Some(element) => {
                    if context.analysis.add_element(element) {
                        if let Some(handler) = &self.progress {
                            handler.on_progress(&ProgressEvent::ElementDetected {
                                technology: id.key().to_string(),
                            });
                        }
                    }
                }
                None => debug!(technology = %id.key(), "Not detected"),
            }
        }
        Ok(())
    }
}

/// Cheap classification without a full scan
pub async fn classify(
    registry: &StackRegistry,
    project: &Project,
    ctx: &ScanContext,
) -> Vec<TechnologyClassification> {
    let mut classifications = Vec::new();
    for scanner in registry.scanners() {
        if let Some(classification) = scanner.classify(project, ctx).await {
            classifications.push(classification);
        }
    }
    classifications
}
