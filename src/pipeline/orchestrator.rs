use super::context::AnalysisContext;
use super::phase_trait::WorkflowPhase;
use crate::progress::{ProgressEvent, ProgressHandler};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Runs phases in order against one context, reporting progress
pub struct PipelineOrchestrator {
    progress_handler: Option<Arc<dyn ProgressHandler>>,
}

impl PipelineOrchestrator {
    pub fn new(progress_handler: Option<Arc<dyn ProgressHandler>>) -> Self {
        Self { progress_handler }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&event);
        }
    }

    pub async fn execute(&self, phases: &[Box<dyn WorkflowPhase>], context: &mut AnalysisContext) -> Result<()> {
        let start = Instant::now();
        let repo = context.project.id().slug();
        info!("Starting analysis for: {}", repo);
        self.emit(ProgressEvent::Started { repo });

        for phase in phases {
            let phase_name = phase.name();
            info!("Phase: {}", phase_name);
            self.emit(ProgressEvent::PhaseStarted {
                phase: phase_name.to_string(),
            });

            let phase_start = Instant::now();
            let result = phase
                .execute(context)
                .await
                .with_context(|| format!("Phase {} failed", phase_name));
            if let Err(e) = result {
                self.emit(ProgressEvent::Failed {
                    error: format!("{:#}", e),
                });
                return Err(e);
            }

            self.emit(ProgressEvent::PhaseComplete {
                phase: phase_name.to_string(),
                duration: phase_start.elapsed(),
            });
            debug!("Phase {} complete", phase_name);
        }

        info!(
            "Analysis complete: {} element(s), {} goal(s)",
            context.analysis.elements.len(),
            context.interpretation.goal_names().len()
        );
        self.emit(ProgressEvent::Completed {
            elements: context.analysis.elements.len(),
            total_time: start.elapsed(),
        });
        Ok(())
    }
}
