use crate::interpret::{apply_patch, InterpretationPatch, RegisteredInterpreter};
use crate::pipeline::context::AnalysisContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use crate::progress::{ProgressEvent, ProgressHandler};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Folds each interpreter's patch into the interpretation, in registration order
pub struct InterpretPhase {
    interpreters: Arc<Vec<RegisteredInterpreter>>,
    progress: Option<Arc<dyn ProgressHandler>>,
}

impl InterpretPhase {
    pub fn new(interpreters: Arc<Vec<RegisteredInterpreter>>, progress: Option<Arc<dyn ProgressHandler>>) -> Self {
        Self { interpreters, progress }
    }
}

#[async_trait]
impl WorkflowPhase for InterpretPhase {
    fn name(&self) -> &'static str {
        "interpret"
    }

    async fn execute(&self, context: &mut AnalysisContext) -> Result<()> {
        for registered in self.interpreters.iter() {
            let name = registered.name().to_string();
            if !registered.should_run(&context.analysis) {
                debug!(interpreter = %name, "Skipped by run condition");
                continue;
            }

            let patch = match registered
                .interpreter
                .enrich(&context.analysis, &context.interpretation)
                .await
            {
                Ok(patch) => patch,
                Err(e) => {
                    warn!(interpreter = %name, "Interpreter failed: {:#}", e);
                    InterpretationPatch::none()
                }
            };

            let material = patch.material;
            let interpretation = std::mem::take(&mut context.interpretation);
            context.interpretation = apply_patch(interpretation, &name, patch);

            if let Some(handler) = &self.progress {
                handler.on_progress(&ProgressEvent::InterpreterApplied {
                    interpreter: name,
                    material,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::{Fulfillment, Goal, GoalDefinition, GoalSlot, Goals};
    use crate::interpret::{Interpretation, Interpreter};
    use crate::pipeline::analysis::ProjectAnalysis;
    use crate::stack::ScanOptions;
    use crate::testing::{project, scan_context};

    struct Fixed(&'static str);

    #[async_trait]
    impl Interpreter for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        async fn enrich(&self, _analysis: &ProjectAnalysis, _interpretation: &Interpretation) -> Result<InterpretationPatch> {
            let goal = Goal::new(GoalDefinition::new(self.0, self.0), Fulfillment::external(self.0));
            Ok(InterpretationPatch::material().set(GoalSlot::Build, Goals::new(self.0).plan(goal)))
        }
    }

    struct Broken;

    #[async_trait]
    impl Interpreter for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn enrich(&self, _analysis: &ProjectAnalysis, _interpretation: &Interpretation) -> Result<InterpretationPatch> {
            anyhow::bail!("boom")
        }
    }

    fn context() -> AnalysisContext {
        AnalysisContext::new(project(&[]), scan_context(), ScanOptions::full())
    }

    #[tokio::test]
    async fn test_first_set_wins_and_failures_are_skipped() {
        let interpreters = vec![
            RegisteredInterpreter::new(Arc::new(Broken)),
            RegisteredInterpreter::new(Arc::new(Fixed("first"))),
            RegisteredInterpreter::new(Arc::new(Fixed("second"))),
        ];
        let mut context = context();
        InterpretPhase::new(Arc::new(interpreters), None)
            .execute(&mut context)
            .await
            .unwrap();

        let interpretation = &context.interpretation;
        assert_eq!(interpretation.build_goals.as_ref().unwrap().names(), vec!["first"]);
        assert_eq!(interpretation.conflicts.len(), 1);
        assert_eq!(interpretation.material_interpreters, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_run_condition_skips() {
        let interpreters = vec![RegisteredInterpreter::new(Arc::new(Fixed("guarded"))).when(Arc::new(|_| false))];
        let mut context = context();
        InterpretPhase::new(Arc::new(interpreters), None)
            .execute(&mut context)
            .await
            .unwrap();
        assert!(!context.interpretation.is_material());
    }
}
