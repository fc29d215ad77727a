use crate::interpret::{Interpretation, InterpretationPatch, Interpreter, ReviewListener};
use crate::pipeline::analysis::ProjectAnalysis;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Wires review listeners into the code inspection goal; never material
pub struct CodeInspectionInterpreter {
    listeners: Vec<Arc<dyn ReviewListener>>,
}

impl CodeInspectionInterpreter {
    pub fn new(listeners: Vec<Arc<dyn ReviewListener>>) -> Self {
        Self { listeners }
    }
}

#[async_trait]
impl Interpreter for CodeInspectionInterpreter {
    fn name(&self) -> &str {
        "code-inspection"
    }

    async fn enrich(&self, _analysis: &ProjectAnalysis, _interpretation: &Interpretation) -> Result<InterpretationPatch> {
        Ok(self
            .listeners
            .iter()
            .cloned()
            .fold(InterpretationPatch::none(), InterpretationPatch::with_review_listener))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::{apply_patch, NotifyingReviewListener};
    use crate::notify::RecordingNotifier;
    use crate::testing::{analysis, project};

    #[tokio::test]
    async fn test_registers_listeners_without_material_change() {
        let listener: Arc<dyn ReviewListener> = Arc::new(NotifyingReviewListener::new(Arc::new(RecordingNotifier::new())));
        let interpreter = CodeInspectionInterpreter::new(vec![listener]);
        let a = analysis(&project(&[]));

        let patch = interpreter.enrich(&a, &Interpretation::default()).await.unwrap();
        assert!(!patch.material);
        assert!(patch.slots.is_empty());

        let interpretation = apply_patch(Interpretation::default(), interpreter.name(), patch);
        assert_eq!(interpretation.review_listeners.len(), 1);
        assert!(!interpretation.is_material());
    }
}
