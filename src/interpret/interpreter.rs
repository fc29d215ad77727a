use super::{Interpretation, InterpretationPatch};
use crate::pipeline::analysis::ProjectAnalysis;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Turns detected technology into goal contributions
#[async_trait]
pub trait Interpreter: Send + Sync {
    fn name(&self) -> &str;

    /// Contribution given the analysis and everything interpreted so far.
    /// Absent technology yields [`InterpretationPatch::none`].
    async fn enrich(&self, analysis: &ProjectAnalysis, interpretation: &Interpretation) -> Result<InterpretationPatch>;
}

/// Guard deciding whether an interpreter takes part at all
pub type RunCondition = Arc<dyn Fn(&ProjectAnalysis) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct RegisteredInterpreter {
    pub interpreter: Arc<dyn Interpreter>,
    pub condition: Option<RunCondition>,
}

impl RegisteredInterpreter {
    pub fn new(interpreter: Arc<dyn Interpreter>) -> Self {
        Self {
            interpreter,
            condition: None,
        }
    }

    pub fn when(mut self, condition: RunCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn name(&self) -> &str {
        self.interpreter.name()
    }

    pub fn should_run(&self, analysis: &ProjectAnalysis) -> bool {
        self.condition.as_ref().map(|c| c(analysis)).unwrap_or(true)
    }
}

impl fmt::Debug for RegisteredInterpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredInterpreter")
            .field("name", &self.name())
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}
