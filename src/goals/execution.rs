use super::definition::Goal;
use super::fulfillment::{Fulfillment, GoalInvocation, GoalOutcome};
use anyhow::{Context, Result};
use tracing::{debug, info};

impl Goal {
    /// Wait for the precondition, then run an in-process executor.
    ///
    /// Spawn and external fulfillments are reported as delegated; the
    /// scheduler runs those itself.
    pub async fn execute(&self, invocation: &GoalInvocation) -> Result<GoalOutcome> {
        if let Some(pre_condition) = &self.pre_condition {
            let outcome = pre_condition
                .wait(&invocation.push, &invocation.cancellation)
                .await;
            debug!(goal = self.name(), outcome = ?outcome, "Precondition finished");
            if !pre_condition.permits(outcome) {
                if invocation.cancellation.is_cancelled() {
                    return Ok(GoalOutcome::canceled());
                }
                return Ok(GoalOutcome::failure(format!(
                    "Precondition '{}' not met",
                    pre_condition.condition_name()
                )));
            }
        }

        match &self.fulfillment {
            Fulfillment::Executor(executor) => {
                info!(goal = self.name(), executor = executor.name(), "Executing goal");
                executor
                    .execute(invocation)
                    .await
                    .with_context(|| format!("Goal {} failed", self.name()))
            }
            Fulfillment::Spawn(_) | Fulfillment::External { .. } => Ok(GoalOutcome::delegated()),
        }
    }
}
