//! Poll-based gates in front of goals
//!
//! A [`PreCondition`] re-checks a [`Condition`] until it holds, a retry
//! budget runs out, a wall-clock deadline passes or the owning goal is
//! cancelled. Every constructor bounds the loop.

use crate::project::PushContext;
use anyhow::Result;
use async_trait::async_trait;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[async_trait]
pub trait Condition: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, push: &PushContext) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PreConditionOutcome {
    Satisfied,
    Exhausted,
    DeadlineReached,
    Cancelled,
}

#[derive(Clone)]
pub struct PreCondition {
    condition: Arc<dyn Condition>,
    retries: Option<u32>,
    interval: Duration,
    deadline: Option<Duration>,
    proceed_on_deadline: bool,
}

impl PreCondition {
    /// Check up to `retries` times, `interval` apart; at least once
    pub fn polling(condition: Arc<dyn Condition>, retries: u32, interval: Duration) -> Self {
        Self {
            condition,
            retries: Some(retries.max(1)),
            interval,
            deadline: None,
            proceed_on_deadline: false,
        }
    }

    /// Check every `interval` until `deadline` has passed, then let the goal run anyway
    pub fn until_deadline(condition: Arc<dyn Condition>, interval: Duration, deadline: Duration) -> Self {
        Self {
            condition,
            retries: None,
            interval,
            deadline: Some(deadline),
            proceed_on_deadline: true,
        }
    }

    pub fn retries(&self) -> Option<u32> {
        self.retries
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn condition_name(&self) -> &str {
        self.condition.name()
    }

    /// Whether the goal may run after `outcome`
    pub fn permits(&self, outcome: PreConditionOutcome) -> bool {
        match outcome {
            PreConditionOutcome::Satisfied => true,
            PreConditionOutcome::DeadlineReached => self.proceed_on_deadline,
            PreConditionOutcome::Exhausted | PreConditionOutcome::Cancelled => false,
        }
    }

    pub async fn wait(&self, push: &PushContext, cancellation: &CancellationToken) -> PreConditionOutcome {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            if cancellation.is_cancelled() {
                return PreConditionOutcome::Cancelled;
            }

            match self.condition.check(push).await {
                Ok(true) => {
                    debug!(condition = self.condition.name(), attempts = attempts + 1, "Precondition satisfied");
                    return PreConditionOutcome::Satisfied;
                }
                Ok(false) => {}
                Err(e) => warn!(condition = self.condition.name(), "Precondition check failed: {:#}", e),
            }
            attempts += 1;

            if let Some(retries) = self.retries {
                if attempts >= retries {
                    return PreConditionOutcome::Exhausted;
                }
            }

            let mut pause = self.interval;
            if let Some(deadline) = self.deadline {
                let elapsed = started.elapsed();
                if elapsed >= deadline {
                    return PreConditionOutcome::DeadlineReached;
                }
                pause = pause.min(deadline - elapsed);
            }

            tokio::select! {
                _ = cancellation.cancelled() => return PreConditionOutcome::Cancelled,
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }
}

impl fmt::Debug for PreCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreCondition")
            .field("condition", &self.condition.name())
            .field("retries", &self.retries)
            .field("interval", &self.interval)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Serialize for PreCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PreCondition", 4)?;
        state.serialize_field("condition", self.condition.name())?;
        state.serialize_field("retries", &self.retries)?;
        state.serialize_field("intervalSeconds", &self.interval.as_secs())?;
        state.serialize_field("deadlineSeconds", &self.deadline.map(|d| d.as_secs()))?;
        state.end()
    }
}
