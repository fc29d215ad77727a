//! Travis CI: emulate simple builds locally, hand the rest back to Travis
//!
//! These are the only interpreters allowed to override goals planned by
//! others.

use crate::goals::{Fulfillment, Goal, GoalDefinition, GoalSlot, Goals, SpawnCommand};
use crate::interpret::{Interpretation, InterpretationPatch, Interpreter};
use crate::k8s::mongo_for;
use crate::pipeline::analysis::ProjectAnalysis;
use crate::stack::TravisCi;
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

const MONGO_TAG: &str = "latest";

fn emulation_commands(travis: &TravisCi) -> Vec<SpawnCommand> {
    travis
        .scripts
        .iter()
        .map(String::as_str)
        .chain(std::iter::once("echo after_success"))
        .chain(travis.after_success.iter().map(String::as_str))
        .map(|line| SpawnCommand::parse(line).with_env(&travis.env))
        .collect()
}

/// Runs the Travis `script` and `after_success` steps in the machine
pub struct EmulateTravisInterpreter;

#[async_trait]
impl Interpreter for EmulateTravisInterpreter {
    fn name(&self) -> &str {
        "emulate-travis"
    }

    async fn enrich(&self, analysis: &ProjectAnalysis, interpretation: &Interpretation) -> Result<InterpretationPatch> {
        let Some(travis) = analysis.travis() else {
            return Ok(InterpretationPatch::none());
        };
        if interpretation.build_goals.is_some()
            || interpretation.test_goals.is_some()
            || travis.uses_unsupported_features()
            || travis.scripts.is_empty()
        {
            debug!(repo = %analysis.id.slug(), "Travis build not emulated");
            return Ok(InterpretationPatch::none());
        }

        let services = if travis.services.is_empty() {
            &analysis.services
        } else {
            &travis.services
        };
        let mut goal = Goal::new(
            GoalDefinition::new("travis-emulation", "Travis emulation build").isolated(),
            Fulfillment::Spawn(emulation_commands(travis)),
        );
        if let Some(mongo) = mongo_for(services, MONGO_TAG) {
            goal = goal.with_service(mongo);
        }

        Ok(InterpretationPatch::material()
            .set(GoalSlot::Build, Goals::new("travis emulation").plan(goal))
            .clear(GoalSlot::Test))
    }
}

/// Replaces the build with one that waits on Travis itself
pub struct DelegateToTravisInterpreter;

#[async_trait]
impl Interpreter for DelegateToTravisInterpreter {
    fn name(&self) -> &str {
        "delegate-travis"
    }

    async fn enrich(&self, analysis: &ProjectAnalysis, interpretation: &Interpretation) -> Result<InterpretationPatch> {
        let Some(travis) = analysis.travis() else {
            return Ok(InterpretationPatch::none());
        };
        if interpretation.build_goals.is_some() && !travis.uses_unsupported_features() {
            return Ok(InterpretationPatch::none());
        }

        let goal = Goal::new(GoalDefinition::new("travis", "Travis Build"), Fulfillment::external("travis"));
        let build = match &interpretation.check_goals {
            Some(checks) => Goals::new("travis build").plan_after_goals(goal, checks),
            None => Goals::new("travis build").plan(goal),
        };
        Ok(InterpretationPatch::material()
            .replace(GoalSlot::Build, build)
            .clear(GoalSlot::Test))
    }
}
