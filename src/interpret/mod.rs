//! Interpretation of a project analysis into goals
//!
//! Interpreters never mutate the [`Interpretation`] they read. Each returns an
//! [`InterpretationPatch`] and [`apply_patch`] folds the patches in
//! registration order:
//!
//! - `Set` fills an empty slot; on an occupied slot the existing goals stay
//!   and a [`SlotConflict`] is recorded
//! - `Extend` appends to a slot, or fills it when empty
//! - `Replace` and `Clear` override whatever is there
//! - material-change tests, autofixes, inspections and review listeners
//!   always accumulate

pub mod interpreter;
pub mod registration;

use crate::goals::{GoalSlot, Goals, MaterialChangeTest};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub use interpreter::{Interpreter, RegisteredInterpreter, RunCondition};
pub use registration::{
    AutofixRegistration, CodeInspection, InspectionRegistration, NotifyingReviewListener,
    ProjectReview, ReviewComment, ReviewListener, Severity, SourceLocation,
};

/// What one interpreter wants done to a slot
#[derive(Debug, Clone, Default)]
pub enum SlotChange {
    #[default]
    Keep,
    Set(Goals),
    Extend(Goals),
    Replace(Goals),
    Clear,
}

#[derive(Debug, Clone, Default)]
pub struct InterpretationPatch {
    /// The interpreter changed something that matters for the push
    pub material: bool,
    pub slots: BTreeMap<GoalSlot, SlotChange>,
    pub material_change_push_tests: Vec<MaterialChangeTest>,
    pub autofixes: Vec<AutofixRegistration>,
    pub inspections: Vec<InspectionRegistration>,
    pub review_listeners: Vec<Arc<dyn ReviewListener>>,
}

impl InterpretationPatch {
    /// Nothing to contribute
    pub fn none() -> Self {
        Self::default()
    }

    pub fn material() -> Self {
        Self {
            material: true,
            ..Self::default()
        }
    }

    pub fn set(mut self, slot: GoalSlot, goals: Goals) -> Self {
        self.slots.insert(slot, SlotChange::Set(goals));
        self
    }

    pub fn extend(mut self, slot: GoalSlot, goals: Goals) -> Self {
        self.slots.insert(slot, SlotChange::Extend(goals));
        self
    }

    pub fn replace(mut self, slot: GoalSlot, goals: Goals) -> Self {
        self.slots.insert(slot, SlotChange::Replace(goals));
        self
    }

    pub fn clear(mut self, slot: GoalSlot) -> Self {
        self.slots.insert(slot, SlotChange::Clear);
        self
    }

    pub fn with_material_change_test(mut self, test: MaterialChangeTest) -> Self {
        self.material_change_push_tests.push(test);
        self
    }

    pub fn with_autofix(mut self, autofix: AutofixRegistration) -> Self {
        self.autofixes.push(autofix);
        self
    }

    pub fn with_inspection(mut self, inspection: InspectionRegistration) -> Self {
        self.inspections.push(inspection);
        self
    }

    pub fn with_review_listener(mut self, listener: Arc<dyn ReviewListener>) -> Self {
        self.review_listeners.push(listener);
        self
    }

    pub fn change(&self, slot: GoalSlot) -> Option<&SlotChange> {
        self.slots.get(&slot)
    }
}

/// A `Set` that lost to goals already in the slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotConflict {
    pub slot: GoalSlot,
    pub interpreter: String,
    pub kept: Vec<String>,
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_goals: Option<Goals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_goals: Option<Goals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_goals: Option<Goals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_build_goals: Option<Goals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_goals: Option<Goals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_goals: Option<Goals>,
    pub material_change_push_tests: Vec<MaterialChangeTest>,
    pub autofixes: Vec<AutofixRegistration>,
    pub inspections: Vec<InspectionRegistration>,
    #[serde(skip)]
    pub review_listeners: Vec<Arc<dyn ReviewListener>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<SlotConflict>,
    /// Interpreters that reported a material contribution, in order
    pub material_interpreters: Vec<String>,
}

impl Interpretation {
    pub fn slot(&self, slot: GoalSlot) -> Option<&Goals> {
        match slot {
            GoalSlot::Check => self.check_goals.as_ref(),
            GoalSlot::Build => self.build_goals.as_ref(),
            GoalSlot::Test => self.test_goals.as_ref(),
            GoalSlot::ContainerBuild => self.container_build_goals.as_ref(),
            GoalSlot::Deploy => self.deploy_goals.as_ref(),
            GoalSlot::Release => self.release_goals.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: GoalSlot) -> &mut Option<Goals> {
        match slot {
            GoalSlot::Check => &mut self.check_goals,
            GoalSlot::Build => &mut self.build_goals,
            GoalSlot::Test => &mut self.test_goals,
            GoalSlot::ContainerBuild => &mut self.container_build_goals,
            GoalSlot::Deploy => &mut self.deploy_goals,
            GoalSlot::Release => &mut self.release_goals,
        }
    }

    pub fn is_material(&self) -> bool {
        !self.material_interpreters.is_empty()
    }

    /// Every goal name planned in any slot
    pub fn goal_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for slot in std::iter::once(GoalSlot::Check).chain(GoalSlot::STAGES) {
            if let Some(goals) = self.slot(slot) {
                names.extend(goals.names());
            }
        }
        names
    }
}

/// Fold one interpreter's patch into the interpretation
pub fn apply_patch(mut interpretation: Interpretation, interpreter: &str, patch: InterpretationPatch) -> Interpretation {
    for (slot, change) in patch.slots {
        let current = interpretation.slot_mut(slot);
        match change {
            SlotChange::Keep => {}
            SlotChange::Set(goals) => match current.take() {
                None => *current = Some(goals),
                Some(existing) => {
                    let conflict = SlotConflict {
                        slot,
                        interpreter: interpreter.to_string(),
                        kept: existing.names(),
                        rejected: goals.names(),
                    };
                    *current = Some(existing);
                    warn!(
                        slot = %slot,
                        interpreter,
                        "Slot already planned; keeping existing goals"
                    );
                    interpretation.conflicts.push(conflict);
                }
            },
            SlotChange::Extend(goals) => match current.take() {
                None => *current = Some(goals),
                Some(mut existing) => {
                    existing.extend(goals);
                    *current = Some(existing);
                }
            },
            SlotChange::Replace(goals) => {
                if current.is_some() {
                    debug!(slot = %slot, interpreter, "Replacing planned goals");
                }
                *current = Some(goals);
            }
            SlotChange::Clear => {
                if current.take().is_some() {
                    debug!(slot = %slot, interpreter, "Cleared planned goals");
                }
            }
        }
    }

    interpretation
        .material_change_push_tests
        .extend(patch.material_change_push_tests);
    interpretation.autofixes.extend(patch.autofixes);
    interpretation.inspections.extend(patch.inspections);
    interpretation.review_listeners.extend(patch.review_listeners);
    if patch.material {
        interpretation.material_interpreters.push(interpreter.to_string());
    }
    interpretation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::{Fulfillment, Goal, GoalDefinition, SpawnCommand};

    fn goals(collection: &str, names: &[&str]) -> Goals {
        names.iter().fold(Goals::new(collection), |acc, name| {
            acc.plan(Goal::new(
                GoalDefinition::new(*name, *name),
                Fulfillment::Spawn(vec![SpawnCommand::parse("true")]),
            ))
        })
    }

    #[test]
    fn test_set_fills_empty_slot() {
        let patch = InterpretationPatch::material().set(GoalSlot::Build, goals("build", &["npm-run-build"]));
        let interpretation = apply_patch(Interpretation::default(), "node", patch);
        assert_eq!(interpretation.build_goals.unwrap().names(), vec!["npm-run-build"]);
        assert_eq!(interpretation.material_interpreters, vec!["node"]);
    }

    #[test]
    fn test_set_on_occupied_slot_is_conflict() {
        let first = InterpretationPatch::material().set(GoalSlot::Build, goals("build", &["npm-run-build"]));
        let second = InterpretationPatch::material().set(GoalSlot::Build, goals("build", &["dotnet-build"]));

        let interpretation = apply_patch(Interpretation::default(), "node", first);
        let interpretation = apply_patch(interpretation, "dotnetcore", second);

        assert_eq!(interpretation.build_goals.as_ref().unwrap().names(), vec!["npm-run-build"]);
        assert_eq!(
            interpretation.conflicts,
            vec![SlotConflict {
                slot: GoalSlot::Build,
                interpreter: "dotnetcore".to_string(),
                kept: vec!["npm-run-build".to_string()],
                rejected: vec!["dotnet-build".to_string()],
            }]
        );
    }

    #[test]
    fn test_extend_appends() {
        let interpretation = apply_patch(
            Interpretation::default(),
            "a",
            InterpretationPatch::none().extend(GoalSlot::Check, goals("checks", &["fingerprint"])),
        );
        let interpretation = apply_patch(
            interpretation,
            "b",
            InterpretationPatch::none().extend(GoalSlot::Check, goals("more", &["autofix", "fingerprint"])),
        );
        assert_eq!(interpretation.check_goals.unwrap().names(), vec!["fingerprint", "autofix"]);
        assert!(interpretation.material_interpreters.is_empty());
    }

    #[test]
    fn test_replace_and_clear_override() {
        let interpretation = apply_patch(
            Interpretation::default(),
            "node",
            InterpretationPatch::material()
                .set(GoalSlot::Build, goals("build", &["npm-run-build"]))
                .set(GoalSlot::Test, goals("test", &["npm-run-test"])),
        );
        let interpretation = apply_patch(
            interpretation,
            "travis",
            InterpretationPatch::material()
                .replace(GoalSlot::Build, goals("build", &["travis"]))
                .clear(GoalSlot::Test),
        );
        assert_eq!(interpretation.build_goals.as_ref().unwrap().names(), vec!["travis"]);
        assert!(interpretation.test_goals.is_none());
        assert!(interpretation.conflicts.is_empty());
    }

    #[test]
    fn test_material_tests_accumulate() {
        let interpretation = apply_patch(
            Interpretation::default(),
            "node",
            InterpretationPatch::none().with_material_change_test(MaterialChangeTest::new().with_extensions(&["js"])),
        );
        let interpretation = apply_patch(
            interpretation,
            "docker",
            InterpretationPatch::none().with_material_change_test(MaterialChangeTest::new().with_files(&["Dockerfile"])),
        );
        assert_eq!(interpretation.material_change_push_tests.len(), 2);
        assert!(!interpretation.is_material());
    }

    #[test]
    fn test_goal_names_in_slot_order() {
        let interpretation = Interpretation {
            build_goals: Some(goals("build", &["version", "npm-run-build"])),
            check_goals: Some(goals("checks", &["node-fingerprint"])),
            ..Interpretation::default()
        };
        assert_eq!(interpretation.goal_names(), vec!["node-fingerprint", "version", "npm-run-build"]);
    }
}
