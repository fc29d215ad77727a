use super::definition::Goal;
use serde::Serialize;
use tracing::warn;

/// A goal plus the unique names it must wait for
#[derive(Debug, Clone, Serialize)]
pub struct PlannedGoal {
    pub goal: Goal,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
}

/// Named collection of goals contributed for one slot.
///
/// `after` edges may point at goals in this collection or, by unique name,
/// at goals of another collection; the graph resolves them when composed.
#[derive(Debug, Clone, Serialize)]
pub struct Goals {
    pub name: String,
    goals: Vec<PlannedGoal>,
}

impl Goals {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            goals: Vec::new(),
        }
    }

    pub fn plan(self, goal: Goal) -> Self {
        self.plan_after(goal, &[])
    }

    pub fn plan_after(mut self, goal: Goal, after: &[&str]) -> Self {
        self.push(PlannedGoal {
            goal,
            after: after.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Plan `goal` after every goal currently in `other`
    pub fn plan_after_goals(self, goal: Goal, other: &Goals) -> Self {
        let names = other.names();
        let after: Vec<&str> = names.iter().map(String::as_str).collect();
        self.plan_after(goal, &after)
    }

    /// Append the goals of `other`; names already present are skipped
    pub fn extend(&mut self, other: Goals) {
        for planned in other.goals {
            self.push(planned);
        }
    }

    fn push(&mut self, planned: PlannedGoal) {
        if self.contains(planned.goal.name()) {
            warn!(goals = %self.name, goal = planned.goal.name(), "Goal already planned; ignoring duplicate");
            return;
        }
        self.goals.push(planned);
    }

    pub fn goals(&self) -> &[PlannedGoal] {
        &self.goals
    }

    pub fn into_goals(self) -> Vec<PlannedGoal> {
        self.goals
    }

    pub fn names(&self) -> Vec<String> {
        self.goals.iter().map(|p| p.goal.name().to_string()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.goals.iter().any(|p| p.goal.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&PlannedGoal> {
        self.goals.iter().find(|p| p.goal.name() == name)
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}
