//! Composition of slot goal collections into one validated DAG

use super::collection::Goals;
use super::definition::Goal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Interpretation slot a goal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GoalSlot {
    Check,
    Build,
    Test,
    ContainerBuild,
    Deploy,
    Release,
}

impl GoalSlot {
    /// Slots chained one after another, in order
    pub const STAGES: [GoalSlot; 5] = [
        GoalSlot::Build,
        GoalSlot::Test,
        GoalSlot::ContainerBuild,
        GoalSlot::Deploy,
        GoalSlot::Release,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalSlot::Check => "check",
            GoalSlot::Build => "build",
            GoalSlot::Test => "test",
            GoalSlot::ContainerBuild => "container build",
            GoalSlot::Deploy => "deploy",
            GoalSlot::Release => "release",
        }
    }
}

impl fmt::Display for GoalSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Goal '{0}' is planned more than once")]
    DuplicateGoal(String),

    #[error("Goal '{goal}' is planned after unknown goal '{dependency}'")]
    MissingDependency { goal: String, dependency: String },

    #[error("Goals form a cycle: {}", .0.join(", "))]
    Cycle(Vec<String>),
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub slot: GoalSlot,
    pub goal: Goal,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
}

impl GraphNode {
    pub fn name(&self) -> &str {
        self.goal.name()
    }
}

/// Validated, acyclic goal graph handed to the scheduler
#[derive(Debug, Clone, Default, Serialize)]
pub struct GoalGraph {
    nodes: Vec<GraphNode>,
}

impl GoalGraph {
    /// Compose check goals and staged slots.
    ///
    /// Check goals stand alone. Each staged slot's entry goals (those not
    /// waiting on a goal of their own slot) are planned after every goal of
    /// the closest earlier non-empty stage.
    pub fn compose(checks: Option<Goals>, stages: Vec<(GoalSlot, Goals)>) -> Result<Self, GraphError> {
        let mut nodes = Vec::new();

        if let Some(checks) = checks {
            for planned in checks.into_goals() {
                nodes.push(GraphNode {
                    slot: GoalSlot::Check,
                    goal: planned.goal,
                    after: planned.after,
                });
            }
        }

        let mut previous_stage: Vec<String> = Vec::new();
        for (slot, goals) in stages {
            if goals.is_empty() {
                continue;
            }
            let own_names: HashSet<String> = goals.names().into_iter().collect();
            let stage_names = goals.names();

            for planned in goals.into_goals() {
                let mut after = planned.after;
                let is_entry = !after.iter().any(|a| own_names.contains(a));
                if is_entry {
                    for name in &previous_stage {
                        if !after.contains(name) {
                            after.push(name.clone());
                        }
                    }
                }
                nodes.push(GraphNode {
                    slot,
                    goal: planned.goal,
                    after,
                });
            }
            previous_stage = stage_names;
        }

        let graph = Self { nodes };
        graph.validate()?;
        debug!(goals = graph.nodes.len(), "Composed goal graph");
        Ok(graph)
    }

    fn validate(&self) -> Result<(), GraphError> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.name()) {
                return Err(GraphError::DuplicateGoal(node.name().to_string()));
            }
        }
        for node in &self.nodes {
            if let Some(missing) = node.after.iter().find(|a| !seen.contains(a.as_str())) {
                return Err(GraphError::MissingDependency {
                    goal: node.name().to_string(),
                    dependency: missing.clone(),
                });
            }
        }
        self.topological_order().map(|_| ())
    }

    /// Goal names with every goal after its dependencies; ties keep planning order
    pub fn topological_order(&self) -> Result<Vec<&str>, GraphError> {
        let index: HashMap<&str, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.name(), i))
            .collect();

        let mut in_degree = vec![0usize; self.nodes.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            for dependency in &node.after {
                if let Some(&d) = index.get(dependency.as_str()) {
                    in_degree[i] += 1;
                    dependents[d].push(i);
                }
            }
        }

        let mut queue: VecDeque<usize> = (0..self.nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(i) = queue.pop_front() {
            order.push(i);
            for &dependent in &dependents[i] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if order.len() < self.nodes.len() {
            let mut remaining: Vec<String> = (0..self.nodes.len())
                .filter(|i| !order.contains(i))
                .map(|i| self.nodes[i].name().to_string())
                .collect();
            remaining.sort();
            return Err(GraphError::Cycle(remaining));
        }

        Ok(order.into_iter().map(|i| self.nodes[i].name()).collect())
    }

    /// Drop a goal; goals that waited on it now wait on its dependencies instead
    pub fn remove_goal(&mut self, name: &str) -> Option<GraphNode> {
        let position = self.nodes.iter().position(|n| n.name() == name)?;
        let removed = self.nodes.remove(position);

        for node in &mut self.nodes {
            if let Some(at) = node.after.iter().position(|a| a == name) {
                node.after.remove(at);
                for inherited in &removed.after {
                    if !node.after.contains(inherited) {
                        node.after.push(inherited.clone());
                    }
                }
            }
        }
        Some(removed)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn get(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name()).collect()
    }

    pub fn in_slot(&self, slot: GoalSlot) -> Vec<&GraphNode> {
        self.nodes.iter().filter(|n| n.slot == slot).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::{Fulfillment, GoalDefinition, SpawnCommand};

    fn goal(name: &str) -> Goal {
        Goal::new(
            GoalDefinition::new(name, name),
            Fulfillment::Spawn(vec![SpawnCommand::parse("true")]),
        )
    }

    fn position(order: &[&str], name: &str) -> usize {
        order.iter().position(|n| *n == name).unwrap()
    }

    #[test]
    fn test_stages_are_chained() {
        let build = Goals::new("build")
            .plan(goal("version"))
            .plan_after(goal("npm-run-build"), &["version"]);
        let test = Goals::new("test").plan(goal("npm-run-test"));
        let container = Goals::new("container").plan(goal("kaniko"));
        let checks = Goals::new("checks").plan(goal("node-fingerprint"));

        let graph = GoalGraph::compose(
            Some(checks),
            vec![
                (GoalSlot::Build, build),
                (GoalSlot::Test, test),
                (GoalSlot::ContainerBuild, container),
                (GoalSlot::Deploy, Goals::new("deploy")),
            ],
        )
        .unwrap();

        assert_eq!(graph.get("npm-run-test").unwrap().after, vec!["version", "npm-run-build"]);
        assert_eq!(graph.get("kaniko").unwrap().after, vec!["npm-run-test"]);
        assert!(graph.get("node-fingerprint").unwrap().after.is_empty());
        assert_eq!(graph.get("npm-run-build").unwrap().after, vec!["version"]);

        let order = graph.topological_order().unwrap();
        assert!(position(&order, "version") < position(&order, "npm-run-build"));
        assert!(position(&order, "npm-run-build") < position(&order, "npm-run-test"));
        assert!(position(&order, "npm-run-test") < position(&order, "kaniko"));
        assert_eq!(graph.in_slot(GoalSlot::Check).len(), 1);
    }

    #[test]
    fn test_container_follows_build_when_no_tests() {
        let graph = GoalGraph::compose(
            None,
            vec![
                (GoalSlot::Build, Goals::new("build").plan(goal("dotnet-build"))),
                (GoalSlot::Test, Goals::new("test")),
                (GoalSlot::ContainerBuild, Goals::new("container").plan(goal("kaniko"))),
            ],
        )
        .unwrap();
        assert_eq!(graph.get("kaniko").unwrap().after, vec!["dotnet-build"]);
    }

    #[test]
    fn test_cross_collection_reference() {
        let checks = Goals::new("checks").plan(goal("fingerprint"));
        let build = Goals::new("build").plan_after_goals(goal("travis"), &checks);
        let graph = GoalGraph::compose(Some(checks), vec![(GoalSlot::Build, build)]).unwrap();
        assert_eq!(graph.topological_order().unwrap(), vec!["fingerprint", "travis"]);
    }

    #[test]
    fn test_missing_dependency() {
        let build = Goals::new("build").plan_after(goal("build"), &["version"]);
        let err = GoalGraph::compose(None, vec![(GoalSlot::Build, build)]).unwrap_err();
        assert_eq!(
            err,
            GraphError::MissingDependency {
                goal: "build".to_string(),
                dependency: "version".to_string()
            }
        );
    }

    #[test]
    fn test_cycle_detected() {
        let build = Goals::new("build")
            .plan_after(goal("a"), &["b"])
            .plan_after(goal("b"), &["a"]);
        let err = GoalGraph::compose(None, vec![(GoalSlot::Build, build)]).unwrap_err();
        assert_eq!(err, GraphError::Cycle(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_duplicate_across_slots() {
        let err = GoalGraph::compose(
            Some(Goals::new("checks").plan(goal("x"))),
            vec![(GoalSlot::Build, Goals::new("build").plan(goal("x")))],
        )
        .unwrap_err();
        assert_eq!(err, GraphError::DuplicateGoal("x".to_string()));
    }

    #[test]
    fn test_remove_goal_rewires_edges() {
        let mut graph = GoalGraph::compose(
            None,
            vec![
                (GoalSlot::Build, Goals::new("build").plan(goal("build"))),
                (GoalSlot::Test, Goals::new("test").plan(goal("test"))),
                (GoalSlot::ContainerBuild, Goals::new("container").plan(goal("kaniko"))),
            ],
        )
        .unwrap();

        let removed = graph.remove_goal("test").unwrap();
        assert_eq!(removed.slot, GoalSlot::Test);
        assert_eq!(graph.get("kaniko").unwrap().after, vec!["build"]);
        assert_eq!(graph.topological_order().unwrap(), vec!["build", "kaniko"]);
        assert!(graph.remove_goal("test").is_none());
    }
}
