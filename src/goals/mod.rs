//! Goals, goal collections and the goal graph handed to the scheduler

pub mod collection;
pub mod definition;
mod execution;
pub mod fulfillment;
pub mod graph;
pub mod material;
pub mod precondition;

pub use collection::{Goals, PlannedGoal};
pub use definition::{Goal, GoalDefinition, GoalDescriptions, GoalEnvironment};
pub use fulfillment::{
    Fulfillment, GoalExecutor, GoalInvocation, GoalOutcome, GoalState, SpawnCommand,
};
pub use graph::{GoalGraph, GoalSlot, GraphError, GraphNode};
pub use material::MaterialChangeTest;
pub use precondition::{Condition, PreCondition, PreConditionOutcome};
