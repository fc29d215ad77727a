//! stackgoals - stack detection and goal composition for a software delivery machine
//!
//! Given a project snapshot and a push, the crate detects which technology
//! stacks the project uses and turns them into a graph of goals for an
//! external scheduler.
//!
//! # Core Concepts
//!
//! - **Scanners** look at project files and produce typed
//!   [`TechnologyElement`]s, aggregated into a [`ProjectAnalysis`]
//! - **Interpreters** read the analysis and contribute goals through
//!   [`InterpretationPatch`]es folded in registration order
//! - **Transform recipes** describe how a project used as a generator seed
//!   becomes a new project
//! - The [`Machine`] applies enablement, material-change and branch policy to
//!   a push and hands back a [`GoalGraph`]
//!
//! # Example Usage
//!
//! ```ignore
//! use stackgoals::{default_analyzer, Machine, MachineConfig, Preferences, StaticDeploymentClient};
//! use std::sync::Arc;
//!
//! let client = Arc::new(StaticDeploymentClient::new(Vec::new()));
//! let analyzer = default_analyzer(client.clone(), Vec::new()).build();
//! let machine = Machine::new(MachineConfig::from_env()?, analyzer, Preferences::in_memory(), client);
//! let plan = machine.plan_push(&project, &push).await?;
//! ```

pub mod cli;
pub mod config;
pub mod fs;
pub mod github;
pub mod goals;
pub mod interpret;
pub mod interpreters;
pub mod k8s;
pub mod machine;
pub mod notify;
pub mod pipeline;
pub mod preference;
pub mod progress;
pub mod project;
pub mod seed;
pub mod stack;
pub mod transform;
pub mod util;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, ExtendedGoals, MachineConfig};
pub use goals::{Goal, GoalGraph, GoalSlot, Goals};
pub use interpret::{Interpretation, InterpretationPatch, Interpreter};
pub use k8s::{DeploymentClient, StaticDeploymentClient};
pub use machine::{Machine, PlannedPush, PushPlan};
pub use notify::{Message, Notifier};
pub use pipeline::{default_analyzer, ProjectAnalysis, ProjectAnalyzer};
pub use preference::Preferences;
pub use project::{Project, PushContext, RepoRef};
pub use stack::{ScanContext, ScanOptions, TechnologyElement, TechnologyId};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
