//! How a goal gets its work done

use crate::project::{Project, PushContext};
use anyhow::Result;
use async_trait::async_trait;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One process launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnCommand {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl SpawnCommand {
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
        }
    }

    /// Split a command line on whitespace; no shell quoting is understood
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default().to_string();
        Self::new(command, parts)
    }

    pub fn with_env(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalState {
    Success,
    Failure,
    Canceled,
    /// Handed back to the scheduler, which runs spawn and external goals
    Delegated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalOutcome {
    pub state: GoalState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl GoalOutcome {
    pub fn success() -> Self {
        Self {
            state: GoalState::Success,
            description: None,
            data: None,
        }
    }

    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            state: GoalState::Failure,
            description: Some(description.into()),
            data: None,
        }
    }

    pub fn canceled() -> Self {
        Self {
            state: GoalState::Canceled,
            description: None,
            data: None,
        }
    }

    pub fn delegated() -> Self {
        Self {
            state: GoalState::Delegated,
            description: None,
            data: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_success(&self) -> bool {
        self.state == GoalState::Success
    }
}

/// Everything an executor may look at
#[derive(Debug, Clone)]
pub struct GoalInvocation {
    pub project: Project,
    pub push: PushContext,
    pub cancellation: CancellationToken,
}

impl GoalInvocation {
    pub fn new(project: Project, push: PushContext) -> Self {
        Self {
            project,
            push,
            cancellation: CancellationToken::new(),
        }
    }
}

/// In-process goal implementation
#[async_trait]
pub trait GoalExecutor: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, invocation: &GoalInvocation) -> Result<GoalOutcome>;
}

#[derive(Clone)]
pub enum Fulfillment {
    Spawn(Vec<SpawnCommand>),
    /// Run by a named tool outside the machine
    External { tool: String },
    Executor(Arc<dyn GoalExecutor>),
}

impl Fulfillment {
    pub fn external(tool: impl Into<String>) -> Self {
        Fulfillment::External { tool: tool.into() }
    }

    pub fn spawn_commands(&self) -> &[SpawnCommand] {
        match self {
            Fulfillment::Spawn(commands) => commands,
            _ => &[],
        }
    }
}

impl fmt::Debug for Fulfillment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fulfillment::Spawn(commands) => f.debug_tuple("Spawn").field(commands).finish(),
            Fulfillment::External { tool } => {
                f.debug_struct("External").field("tool", tool).finish()
            }
            Fulfillment::Executor(executor) => {
                f.debug_tuple("Executor").field(&executor.name()).finish()
            }
        }
    }
}

impl Serialize for Fulfillment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Fulfillment::Spawn(commands) => {
                let mut state = serializer.serialize_struct("Fulfillment", 2)?;
                state.serialize_field("type", "spawn")?;
                state.serialize_field("commands", commands)?;
                state.end()
            }
            Fulfillment::External { tool } => {
                let mut state = serializer.serialize_struct("Fulfillment", 2)?;
                state.serialize_field("type", "external")?;
                state.serialize_field("tool", tool)?;
                state.end()
            }
            Fulfillment::Executor(executor) => {
                let mut state = serializer.serialize_struct("Fulfillment", 2)?;
                state.serialize_field("type", "executor")?;
                state.serialize_field("name", executor.name())?;
                state.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl GoalExecutor for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        async fn execute(&self, _invocation: &GoalInvocation) -> Result<GoalOutcome> {
            Ok(GoalOutcome::success())
        }
    }

    #[test]
    fn test_parse_command_line() {
        let command = SpawnCommand::parse("npm  run build");
        assert_eq!(command.command, "npm");
        assert_eq!(command.args, vec!["run", "build"]);
        assert_eq!(command.command_line(), "npm run build");
    }

    #[test]
    fn test_with_env() {
        let env = BTreeMap::from([("DB".to_string(), "postgres".to_string())]);
        let command = SpawnCommand::parse("npm test").with_env(&env);
        assert_eq!(command.env["DB"], "postgres");
    }

    #[test]
    fn test_serialize_variants() {
        let external = serde_json::to_value(Fulfillment::external("travis")).unwrap();
        assert_eq!(external["type"], "external");
        assert_eq!(external["tool"], "travis");

        let executor = serde_json::to_value(Fulfillment::Executor(Arc::new(Noop))).unwrap();
        assert_eq!(executor["type"], "executor");
        assert_eq!(executor["name"], "noop");
        assert_eq!(format!("{:?}", Fulfillment::Executor(Arc::new(Noop))), "Executor(\"noop\")");
    }
}
