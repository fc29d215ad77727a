use super::fulfillment::Fulfillment;
use super::precondition::PreCondition;
use crate::k8s::K8sServiceRegistration;
use serde::{Deserialize, Serialize};

/// Where a goal's work lands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalEnvironment {
    #[default]
    Code,
    Testing,
    Production,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDescriptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDefinition {
    pub unique_name: String,
    pub display_name: String,
    pub environment: GoalEnvironment,
    #[serde(default)]
    pub isolated: bool,
    #[serde(default)]
    pub retry_feasible: bool,
    #[serde(default)]
    pub descriptions: GoalDescriptions,
}

impl GoalDefinition {
    pub fn new(unique_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            unique_name: unique_name.into(),
            display_name: display_name.into(),
            environment: GoalEnvironment::Code,
            isolated: false,
            retry_feasible: false,
            descriptions: GoalDescriptions::default(),
        }
    }

    pub fn in_environment(mut self, environment: GoalEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn isolated(mut self) -> Self {
        self.isolated = true;
        self
    }

    pub fn retry_feasible(mut self) -> Self {
        self.retry_feasible = true;
        self
    }

    pub fn with_descriptions(mut self, descriptions: GoalDescriptions) -> Self {
        self.descriptions = descriptions;
        self
    }
}

/// A unit of work handed to the scheduler
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub definition: GoalDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_condition: Option<PreCondition>,
    pub fulfillment: Fulfillment,
    /// Requires a human to approve before it runs
    pub pre_approval: bool,
    /// Sidecars and volumes added to the goal's pod
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<K8sServiceRegistration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Goal {
    pub fn new(definition: GoalDefinition, fulfillment: Fulfillment) -> Self {
        Self {
            definition,
            pre_condition: None,
            fulfillment,
            pre_approval: false,
            services: Vec::new(),
            data: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.unique_name
    }

    pub fn display_name(&self) -> &str {
        &self.definition.display_name
    }

    pub fn with_pre_condition(mut self, pre_condition: PreCondition) -> Self {
        self.pre_condition = Some(pre_condition);
        self
    }

    pub fn with_pre_approval(mut self) -> Self {
        self.pre_approval = true;
        self
    }

    pub fn with_service(mut self, service: K8sServiceRegistration) -> Self {
        self.services.push(service);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::SpawnCommand;

    #[test]
    fn test_definition_builder() {
        let definition = GoalDefinition::new("npm-run-test", "npm test")
            .isolated()
            .retry_feasible()
            .in_environment(GoalEnvironment::Testing);
        assert!(definition.isolated);
        assert!(definition.retry_feasible);
        assert_eq!(definition.environment, GoalEnvironment::Testing);
    }

    #[test]
    fn test_goal_serialization() {
        let goal = Goal::new(
            GoalDefinition::new("npm-run-build", "npm build"),
            Fulfillment::Spawn(vec![SpawnCommand::parse("npm run build")]),
        );
        let json = serde_json::to_value(&goal).unwrap();
        assert_eq!(json["definition"]["uniqueName"], "npm-run-build");
        assert_eq!(json["definition"]["environment"], "code");
        assert_eq!(json["fulfillment"]["type"], "spawn");
        assert_eq!(json["fulfillment"]["commands"][0]["command"], "npm");
        assert_eq!(json["preApproval"], false);
        assert!(json.get("preCondition").is_none());
    }
}
