//! Output formatting for analyses, classifications and push plans
//!
//! JSON and YAML serialize the underlying types; the human format is a
//! compact tree view.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};

use crate::goals::{Fulfillment, GoalGraph};
use crate::machine::PushPlan;
use crate::pipeline::ProjectAnalysis;
use crate::stack::TechnologyClassification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Machine-readable
    Json,
    Yaml,
    Human,
}

const RULE_WIDTH: usize = 42;

fn rule() -> String {
    "\u{2501}".repeat(RULE_WIDTH)
}

fn branch(is_last: bool) -> &'static str {
    if is_last {
        "\u{2514}\u{2500}"
    } else {
        "\u{251C}\u{2500}"
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn structured<T: Serialize>(&self, value: &T, what: &str) -> Result<String> {
        match self.format {
            OutputFormat::Yaml => {
                serde_yaml::to_string(value).with_context(|| format!("Failed to serialize {} to YAML", what))
            }
            _ => serde_json::to_string_pretty(value)
                .with_context(|| format!("Failed to serialize {} to JSON", what)),
        }
    }

    pub fn format_analysis(&self, analysis: &ProjectAnalysis) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.analysis_human(analysis)),
            _ => self.structured(analysis, "analysis"),
        }
    }

    pub fn format_classifications(&self, classifications: &[TechnologyClassification]) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.classifications_human(classifications)),
            _ => self.structured(&classifications, "classifications"),
        }
    }

    pub fn format_plan(&self, plan: &PushPlan) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.plan_human(plan)),
            _ => self.structured(&plan_value(plan)?, "push plan"),
        }
    }

    fn analysis_human(&self, analysis: &ProjectAnalysis) -> String {
        let mut output = String::new();
        output.push_str(&format!("\u{2713} Stack Analysis: {}\n", analysis.id.slug()));
        output.push_str(&rule());
        output.push_str("\n\n");

        if analysis.elements.is_empty() {
            output.push_str("No technology stacks detected\n");
        } else {
            output.push_str("Technologies:\n");
            let count = analysis.elements.len();
            for (i, (id, element)) in analysis.elements.iter().enumerate() {
                let tags = element.tags();
                if tags.is_empty() {
                    output.push_str(&format!("{} {}\n", branch(i + 1 == count), id));
                } else {
                    output.push_str(&format!("{} {} [{}]\n", branch(i + 1 == count), id, tags.join(", ")));
                }
            }
        }

        if !analysis.services.is_empty() {
            let names: Vec<&str> = analysis.services.keys().map(String::as_str).collect();
            output.push_str(&format!("\nServices: {}\n", names.join(", ")));
        }
        if !analysis.referenced_environment_variables.is_empty() {
            let vars: Vec<&str> = analysis
                .referenced_environment_variables
                .iter()
                .map(String::as_str)
                .collect();
            output.push_str(&format!("Environment variables: {}\n", vars.join(", ")));
        }
        for message in &analysis.messages {
            output.push_str(&format!("\u{26A0} {}\n", message));
        }
        output
    }

    fn classifications_human(&self, classifications: &[TechnologyClassification]) -> String {
        if classifications.is_empty() {
            return "No technologies recognized\n".to_string();
        }
        let mut output = String::new();
        for classification in classifications {
            output.push_str(&classification.name);
            if !classification.tags.is_empty() {
                output.push_str(&format!(" [{}]", classification.tags.join(", ")));
            }
            output.push('\n');
            for message in &classification.messages {
                output.push_str(&format!("  {}\n", message));
            }
        }
        output
    }

    fn plan_human(&self, plan: &PushPlan) -> String {
        match plan {
            PushPlan::Locked(reason) => format!("\u{26A0} Goals locked ({})\n", reason),
            PushPlan::Immaterial => "No material changes; nothing to plan\n".to_string(),
            PushPlan::Planned(planned) => {
                let mut output = String::new();
                output.push_str(&format!("\u{2713} Goals for {}\n", planned.analysis.id.slug()));
                output.push_str(&rule());
                output.push_str("\n\n");
                output.push_str(&graph_human(&planned.graph));
                if !planned.extended {
                    output.push_str("\nOnly check goals planned for this branch\n");
                }
                for conflict in &planned.interpretation.conflicts {
                    output.push_str(&format!(
                        "\u{26A0} {} kept {} over {} from {}\n",
                        conflict.slot,
                        conflict.kept.join(", "),
                        conflict.rejected.join(", "),
                        conflict.interpreter
                    ));
                }
                output
            }
        }
    }
}

fn fulfillment_summary(fulfillment: &Fulfillment) -> String {
    match fulfillment {
        Fulfillment::Spawn(commands) => commands
            .iter()
            .map(|c| c.command_line())
            .collect::<Vec<_>>()
            .join(" && "),
        Fulfillment::External { tool } => format!("({})", tool),
        Fulfillment::Executor(executor) => format!("<{}>", executor.name()),
    }
}

fn graph_human(graph: &GoalGraph) -> String {
    if graph.is_empty() {
        return "No goals\n".to_string();
    }
    let mut output = String::new();
    let count = graph.len();
    for (i, node) in graph.nodes().iter().enumerate() {
        output.push_str(&format!(
            "{} {:<20} {:<16} {}\n",
            branch(i + 1 == count),
            node.name(),
            node.slot.as_str(),
            fulfillment_summary(&node.goal.fulfillment)
        ));
        if !node.after.is_empty() {
            output.push_str(&format!("     after: {}\n", node.after.join(", ")));
        }
    }
    output
}

/// Serializable view of a plan
pub fn plan_value(plan: &PushPlan) -> Result<Value> {
    Ok(match plan {
        PushPlan::Locked(reason) => json!({ "outcome": "locked", "reason": reason }),
        PushPlan::Immaterial => json!({ "outcome": "immaterial" }),
        PushPlan::Planned(planned) => json!({
            "outcome": "planned",
            "extended": planned.extended,
            "goals": serde_json::to_value(&planned.graph).context("Failed to serialize goal graph")?,
            "order": planned.graph.topological_order()?,
            "conflicts": serde_json::to_value(&planned.interpretation.conflicts)
                .context("Failed to serialize conflicts")?,
        }),
    })
}
