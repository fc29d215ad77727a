//! Node.js build, test, fingerprint and lint contributions

use super::versioning::{version_goal, VersionSource};
use crate::goals::{
    Fulfillment, Goal, GoalDefinition, GoalDescriptions, GoalSlot, Goals, MaterialChangeTest,
    SpawnCommand,
};
use crate::interpret::{
    AutofixRegistration, CodeInspection, InspectionRegistration, Interpretation, InterpretationPatch,
    Interpreter, ProjectReview, ReviewComment, Severity, SourceLocation,
};
use crate::k8s::mongo_for;
use crate::pipeline::analysis::ProjectAnalysis;
use crate::project::Project;
use crate::stack::node::PACKAGE_JSON;
use crate::transform::node::{eslint_targets, EslintFix, PackageJsonFormat};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

const MONGO_TAG: &str = "latest";

fn npm_build() -> Goal {
    Goal::new(
        GoalDefinition::new("npm-run-build", "npm build").isolated(),
        Fulfillment::Spawn(vec![SpawnCommand::parse("npm run build")]),
    )
}

fn npm_test() -> Goal {
    Goal::new(
        GoalDefinition::new("npm-run-test", "npm test")
            .retry_feasible()
            .isolated()
            .with_descriptions(GoalDescriptions {
                planned: None,
                in_process: Some("Running NPM test".to_string()),
                completed: Some("NPM test passed".to_string()),
                failed: Some("Test failures from NPM test".to_string()),
            }),
        Fulfillment::Spawn(vec![SpawnCommand::parse("npm run test")]),
    )
}

fn node_fingerprint() -> Goal {
    Goal::new(
        GoalDefinition::new("node-fingerprint", "fingerprint").isolated(),
        Fulfillment::external("fingerprint"),
    )
}

pub struct NodeInterpreter;

#[async_trait]
impl Interpreter for NodeInterpreter {
    fn name(&self) -> &str {
        "node"
    }

    async fn enrich(&self, analysis: &ProjectAnalysis, _interpretation: &Interpretation) -> Result<InterpretationPatch> {
        let Some(node) = analysis.node() else {
            return Ok(InterpretationPatch::none());
        };
        let scripts = &node.package_json;
        let version = version_goal(VersionSource::PackageJson);
        let mut patch = InterpretationPatch::material();

        if scripts.has_script("build") {
            let build = Goals::new("npm build")
                .plan(version)
                .plan_after(npm_build(), &["version"]);
            patch = patch.set(GoalSlot::Build, build);
        } else if scripts.has_script("test") {
            patch = patch.set(GoalSlot::Build, Goals::new("npm build").plan(version));
        }

        if scripts.has_script("test") {
            let mut test = npm_test();
            if let Some(mongo) = mongo_for(&analysis.services, MONGO_TAG) {
                test = test.with_service(mongo);
            }
            patch = patch.set(GoalSlot::Test, Goals::new("npm test").plan(test));
        }

        patch = patch
            .extend(GoalSlot::Check, Goals::new("checks").plan(node_fingerprint()))
            .with_autofix(AutofixRegistration::new(Arc::new(PackageJsonFormat)))
            .with_material_change_test(
                MaterialChangeTest::new()
                    .with_extensions(&["ts", "js", "jsx", "tsx", "json", "pug", "html", "css"])
                    .with_directories(&[".atomist"]),
            );

        if node.uses_eslint() {
            debug!(repo = %analysis.id.slug(), "eslint configured; registering autofix and inspection");
            patch = patch
                .with_autofix(AutofixRegistration::new(Arc::new(EslintFix)))
                .with_inspection(InspectionRegistration::new(Arc::new(EslintInspection)));
        }

        Ok(patch)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EslintFileReport {
    file_path: String,
    #[serde(default)]
    messages: Vec<EslintMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EslintMessage {
    #[serde(default)]
    rule_id: Option<String>,
    severity: u8,
    message: String,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    column: Option<u32>,
}

/// Convert eslint's `-f json` report into review comments, paths made relative to `base`
pub fn parse_eslint_report(report: &str, base: &str) -> Result<Vec<ReviewComment>> {
    let files: Vec<EslintFileReport> = serde_json::from_str(report).context("Failed to parse eslint report")?;
    let prefix = format!("{}/", base.trim_end_matches('/'));
    Ok(files
        .into_iter()
        .flat_map(|file| {
            let path = file
                .file_path
                .strip_prefix(&prefix)
                .unwrap_or(&file.file_path)
                .to_string();
            file.messages.into_iter().map(move |m| ReviewComment {
                category: "eslint".to_string(),
                severity: if m.severity >= 2 { Severity::Error } else { Severity::Warn },
                detail: m.message,
                subject: m.rule_id,
                source_location: Some(SourceLocation {
                    path: path.clone(),
                    line: m.line,
                    column: m.column,
                }),
            })
        })
        .collect())
}

/// Runs the project's eslint in report mode
pub struct EslintInspection;

#[async_trait]
impl CodeInspection for EslintInspection {
    fn name(&self) -> &str {
        "eslint"
    }

    async fn inspect(&self, project: &Project) -> Result<ProjectReview> {
        let mut review = ProjectReview::new(project.id().clone());
        let Some(cwd) = project.base_dir() else {
            warn!(project = project.name(), "Project is not a local project; skipping eslint");
            return Ok(review);
        };
        let content = project.read_file(PACKAGE_JSON)?;
        let package_json: Map<String, Value> =
            serde_json::from_str(&content).context("Failed to parse package.json")?;
        let mut args = eslint_targets(&package_json);
        args.extend(["-f".to_string(), "json".to_string()]);

        let output = tokio::process::Command::new(cwd.join("node_modules").join(".bin").join("eslint"))
            .args(&args)
            .current_dir(cwd)
            .output()
            .await
            .context("Failed to run eslint")?;
        // eslint exits non-zero when it finds problems; the report is still on stdout
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Ok(review);
        }
        review.comments = parse_eslint_report(&stdout, &cwd.to_string_lossy())?;
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::node::{EslintInfo, JavaScriptInfo, NodeStack, PackageJsonSummary};
    use crate::stack::{ServiceSpec, TechnologyElement};
    use crate::testing::{analysis, project};
    use std::collections::BTreeMap;

    fn node_analysis(scripts: &[&str], eslint: bool) -> ProjectAnalysis {
        let mut a = analysis(&project(&[]));
        a.add_element(TechnologyElement::Node(NodeStack {
            package_json: PackageJsonSummary {
                name: Some("widget".to_string()),
                scripts: scripts
                    .iter()
                    .map(|s| (s.to_string(), format!("run {}", s)))
                    .collect::<BTreeMap<_, _>>(),
                ..PackageJsonSummary::default()
            },
            java_script: JavaScriptInfo {
                eslint: EslintInfo {
                    has_config: eslint,
                    has_dependency: eslint,
                },
            },
            type_script: None,
            dependencies: Vec::new(),
            services: Default::default(),
            referenced_environment_variables: Vec::new(),
        }));
        a
    }

    #[tokio::test]
    async fn test_no_node_element_is_empty_patch() {
        let a = analysis(&project(&[]));
        let patch = NodeInterpreter.enrich(&a, &Interpretation::default()).await.unwrap();
        assert!(!patch.material);
        assert!(patch.slots.is_empty());
    }

    #[tokio::test]
    async fn test_build_and_test_scripts() {
        let a = node_analysis(&["build", "test"], false);
        let patch = NodeInterpreter.enrich(&a, &Interpretation::default()).await.unwrap();
        assert!(patch.material);

        match patch.change(GoalSlot::Build) {
            Some(crate::interpret::SlotChange::Set(goals)) => {
                assert_eq!(goals.names(), vec!["version", "npm-run-build"]);
                assert_eq!(goals.get("npm-run-build").unwrap().after, vec!["version"]);
            }
            other => panic!("unexpected build change {:?}", other),
        }
        match patch.change(GoalSlot::Test) {
            Some(crate::interpret::SlotChange::Set(goals)) => {
                let test = &goals.get("npm-run-test").unwrap().goal;
                assert!(test.definition.retry_feasible);
                assert!(test.services.is_empty());
            }
            other => panic!("unexpected test change {:?}", other),
        }
        assert_eq!(patch.autofixes.len(), 1);
        assert!(patch.inspections.is_empty());
    }

    #[tokio::test]
    async fn test_test_script_only_builds_version() {
        let a = node_analysis(&["test"], false);
        let patch = NodeInterpreter.enrich(&a, &Interpretation::default()).await.unwrap();
        match patch.change(GoalSlot::Build) {
            Some(crate::interpret::SlotChange::Set(goals)) => assert_eq!(goals.names(), vec!["version"]),
            other => panic!("unexpected build change {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_scripts_still_checks() {
        let a = node_analysis(&[], false);
        let patch = NodeInterpreter.enrich(&a, &Interpretation::default()).await.unwrap();
        assert!(patch.change(GoalSlot::Build).is_none());
        assert!(patch.change(GoalSlot::Test).is_none());
        assert!(matches!(patch.change(GoalSlot::Check), Some(crate::interpret::SlotChange::Extend(_))));
        assert!(patch.material_change_push_tests[0].is_material(&["src/index.ts".to_string()]));
        assert!(!patch.material_change_push_tests[0].is_material(&["README.md".to_string()]));
    }

    #[tokio::test]
    async fn test_mongo_service_attached_to_test() {
        let mut a = node_analysis(&["test"], false);
        a.services.insert("mongodb".to_string(), ServiceSpec::default());
        let patch = NodeInterpreter.enrich(&a, &Interpretation::default()).await.unwrap();
        match patch.change(GoalSlot::Test) {
            Some(crate::interpret::SlotChange::Set(goals)) => {
                assert_eq!(goals.get("npm-run-test").unwrap().goal.services.len(), 1);
            }
            other => panic!("unexpected test change {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_eslint_registrations() {
        let a = node_analysis(&["build"], true);
        let patch = NodeInterpreter.enrich(&a, &Interpretation::default()).await.unwrap();
        let names: Vec<&str> = patch.autofixes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Package JSON format", "eslint"]);
        assert_eq!(patch.inspections[0].name, "eslint");
    }

    #[test]
    fn test_parse_eslint_report() {
        let report = r#"[
            {"filePath": "/work/widget/src/index.js", "messages": [
                {"ruleId": "no-unused-vars", "severity": 1, "message": "'x' is unused", "line": 3, "column": 7},
                {"ruleId": "no-undef", "severity": 2, "message": "'y' is not defined", "line": 9}
            ]},
            {"filePath": "/work/widget/test/a.js", "messages": []}
        ]"#;
        let comments = parse_eslint_report(report, "/work/widget").unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].severity, Severity::Warn);
        assert_eq!(comments[0].subject.as_deref(), Some("no-unused-vars"));
        assert_eq!(comments[0].source_location.as_ref().unwrap().path, "src/index.js");
        assert_eq!(comments[1].severity, Severity::Error);
        assert_eq!(comments[1].source_location.as_ref().unwrap().column, None);
    }

    #[tokio::test]
    async fn test_eslint_inspection_skips_non_local_project() {
        let p = project(&[("package.json", "{}")]);
        let review = EslintInspection.inspect(&p).await.unwrap();
        assert!(review.comments.is_empty());
    }
}
