//! Node project transforms: seed identification and package.json hygiene

use super::{CodeTransform, ParameterSpec, TransformParams, TransformRecipe, TransformRecipeContributor};
use crate::pipeline::analysis::ProjectAnalysis;
use crate::project::Project;
use crate::stack::node::PACKAGE_JSON;
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, warn};

pub const README: &str = "README.md";
pub const DESCRIPTION_PARAM: &str = "description";
pub const VERSION_PARAM: &str = "version";
pub const AUTHOR_PARAM: &str = "screen_name";

const DEFAULT_VERSION: &str = "0.1.0";

fn read_package_json(project: &Project) -> Result<Map<String, Value>> {
    let content = project.read_file(PACKAGE_JSON)?;
    let value: Value = serde_json::from_str(&content).context("Failed to parse package.json")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("package.json is not a JSON object"),
    }
}

fn write_package_json(project: &Project, package_json: &Map<String, Value>) -> Result<()> {
    let mut content = serde_json::to_string_pretty(package_json)?;
    content.push('\n');
    project.add_file(PACKAGE_JSON, &content)
}

/// Points package.json at the new repository
pub struct UpdatePackageJsonIdentification;

#[async_trait]
impl CodeTransform for UpdatePackageJsonIdentification {
    fn name(&self) -> &str {
        "update-package-json-identification"
    }

    async fn apply(&self, project: &Project, params: &TransformParams) -> Result<()> {
        if !project.has_file(PACKAGE_JSON) {
            return Ok(());
        }
        let mut package_json = read_package_json(project)?;
        let id = project.id();
        let home = format!("https://github.com/{}/{}", id.owner, id.repo);

        package_json.insert("name".to_string(), json!(id.repo));
        if let Some(description) = params.get(DESCRIPTION_PARAM) {
            package_json.insert("description".to_string(), json!(description));
        }
        let version = params
            .get(VERSION_PARAM)
            .map(String::as_str)
            .unwrap_or(DEFAULT_VERSION);
        package_json.insert("version".to_string(), json!(version));
        if let Some(author) = params.get(AUTHOR_PARAM) {
            package_json.insert("author".to_string(), json!(author));
        }
        package_json.insert(
            "repository".to_string(),
            json!({ "type": "git", "url": format!("{}.git", home) }),
        );
        package_json.insert("homepage".to_string(), json!(format!("{}#readme", home)));
        package_json.insert("bugs".to_string(), json!({ "url": format!("{}/issues", home) }));

        write_package_json(project, &package_json)
    }
}

fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\A\s*#[^\n]*\n?").expect("valid regex"))
}

/// Replaces the README's first heading with the new repository name
pub struct UpdateReadmeTitle;

#[async_trait]
impl CodeTransform for UpdateReadmeTitle {
    fn name(&self) -> &str {
        "update-readme-title"
    }

    async fn apply(&self, project: &Project, params: &TransformParams) -> Result<()> {
        let Some(readme) = project.get_file(README) else {
            return Ok(());
        };
        let mut title = format!("# {}\n", project.name());
        if let Some(description) = params.get(DESCRIPTION_PARAM).filter(|d| !d.is_empty()) {
            title.push('\n');
            title.push_str(description);
            title.push('\n');
        }

        let updated = if heading_pattern().is_match(&readme) {
            heading_pattern().replace(&readme, title.as_str()).into_owned()
        } else {
            format!("{}\n{}", title, readme)
        };
        project.add_file(README, &updated)
    }
}

/// Rewrites package.json with two-space indentation and a trailing newline
pub struct PackageJsonFormat;

#[async_trait]
impl CodeTransform for PackageJsonFormat {
    fn name(&self) -> &str {
        "Package JSON format"
    }

    async fn apply(&self, project: &Project, _params: &TransformParams) -> Result<()> {
        let package_json = read_package_json(project)?;
        write_package_json(project, &package_json)
    }
}

/// Files eslint should look at: the arguments of the `lint` script, else `.`
pub fn eslint_targets(package_json: &Map<String, Value>) -> Vec<String> {
    let lint = package_json
        .get("scripts")
        .and_then(|s| s.get("lint"))
        .and_then(Value::as_str);
    match lint {
        Some(script) => script
            .replace('"', "")
            .split(' ')
            .skip(1)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => vec![".".to_string()],
    }
}

/// Runs the project's own eslint with `--fix`; failures are logged only
pub struct EslintFix;

#[async_trait]
impl CodeTransform for EslintFix {
    fn name(&self) -> &str {
        "eslint"
    }

    async fn apply(&self, project: &Project, _params: &TransformParams) -> Result<()> {
        let Some(cwd) = project.base_dir() else {
            error!(project = project.name(), "Project is not a local project");
            return Ok(());
        };
        let package_json = read_package_json(project)?;
        let mut args = eslint_targets(&package_json);
        args.push("--fix".to_string());

        let eslint = cwd.join("node_modules").join(".bin").join("eslint");
        match tokio::process::Command::new(&eslint)
            .args(&args)
            .current_dir(cwd)
            .output()
            .await
        {
            Ok(output) => {
                if !output.stderr.is_empty() {
                    debug!(
                        project = project.name(),
                        "eslint standard error: {}",
                        String::from_utf8_lossy(&output.stderr)
                    );
                }
            }
            Err(e) => error!("Failed to run eslint: {}", e),
        }
        Ok(())
    }
}

/// Identification transforms for seeds that are Node projects
pub struct NodeTransformRecipeContributor;

#[async_trait]
impl TransformRecipeContributor for NodeTransformRecipeContributor {
    async fn analyze(&self, _project: &Project, analysis: &ProjectAnalysis) -> Result<Option<TransformRecipe>> {
        let Some(node) = analysis.node() else {
            return Ok(None);
        };
        if node.package_json.name.is_none() {
            warn!("Seed package.json has no name; it will be set from the new repository");
        }
        Ok(Some(
            TransformRecipe::default()
                .with_parameter(ParameterSpec::optional(DESCRIPTION_PARAM, "Description of the new project"))
                .with_parameter(
                    ParameterSpec::optional(VERSION_PARAM, "Initial version")
                        .with_pattern(r"^v?\d+\.\d+\.\d+(?:-\S*)?$")
                        .with_default(DEFAULT_VERSION),
                )
                .with_transform(Arc::new(UpdateReadmeTitle))
                .with_transform(Arc::new(UpdatePackageJsonIdentification)),
        ))
    }
}
