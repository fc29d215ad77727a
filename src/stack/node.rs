//! Node.js stack detection from `package.json`

use super::element::{Dependency, ServiceSpec, Services};
use super::scanner::{ScanContext, ScanOptions, TechnologyScanner};
use super::{TechnologyElement, TechnologyId};
use crate::pipeline::analysis::ProjectAnalysis;
use crate::project::Project;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const PACKAGE_JSON: &str = "package.json";
const ENV_REFERENCE_GLOBS: &[&str] = &["**/*.js", "**/*.ts"];
const MONGO_DEPENDENCIES: &[&str] = &["mongoose", "mongodb"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJsonSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl PackageJsonSummary {
    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EslintInfo {
    pub has_config: bool,
    pub has_dependency: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaScriptInfo {
    pub eslint: EslintInfo,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TslintInfo {
    pub has_config: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeScriptInfo {
    pub tslint: TslintInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStack {
    pub package_json: PackageJsonSummary,
    pub java_script: JavaScriptInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_script: Option<TypeScriptInfo>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub services: Services,
    #[serde(default)]
    pub referenced_environment_variables: Vec<String>,
}

impl NodeStack {
    /// eslint is usable when it is both configured and installed
    pub fn uses_eslint(&self) -> bool {
        self.java_script.eslint.has_config && self.java_script.eslint.has_dependency
    }
}

/// Subset of `package.json` the scanner reads
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPackageJson {
    name: Option<String>,
    description: Option<String>,
    author: Option<Value>,
    version: Option<String>,
    #[serde(default)]
    scripts: BTreeMap<String, String>,
    #[serde(default)]
    dependencies: Map<String, Value>,
    #[serde(default)]
    dev_dependencies: Map<String, Value>,
}

impl RawPackageJson {
    fn has_dependency(&self, names: &[&str]) -> bool {
        names.iter().any(|name| {
            is_truthy(self.dependencies.get(*name)) || is_truthy(self.dev_dependencies.get(*name))
        })
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

pub struct NodeScanner;

#[async_trait]
impl TechnologyScanner for NodeScanner {
    fn id(&self) -> TechnologyId {
        TechnologyId::Node
    }

    async fn scan(
        &self,
        project: &Project,
        _ctx: &ScanContext,
        _analysis: &ProjectAnalysis,
        options: ScanOptions,
    ) -> Option<TechnologyElement> {
        let content = project.get_file(PACKAGE_JSON)?;
        let raw: RawPackageJson = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(project = %project.id().slug(), "Ignoring malformed package.json: {}", e);
                return None;
            }
        };

        let mut services = Services::new();
        if raw.has_dependency(MONGO_DEPENDENCIES) {
            services.insert("mongodb".to_string(), ServiceSpec::default());
        }

        let dependencies = raw
            .dependencies
            .iter()
            .map(|(name, version)| Dependency {
                group: name.clone(),
                artifact: name.clone(),
                version: version.as_str().map(str::to_string),
            })
            .collect();

        let java_script = JavaScriptInfo {
            eslint: EslintInfo {
                has_config: project.has_file(".eslintrc") || project.has_file(".eslintrc.json"),
                has_dependency: raw.has_dependency(&["eslint"]),
            },
        };

        let type_script = (project.has_file("tsconfig.json") || raw.has_dependency(&["typescript"]))
            .then(|| TypeScriptInfo {
                tslint: TslintInfo {
                    has_config: project.has_file("tslint.json"),
                },
            });

        let referenced_environment_variables = if options.full {
            find_environment_variables(project)
        } else {
            Vec::new()
        };

        debug!(
            name = ?raw.name,
            dependencies = raw.dependencies.len(),
            env = referenced_environment_variables.len(),
            "Detected Node project"
        );

        Some(TechnologyElement::Node(NodeStack {
            package_json: PackageJsonSummary {
                name: raw.name,
                description: raw.description,
                author: raw.author,
                version: raw.version,
                scripts: raw.scripts,
            },
            java_script,
            type_script,
            dependencies,
            services,
            referenced_environment_variables,
        }))
    }
}

/// Distinct `process.env.NAME` references in first-occurrence order
fn find_environment_variables(project: &Project) -> Vec<String> {
    let env_re = Regex::new(r"process\.env\.([A-Za-z0-9_]+)").expect("valid regex");

    let files = match project.gather(ENV_REFERENCE_GLOBS) {
        Ok(files) => files,
        Err(e) => {
            warn!("Failed to list sources for environment references: {:#}", e);
            return Vec::new();
        }
    };

    let mut names: Vec<String> = Vec::new();
    for file in files {
        if file.path.components().any(|c| c.as_os_str() == "node_modules") {
            continue;
        }
        let Some(content) = project.get_file(&file.path_str()) else {
            continue;
        };
        for cap in env_re.captures_iter(&content) {
            if let Some(name) = cap.get(1) {
                if !names.iter().any(|n| n == name.as_str()) {
                    names.push(name.as_str().to_string());
                }
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{analysis, project, scan_context};

    async fn scan(files: &[(&str, &str)], options: ScanOptions) -> Option<NodeStack> {
        let p = project(files);
        match NodeScanner
            .scan(&p, &scan_context(), &analysis(&p), options)
            .await?
        {
            TechnologyElement::Node(node) => Some(node),
            other => panic!("unexpected element {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_package_json() {
        assert!(scan(&[("index.js", "")], ScanOptions::full()).await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_package_json() {
        assert!(scan(&[("package.json", "{ not json")], ScanOptions::full()).await.is_none());
    }

    #[tokio::test]
    async fn test_summary_and_dependencies() {
        let package_json = r#"{
            "name": "widget",
            "description": "A widget",
            "version": "1.2.3",
            "scripts": { "build": "tsc", "test": "mocha" },
            "dependencies": { "express": "^4.16.0", "lodash": "4.17.11" },
            "devDependencies": { "mocha": "^5.0.0" }
        }"#;
        let node = scan(&[("package.json", package_json)], ScanOptions::fast())
            .await
            .unwrap();

        assert_eq!(node.package_json.name.as_deref(), Some("widget"));
        assert_eq!(node.package_json.version.as_deref(), Some("1.2.3"));
        assert!(node.package_json.has_script("build"));
        assert_eq!(node.dependencies.len(), 2);
        assert_eq!(node.dependencies[0].artifact, "express");
        assert_eq!(node.dependencies[0].group, "express");
        assert_eq!(node.dependencies[0].version.as_deref(), Some("^4.16.0"));
        assert!(node.services.is_empty());
        assert!(node.type_script.is_none());
    }

    #[tokio::test]
    async fn test_mongo_service_from_dev_dependency() {
        let package_json = r#"{ "name": "m", "devDependencies": { "mongoose": "5.0.0" } }"#;
        let node = scan(&[("package.json", package_json)], ScanOptions::fast())
            .await
            .unwrap();
        assert!(node.services.contains_key("mongodb"));
    }

    #[tokio::test]
    async fn test_eslint_info() {
        let package_json = r#"{ "name": "e", "devDependencies": { "eslint": "^5.0.0" } }"#;
        let node = scan(
            &[("package.json", package_json), (".eslintrc.json", "{}")],
            ScanOptions::fast(),
        )
        .await
        .unwrap();
        assert!(node.java_script.eslint.has_config);
        assert!(node.java_script.eslint.has_dependency);
        assert!(node.uses_eslint());

        let node = scan(&[("package.json", package_json)], ScanOptions::fast())
            .await
            .unwrap();
        assert!(!node.uses_eslint());
    }

    #[tokio::test]
    async fn test_typescript_info() {
        let node = scan(
            &[("package.json", "{}"), ("tsconfig.json", "{}"), ("tslint.json", "{}")],
            ScanOptions::fast(),
        )
        .await
        .unwrap();
        assert!(node.type_script.unwrap().tslint.has_config);
    }

    #[tokio::test]
    async fn test_environment_variables_full_only() {
        let files = [
            ("package.json", r#"{ "name": "env" }"#),
            ("index.js", "const a = process.env.PORT;\nconst b = process.env.MONGO_URL;"),
            ("src/config.ts", "export const p = process.env.PORT || process.env.SECRET_1;"),
            ("node_modules/x/index.js", "process.env.IGNORED"),
            ("README.md", "process.env.NOT_CODE"),
        ];

        let node = scan(&files, ScanOptions::full()).await.unwrap();
        assert_eq!(
            node.referenced_environment_variables,
            vec!["PORT", "MONGO_URL", "SECRET_1"]
        );

        let node = scan(&files, ScanOptions::fast()).await.unwrap();
        assert!(node.referenced_environment_variables.is_empty());
    }
}
