//! Travis CI configuration scanning

use super::element::{ServiceSpec, Services};
use super::scanner::{ScanContext, ScanOptions, TechnologyScanner};
use super::{TechnologyElement, TechnologyId};
use crate::pipeline::analysis::ProjectAnalysis;
use crate::project::Project;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const TRAVIS_FILE: &str = ".travis.yml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravisCi {
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub scripts: Vec<String>,
    pub before_install: Vec<String>,
    pub after_success: Vec<String>,
    /// Browser testing and similar add-ons, kept verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addons: Option<Value>,
    pub env: BTreeMap<String, String>,
    pub services: Services,
    pub can_emulate: bool,
}

impl TravisCi {
    /// Add-ons cannot be reproduced outside Travis
    pub fn uses_unsupported_features(&self) -> bool {
        self.addons.is_some()
    }
}

/// YAML first; a JSON document is accepted when YAML parsing fails
fn parse_document(content: &str) -> Result<Value> {
    match serde_yaml::from_str::<Value>(content) {
        Ok(value) => Ok(value),
        Err(yaml_error) => serde_json::from_str(content)
            .with_context(|| format!("Neither YAML ({}) nor JSON", yaml_error)),
    }
}

/// A scalar or a list of scalars
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(other) => scalar_to_string(other).into_iter().collect(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `KEY=VALUE`, with one pair of surrounding double quotes removed
fn parse_env_entry(entry: &str) -> Option<(String, String)> {
    let (key, value) = entry.split_once('=')?;
    let value = if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    };
    Some((key.trim().to_string(), value.to_string()))
}

fn parse_travis(project_name: &str, document: &Value) -> TravisCi {
    let env = string_list(document.get("env"))
        .iter()
        .filter_map(|entry| parse_env_entry(entry))
        .collect();

    let services = string_list(document.get("services"))
        .into_iter()
        .map(|name| (name, ServiceSpec::default()))
        .collect();

    let addons = document.get("addons").filter(|v| !v.is_null()).cloned();
    let mut travis = TravisCi {
        project_name: project_name.to_string(),
        language: document.get("language").and_then(scalar_to_string),
        scripts: string_list(document.get("script")),
        before_install: string_list(document.get("before_install")),
        after_success: string_list(document.get("after_success")),
        addons,
        env,
        services,
        can_emulate: false,
    };
    travis.can_emulate = !travis.uses_unsupported_features();
    travis
}

pub struct TravisScanner;

#[async_trait]
impl TechnologyScanner for TravisScanner {
    fn id(&self) -> TechnologyId {
        TechnologyId::Travis
    }

    async fn scan(
        &self,
        project: &Project,
        _ctx: &ScanContext,
        _analysis: &ProjectAnalysis,
        _options: ScanOptions,
    ) -> Option<TechnologyElement> {
        let content = project.get_file(TRAVIS_FILE)?;
        let document = match parse_document(&content) {
            Ok(document) => document,
            Err(e) => {
                warn!("Cannot parse {}: {:#}", TRAVIS_FILE, e);
                return None;
            }
        };
        if !document.is_object() {
            warn!("Ignoring {}: top level is not a mapping", TRAVIS_FILE);
            return None;
        }

        let travis = parse_travis(project.name(), &document);
        debug!(
            scripts = travis.scripts.len(),
            services = travis.services.len(),
            can_emulate = travis.can_emulate,
            "Detected Travis configuration"
        );
        Some(TechnologyElement::Travis(travis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{analysis, project, scan_context};

    const SIMPLE: &str = "language: node_js\nnode_js:\n  - \"8.9.4\"\n";

    const WITH_ENV: &str = r#"language: node_js
node_js:
  - "8.9.4"
env:
  - DB=postgres
  - SH=bash
  - PACKAGE_VERSION="1.0.*""#;

    const SERVICES: &str = r#"language: node_js
node_js:
  - "8.9.4"
install:
  - yarn install
env:
  - DB_TYPE="sqlite" DB_DATABASE="./mydb.sql" DB_LOGGING=false
services:
  - riak
  - rabbitmq
  - memcached
script:
  - npm start test
  - npm start test.integration
  - npm start test.e2e
  - npm start build
notifications:
  email: false"#;

    const LIFECYCLE: &str = r#"language: node_js
node_js:
  - 'node'
  - 'lts/*'
script:
  - node ./internals/scripts/generate-templates-for-linting
  - npm test -- --maxWorkers=4
  - npm run build
before_install:
  - export CHROME_BIN=chromium-browser
  - export DISPLAY=:99.0
  - sh -e /etc/init.d/xvfb start
notifications:
  email:
    on_failure: change
after_success: 'npm run coveralls'
cache:
  directories:
    - node_modules"#;

    const ADDONS: &str = "language: node_js\naddons:\n  firefox: \"17.0\"\n";

    const JSON: &str = r#"{
  "language": "node_js",
  "node_js": "8",
  "services": [
    "mongodb"
  ],
  "script": [
    "npm run build",
    "npm run test"
  ]
}"#;

    async fn scan(content: &str) -> Option<TravisCi> {
        let p = project(&[(TRAVIS_FILE, content)]);
        match TravisScanner
            .scan(&p, &scan_context(), &analysis(&p), ScanOptions::fast())
            .await?
        {
            TechnologyElement::Travis(travis) => Some(travis),
            other => panic!("unexpected element {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_travis_file() {
        let p = project(&[]);
        let scanned = TravisScanner
            .scan(&p, &scan_context(), &analysis(&p), ScanOptions::full())
            .await;
        assert!(scanned.is_none());
    }

    #[tokio::test]
    async fn test_no_scripts() {
        let travis = scan(SIMPLE).await.unwrap();
        assert!(travis.services.is_empty());
        assert!(travis.scripts.is_empty());
        assert_eq!(travis.language.as_deref(), Some("node_js"));
        assert_eq!(travis.project_name, "widget");
        assert!(travis.can_emulate);
    }

    #[tokio::test]
    async fn test_scripts_and_services() {
        let travis = scan(SERVICES).await.unwrap();
        assert_eq!(
            travis.scripts,
            vec![
                "npm start test",
                "npm start test.integration",
                "npm start test.e2e",
                "npm start build",
            ]
        );
        let services: Vec<&str> = travis.services.keys().map(String::as_str).collect();
        assert_eq!(services, vec!["memcached", "rabbitmq", "riak"]);
        assert_eq!(
            travis.env.get("DB_TYPE").map(String::as_str),
            Some(r#""sqlite" DB_DATABASE="./mydb.sql" DB_LOGGING=false"#)
        );
    }

    #[tokio::test]
    async fn test_services_in_json() {
        let travis = scan(JSON).await.unwrap();
        assert_eq!(travis.services.len(), 1);
        assert!(travis.services.contains_key("mongodb"));
        assert_eq!(travis.scripts.len(), 2);
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let travis = scan(LIFECYCLE).await.unwrap();
        assert!(travis.services.is_empty());
        assert_eq!(travis.scripts.len(), 3);
        assert_eq!(travis.before_install.len(), 3);
        assert_eq!(travis.after_success, vec!["npm run coveralls"]);
        assert!(travis.env.is_empty());
    }

    #[tokio::test]
    async fn test_env() {
        let travis = scan(WITH_ENV).await.unwrap();
        assert!(travis.services.is_empty());
        let expected: BTreeMap<String, String> = [
            ("DB", "postgres"),
            ("SH", "bash"),
            ("PACKAGE_VERSION", "1.0.*"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(travis.env, expected);
        assert!(travis.addons.is_none());
    }

    #[tokio::test]
    async fn test_addons_are_unsupported() {
        let travis = scan(ADDONS).await.unwrap();
        assert!(travis.addons.is_some());
        assert!(travis.uses_unsupported_features());
        assert!(!travis.can_emulate);
    }

    #[tokio::test]
    async fn test_single_string_service_and_env() {
        let travis = scan("services: docker\nenv: FOO=bar\nscript: make\n").await.unwrap();
        assert!(travis.services.contains_key("docker"));
        assert_eq!(travis.env.get("FOO").map(String::as_str), Some("bar"));
        assert_eq!(travis.scripts, vec!["make"]);
    }

    #[tokio::test]
    async fn test_unparseable() {
        assert!(scan("language: [unclosed").await.is_none());
    }
}
