//! Pre-release versions for branch builds
//!
//! A version goal reads the project's declared version and appends the
//! branch and a UTC timestamp, e.g. `1.1.0-master.20190301120000`.

use crate::goals::{
    Fulfillment, Goal, GoalDefinition, GoalDescriptions, GoalExecutor, GoalInvocation, GoalOutcome,
};
use crate::project::Project;
use crate::stack::dotnet::{find_project_file, project_version};
use crate::stack::node::PACKAGE_JSON;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_VERSION: &str = "0.0.1";

/// `{base}-{branch}.{timestamp}` with `/` in the branch turned into `.` and `_` into `-`
pub fn format_version(base: &str, branch: &str, now: DateTime<Utc>) -> String {
    let branch = branch.replace('/', ".").replace('_', "-");
    format!("{}-{}.{}", base, branch, now.format("%Y%m%d%H%M%S"))
}

/// Where the declared version of a project lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    PackageJson,
    Csproj,
    /// `gradle.properties`, then `pom.xml`
    Jvm,
}

impl VersionSource {
    fn name(&self) -> &'static str {
        match self {
            VersionSource::PackageJson => "node-versioner",
            VersionSource::Csproj => "dotnetcore-versioner",
            VersionSource::Jvm => "jvm-versioner",
        }
    }

    pub fn declared_version(&self, project: &Project) -> Option<String> {
        match self {
            VersionSource::PackageJson => {
                let content = project.get_file(PACKAGE_JSON)?;
                let package_json: Value = serde_json::from_str(&content).ok()?;
                package_json.get("version")?.as_str().map(str::to_string)
            }
            VersionSource::Csproj => {
                let path = find_project_file(project)?;
                project_version(&project.get_file(&path)?)
            }
            VersionSource::Jvm => gradle_version(project).or_else(|| maven_version(project)),
        }
    }
}

fn gradle_version(project: &Project) -> Option<String> {
    let properties = project.get_file("gradle.properties")?;
    let pattern = Regex::new(r"(?m)^\s*version\s*=\s*(\S+)\s*$").expect("valid regex");
    pattern
        .captures(&properties)
        .map(|c| c[1].to_string())
}

fn maven_version(project: &Project) -> Option<String> {
    let pom = project.get_file("pom.xml")?;
    let parent = Regex::new(r"(?s)<parent>.*?</parent>").expect("valid regex");
    let without_parent = parent.replace(&pom, "");
    let version = Regex::new(r"<version>\s*([^<\s]+)\s*</version>").expect("valid regex");
    version
        .captures(&without_parent)
        .map(|c| c[1].to_string())
}

/// Computes the build version; the scheduler records it from the outcome data
pub struct VersionExecutor {
    source: VersionSource,
}

impl VersionExecutor {
    pub fn new(source: VersionSource) -> Self {
        Self { source }
    }

    pub fn version_for(&self, project: &Project, branch: &str, now: DateTime<Utc>) -> String {
        let base = self
            .source
            .declared_version(project)
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        format_version(&base, branch, now)
    }
}

#[async_trait]
impl GoalExecutor for VersionExecutor {
    fn name(&self) -> &str {
        self.source.name()
    }

    async fn execute(&self, invocation: &GoalInvocation) -> Result<GoalOutcome> {
        let version = self.version_for(&invocation.project, &invocation.push.branch, Utc::now());
        debug!(repo = %invocation.push.repo.slug(), version = %version, "Computed version");
        Ok(GoalOutcome::success()
            .with_description(format!("Versioned `{}`", version))
            .with_data(json!({ "version": version })))
    }
}

pub fn version_goal(source: VersionSource) -> Goal {
    Goal::new(
        GoalDefinition::new("version", "version").with_descriptions(GoalDescriptions {
            planned: Some("Planned: version".to_string()),
            in_process: Some("Calculating project version".to_string()),
            completed: Some("Versioned".to_string()),
            failed: Some("Couldn't version".to_string()),
        }),
        Fulfillment::Executor(Arc::new(VersionExecutor::new(source))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{project, push};
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_version() {
        assert_eq!(format_version("1.1.0", "master", noon()), "1.1.0-master.20190301120000");
        assert_eq!(
            format_version("0.0.1", "some/branch_name", noon()),
            "0.0.1-some.branch-name.20190301120000"
        );
    }

    #[test]
    fn test_node_version() {
        let p = project(&[("package.json", r#"{"name":"x","version":"1.1.0"}"#)]);
        let executor = VersionExecutor::new(VersionSource::PackageJson);
        assert!(executor
            .version_for(&p, "master", noon())
            .starts_with("1.1.0-master."));
    }

    #[test]
    fn test_dotnet_version_defaults() {
        let p = project(&[("app.csproj", "<Project><PropertyGroup></PropertyGroup></Project>")]);
        let executor = VersionExecutor::new(VersionSource::Csproj);
        assert!(executor
            .version_for(&p, "some/branch", noon())
            .starts_with("0.0.1-some.branch."));
    }

    #[test]
    fn test_dotnet_version_declared() {
        let p = project(&[("app.csproj", "<Project><PropertyGroup><Version>2.3.4</Version></PropertyGroup></Project>")]);
        assert_eq!(VersionSource::Csproj.declared_version(&p).as_deref(), Some("2.3.4"));
    }

    #[test]
    fn test_jvm_versions() {
        let gradle = project(&[("gradle.properties", "rootProject.name=x\nversion=0.5.0-SNAPSHOT\n")]);
        assert_eq!(VersionSource::Jvm.declared_version(&gradle).as_deref(), Some("0.5.0-SNAPSHOT"));

        let maven = project(&[(
            "pom.xml",
            "<project><parent><version>2.1.0</version></parent><version>1.0.0</version></project>",
        )]);
        assert_eq!(VersionSource::Jvm.declared_version(&maven).as_deref(), Some("1.0.0"));
    }

    #[tokio::test]
    async fn test_executor_reports_version() {
        let p = project(&[("package.json", r#"{"version":"1.1.0"}"#)]);
        let outcome = VersionExecutor::new(VersionSource::PackageJson)
            .execute(&GoalInvocation::new(p, push("master")))
            .await
            .unwrap();
        assert!(outcome.is_success());
        let version = outcome.data.unwrap()["version"].as_str().unwrap().to_string();
        assert!(version.starts_with("1.1.0-master."));
    }
}
