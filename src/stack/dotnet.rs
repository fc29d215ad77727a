//! .NET Core detection from the root project file
//!
//! The target framework is extracted with a pattern over the raw
//! `.csproj` text. Attributes on the element, tags split across lines and
//! XML namespaces are not understood.

use super::docker::{find_dockerfile, parse_instructions, DockerfileInstructions};
use super::scanner::{ScanContext, ScanOptions, TechnologyScanner};
use super::{TechnologyElement, TechnologyId};
use crate::pipeline::analysis::ProjectAnalysis;
use crate::project::Project;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const PROJECT_FILE_GLOB: &str = "/*.csproj";
const SUPPORTED_TARGET_PREFIX: &str = "netcoreapp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DotnetCoreStack {
    pub project_file: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub has_docker_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_instructions: Option<DockerfileInstructions>,
}

/// Value of the first `<TargetFramework>` element
pub fn target_framework(csproj: &str) -> Option<String> {
    let re = Regex::new(r"<TargetFramework>([a-zA-Z_.0-9-]+)</TargetFramework>").expect("valid regex");
    re.captures(csproj)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Value of the first `<Version>` element
pub fn project_version(csproj: &str) -> Option<String> {
    let re = Regex::new(r"<Version>([^<]+)</Version>").expect("valid regex");
    re.captures(csproj)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// First project file at the root, in path order
pub fn find_project_file(project: &Project) -> Option<String> {
    match project.first_match(&[PROJECT_FILE_GLOB]) {
        Ok(found) => found.map(|f| f.path_str()),
        Err(e) => {
            warn!("Project file discovery failed: {:#}", e);
            None
        }
    }
}

pub struct DotnetCoreScanner;

#[async_trait]
impl TechnologyScanner for DotnetCoreScanner {
    fn id(&self) -> TechnologyId {
        TechnologyId::DotnetCore
    }

    async fn scan(
        &self,
        project: &Project,
        _ctx: &ScanContext,
        _analysis: &ProjectAnalysis,
        options: ScanOptions,
    ) -> Option<TechnologyElement> {
        let project_file = find_project_file(project)?;
        let csproj = project.get_file(&project_file)?;

        let target = target_framework(&csproj)?;
        if !target.starts_with(SUPPORTED_TARGET_PREFIX) {
            debug!(target = %target, "Unsupported .NET target framework");
            return None;
        }

        let dockerfile = find_dockerfile(project);
        let docker_instructions = match (&dockerfile, options.full) {
            (Some(path), true) => project.get_file(path).map(|c| parse_instructions(&c)),
            _ => None,
        };

        Some(TechnologyElement::DotnetCore(DotnetCoreStack {
            project_file,
            target,
            version: project_version(&csproj),
            has_docker_file: dockerfile.is_some(),
            docker_instructions,
        }))
    }
}
