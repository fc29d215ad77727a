//! Dockerfile discovery and instruction parsing

use super::scanner::{ScanContext, ScanOptions, TechnologyScanner};
use super::{TechnologyElement, TechnologyId};
use crate::pipeline::analysis::ProjectAnalysis;
use crate::project::Project;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DOCKERFILE_GLOB: &str = "**/Dockerfile";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerFile {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// `FROM` images and `EXPOSE`d ports, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerfileInstructions {
    pub from: Vec<String>,
    pub expose: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerStack {
    pub docker_file: DockerFile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<DockerfileInstructions>,
}

impl DockerStack {
    /// First exposed port, used as the application port when deploying
    pub fn port(&self) -> Option<u16> {
        self.instructions.as_ref()?.expose.first().copied()
    }
}

/// Path of the first Dockerfile in path order
pub fn find_dockerfile(project: &Project) -> Option<String> {
    match project.first_match(&[DOCKERFILE_GLOB]) {
        Ok(found) => found.map(|f| f.path_str()),
        Err(e) => {
            warn!("Dockerfile discovery failed: {:#}", e);
            None
        }
    }
}

pub fn parse_instructions(content: &str) -> DockerfileInstructions {
    let from_re = Regex::new(r"(?mi)^\s*FROM\s+(?:--\S+\s+)*(\S+)").expect("valid regex");
    let expose_re = Regex::new(r"(?mi)^\s*EXPOSE\s+(.+)$").expect("valid regex");

    let from = from_re
        .captures_iter(content)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect();

    let mut expose = Vec::new();
    for cap in expose_re.captures_iter(content) {
        let Some(ports) = cap.get(1) else { continue };
        for token in ports.as_str().split_whitespace() {
            let number = token.split('/').next().unwrap_or(token);
            if let Ok(port) = number.parse::<u16>() {
                if !expose.contains(&port) {
                    expose.push(port);
                }
            }
        }
    }

    DockerfileInstructions { from, expose }
}

pub struct DockerScanner;

#[async_trait]
impl TechnologyScanner for DockerScanner {
    fn id(&self) -> TechnologyId {
        TechnologyId::Docker
    }

    async fn scan(
        &self,
        project: &Project,
        _ctx: &ScanContext,
        _analysis: &ProjectAnalysis,
        options: ScanOptions,
    ) -> Option<TechnologyElement> {
        let path = find_dockerfile(project)?;
        let content = project.get_file(&path);
        if content.is_none() {
            debug!(path = %path, "Dockerfile content unavailable");
        }

        let instructions = match (&content, options.full) {
            (Some(content), true) => Some(parse_instructions(content)),
            _ => None,
        };

        Some(TechnologyElement::Docker(DockerStack {
            docker_file: DockerFile { path, content },
            instructions,
        }))
    }
}
