use super::scanner::{ScanContext, ScanOptions, TechnologyClassification, TechnologyScanner};
use super::{TechnologyElement, TechnologyId};
use crate::pipeline::analysis::ProjectAnalysis;
use crate::project::Project;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const YEOMAN_RC: &str = ".yo-rc.json";
const GENERATOR_KEY: &str = "generator-jhipster";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JHipsterStack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub build_tool: JvmBuildTool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JvmBuildTool {
    #[default]
    Maven,
    Gradle,
}

/// The `generator-jhipster` section of `.yo-rc.json`, if any
fn generator_config(project: &Project) -> Option<Value> {
    let content = project.get_file(YEOMAN_RC)?;
    let parsed: Value = match serde_json::from_str(&content) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Ignoring malformed {}: {}", YEOMAN_RC, e);
            return None;
        }
    };
    parsed.get(GENERATOR_KEY).filter(|v| !v.is_null()).cloned()
}

pub struct JHipsterScanner;

#[async_trait]
impl TechnologyScanner for JHipsterScanner {
    fn id(&self) -> TechnologyId {
        TechnologyId::JHipster
    }

    async fn scan(
        &self,
        project: &Project,
        _ctx: &ScanContext,
        _analysis: &ProjectAnalysis,
        _options: ScanOptions,
    ) -> Option<TechnologyElement> {
        let generator = generator_config(project)?;
        let build_tool = match generator.get("buildTool").and_then(Value::as_str) {
            Some("gradle") => JvmBuildTool::Gradle,
            _ => JvmBuildTool::Maven,
        };
        Some(TechnologyElement::JHipster(JHipsterStack {
            version: generator
                .get("jhipsterVersion")
                .and_then(Value::as_str)
                .map(str::to_string),
            build_tool,
        }))
    }

    async fn classify(&self, project: &Project, _ctx: &ScanContext) -> Option<TechnologyClassification> {
        generator_config(project)?;
        Some(TechnologyClassification {
            name: TechnologyId::JHipster.key().to_string(),
            tags: vec![TechnologyId::JHipster.key().to_string(), "java".to_string()],
            messages: Vec::new(),
        })
    }
}
