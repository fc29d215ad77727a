use super::scanner::{ScanContext, ScanOptions, TechnologyScanner};
use super::{TechnologyElement, TechnologyId};
use crate::pipeline::analysis::ProjectAnalysis;
use crate::project::Project;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactStack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Detects React from dependencies found by earlier scanners; register after them
pub struct ReactScanner;

#[async_trait]
impl TechnologyScanner for ReactScanner {
    fn id(&self) -> TechnologyId {
        TechnologyId::React
    }

    async fn scan(
        &self,
        _project: &Project,
        _ctx: &ScanContext,
        analysis: &ProjectAnalysis,
        _options: ScanOptions,
    ) -> Option<TechnologyElement> {
        let dependency = analysis.dependencies.iter().find(|d| d.artifact == "react")?;
        Some(TechnologyElement::React(ReactStack {
            version: dependency.version.clone(),
        }))
    }
}
