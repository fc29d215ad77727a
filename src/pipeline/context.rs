//! State threaded through the pipeline phases

use super::analysis::ProjectAnalysis;
use crate::interpret::Interpretation;
use crate::project::Project;
use crate::stack::{ScanContext, ScanOptions};

/// Owns the analysis and interpretation for one run; phases take it by `&mut`
pub struct AnalysisContext {
    pub project: Project,
    pub scan: ScanContext,
    pub options: ScanOptions,
    pub analysis: ProjectAnalysis,
    pub interpretation: Interpretation,
    /// Collect transform recipes for use as a generator seed
    pub request_recipes: bool,
}

impl AnalysisContext {
    pub fn new(project: Project, scan: ScanContext, options: ScanOptions) -> Self {
        let analysis = ProjectAnalysis::new(project.id().clone(), options);
        Self {
            project,
            scan,
            options,
            analysis,
            interpretation: Interpretation::default(),
            request_recipes: false,
        }
    }

    pub fn with_recipes(mut self) -> Self {
        self.request_recipes = true;
        self
    }
}
