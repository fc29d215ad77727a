//! Analysis pipeline: scan, interpret and seed phases run by an orchestrator

pub mod analysis;
pub mod analyzer;
pub mod context;
pub mod orchestrator;
pub mod phase_trait;
pub mod phases;

pub use analysis::ProjectAnalysis;
pub use analyzer::{default_analyzer, AnalyzerBuilder, Interpreted, ProjectAnalyzer, StackSupport};
pub use context::AnalysisContext;
pub use orchestrator::PipelineOrchestrator;
pub use phase_trait::WorkflowPhase;
