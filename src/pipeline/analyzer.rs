//! Entry point for analysis: scan, interpret and optionally collect seed recipes.
//!
//! [`AnalyzerBuilder`] assembles scanners, interpreters and transform recipe
//! contributors, either one at a time or per stack through [`StackSupport`].
//! [`default_analyzer`] registers the built-in stacks in the order the
//! interpreters depend on.

use super::analysis::ProjectAnalysis;
use super::context::AnalysisContext;
use super::orchestrator::PipelineOrchestrator;
use super::phase_trait::WorkflowPhase;
use super::phases::{classify, InterpretPhase, ScanPhase, SeedPhase};
use crate::interpret::{Interpretation, RegisteredInterpreter, ReviewListener};
use crate::interpreters::{
    not_jhipster, CodeInspectionInterpreter, DelegateToTravisInterpreter, DockerInterpreter,
    DotnetCoreInterpreter, EmulateTravisInterpreter, JHipsterInterpreter, K8sDeployInterpreter,
    NodeInterpreter,
};
use crate::k8s::DeploymentClient;
use crate::progress::ProgressHandler;
use crate::project::Project;
use crate::stack::{
    ScanContext, ScanOptions, StackRegistry, TechnologyClassification, TechnologyScanner,
};
use crate::transform::{
    DotnetCoreTransformRecipeContributor, NodeTransformRecipeContributor,
    ReferencedEnvironmentVariableTransformRecipeContributor, TransformRecipeContribution,
};
use anyhow::Result;
use std::sync::Arc;

/// Everything one stack brings to the analyzer
#[derive(Default)]
pub struct StackSupport {
    pub scanners: Vec<Arc<dyn TechnologyScanner>>,
    pub interpreters: Vec<RegisteredInterpreter>,
    pub contributors: Vec<TransformRecipeContribution>,
}

/// Analysis plus the goals interpreted from it
#[derive(Debug, Clone)]
pub struct Interpreted {
    pub analysis: ProjectAnalysis,
    pub interpretation: Interpretation,
}

pub struct AnalyzerBuilder {
    registry: StackRegistry,
    interpreters: Vec<RegisteredInterpreter>,
    contributions: Vec<TransformRecipeContribution>,
    progress: Option<Arc<dyn ProgressHandler>>,
}

impl AnalyzerBuilder {
    /// No scanners at all
    pub fn new() -> Self {
        Self::from_registry(StackRegistry::new())
    }

    pub fn from_registry(registry: StackRegistry) -> Self {
        Self {
            registry,
            interpreters: Vec::new(),
            contributions: Vec::new(),
            progress: None,
        }
    }

    pub fn with_stack(mut self, support: StackSupport) -> Self {
        for scanner in support.scanners {
            self.registry.register(scanner);
        }
        self.interpreters.extend(support.interpreters);
        self.contributions.extend(support.contributors);
        self
    }

    pub fn with_scanner(mut self, scanner: Arc<dyn TechnologyScanner>) -> Self {
        self.registry.register(scanner);
        self
    }

    pub fn with_interpreter(mut self, interpreter: RegisteredInterpreter) -> Self {
        self.interpreters.push(interpreter);
        self
    }

    pub fn with_transform_recipe_contributor(mut self, contribution: TransformRecipeContribution) -> Self {
        self.contributions.push(contribution);
        self
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress = Some(handler);
        self
    }

    pub fn build(self) -> ProjectAnalyzer {
        ProjectAnalyzer {
            registry: Arc::new(self.registry),
            interpreters: Arc::new(self.interpreters),
            contributions: Arc::new(self.contributions),
            progress: self.progress,
        }
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct ProjectAnalyzer {
    registry: Arc<StackRegistry>,
    interpreters: Arc<Vec<RegisteredInterpreter>>,
    contributions: Arc<Vec<TransformRecipeContribution>>,
    progress: Option<Arc<dyn ProgressHandler>>,
}

impl ProjectAnalyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    fn scan_phase(&self) -> Box<dyn WorkflowPhase> {
        Box::new(ScanPhase::new(self.registry.clone(), self.progress.clone()))
    }

    fn interpret_phase(&self) -> Box<dyn WorkflowPhase> {
        Box::new(InterpretPhase::new(self.interpreters.clone(), self.progress.clone()))
    }

    fn seed_phase(&self) -> Box<dyn WorkflowPhase> {
        Box::new(SeedPhase::new(self.contributions.clone()))
    }

    async fn run(&self, phases: Vec<Box<dyn WorkflowPhase>>, context: &mut AnalysisContext) -> Result<()> {
        PipelineOrchestrator::new(self.progress.clone())
            .execute(&phases, context)
            .await
    }

    /// Scan only
    pub async fn analyze(&self, project: &Project, ctx: &ScanContext, options: ScanOptions) -> Result<ProjectAnalysis> {
        let mut context = AnalysisContext::new(project.clone(), ctx.clone(), options);
        self.run(vec![self.scan_phase()], &mut context).await?;
        Ok(context.analysis)
    }

    /// Full scan plus transform recipes, for a project used as a generator seed
    pub async fn analyze_seed(&self, project: &Project, ctx: &ScanContext) -> Result<ProjectAnalysis> {
        let mut context = AnalysisContext::new(project.clone(), ctx.clone(), ScanOptions::full()).with_recipes();
        self.run(vec![self.scan_phase(), self.seed_phase()], &mut context)
            .await?;
        Ok(context.analysis)
    }

    /// Scan, then run every interpreter over the result
    pub async fn interpret(&self, project: &Project, ctx: &ScanContext, options: ScanOptions) -> Result<Interpreted> {
        let mut context = AnalysisContext::new(project.clone(), ctx.clone(), options);
        self.run(vec![self.scan_phase(), self.interpret_phase()], &mut context)
            .await?;
        Ok(Interpreted {
            analysis: context.analysis,
            interpretation: context.interpretation,
        })
    }

    /// Classifiers only; no scanning
    pub async fn classify(&self, project: &Project, ctx: &ScanContext) -> Vec<TechnologyClassification> {
        classify(&self.registry, project, ctx).await
    }

    pub fn interpreter_names(&self) -> Vec<&str> {
        self.interpreters.iter().map(|i| i.name()).collect()
    }
}

/// Built-in stacks with their interpreters and recipe contributors
pub fn default_analyzer(
    client: Arc<dyn DeploymentClient>,
    listeners: Vec<Arc<dyn ReviewListener>>,
) -> AnalyzerBuilder {
    AnalyzerBuilder::from_registry(StackRegistry::with_defaults())
        .with_interpreter(RegisteredInterpreter::new(Arc::new(NodeInterpreter)).when(not_jhipster()))
        .with_interpreter(RegisteredInterpreter::new(Arc::new(DotnetCoreInterpreter)))
        .with_interpreter(RegisteredInterpreter::new(Arc::new(DockerInterpreter)).when(not_jhipster()))
        .with_interpreter(RegisteredInterpreter::new(Arc::new(JHipsterInterpreter)))
        .with_interpreter(RegisteredInterpreter::new(Arc::new(EmulateTravisInterpreter)))
        .with_interpreter(RegisteredInterpreter::new(Arc::new(DelegateToTravisInterpreter)))
        .with_interpreter(RegisteredInterpreter::new(Arc::new(K8sDeployInterpreter::new(client))))
        .with_interpreter(RegisteredInterpreter::new(Arc::new(CodeInspectionInterpreter::new(listeners))))
        .with_transform_recipe_contributor(TransformRecipeContribution::new(
            "dotnetcore",
            Arc::new(DotnetCoreTransformRecipeContributor),
        ))
        .with_transform_recipe_contributor(TransformRecipeContribution::new(
            "node",
            Arc::new(NodeTransformRecipeContributor),
        ))
        .with_transform_recipe_contributor(TransformRecipeContribution::new(
            "env-vars",
            Arc::new(ReferencedEnvironmentVariableTransformRecipeContributor),
        ))
}
