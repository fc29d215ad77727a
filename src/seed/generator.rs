//! Generating new repositories from seeds
//!
//! The universal generator fully analyzes the seed, asks for whatever
//! parameters its transform recipes need and have not been supplied, then
//! runs the recipes against a copy bound to the new repository. Importing a
//! seed runs a fixed set of Node transforms and registers the result as a
//! seed of the organization.

use super::loader::ProjectLoader;
use super::params::{SeedDrivenCommandParams, SeedError};
use super::registry::{validate_seed, SeedRegistry};
use super::selected_repo::SelectedRepo;
use crate::notify::{Message, Notifier};
use crate::pipeline::ProjectAnalyzer;
use crate::preference::Enablement;
use crate::project::{Project, RepoRef};
use crate::stack::ScanContext;
use crate::transform::{
    CodeTransform, ParameterSpec, ProvenanceFile, SdmEnablementTransform, SeedAnalysis, TransformParams,
    UpdatePackageJsonIdentification, UpdateReadmeTitle,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const UNIVERSAL_GENERATOR: &str = "UniversalGenerator";
const SEED_ANALYSIS_TITLE: &str = "Seed Analysis";
const DEFAULT_SEED_DESCRIPTION: &str = "My new seed project";

/// Asks the user for parameter values
#[async_trait]
pub trait ParameterPrompt: Send + Sync {
    async fn prompt(&self, parameters: &[ParameterSpec]) -> Result<TransformParams>;
}

/// Answers nothing; defaults apply and required parameters fail
pub struct NoPrompt;

#[async_trait]
impl ParameterPrompt for NoPrompt {
    async fn prompt(&self, _parameters: &[ParameterSpec]) -> Result<TransformParams> {
        Ok(TransformParams::new())
    }
}

/// A generated project and what went into it
#[derive(Debug)]
pub struct Generated {
    pub project: Project,
    pub params: TransformParams,
    pub transforms: Vec<String>,
}

fn missing_parameters(seed: &SeedAnalysis, supplied: &TransformParams) -> Vec<ParameterSpec> {
    let mut seen = BTreeSet::new();
    seed.parameters()
        .into_iter()
        .filter(|p| !supplied.get(&p.name).is_some_and(|v| !v.is_empty()))
        .filter(|p| seen.insert(p.name.clone()))
        .cloned()
        .collect()
}

/// Fill defaults, then check required parameters and patterns
pub fn resolve_parameters(parameters: &[&ParameterSpec], mut params: TransformParams) -> Result<TransformParams> {
    for spec in parameters {
        let value = match params.get(&spec.name).filter(|v| !v.is_empty()) {
            Some(value) => value.clone(),
            None => match &spec.default_value {
                Some(default) => default.clone(),
                None if spec.required => {
                    return Err(SeedError::MissingParameter {
                        name: spec.name.clone(),
                    }
                    .into())
                }
                None => continue,
            },
        };
        if let Some(pattern) = &spec.pattern {
            let regex = Regex::new(pattern)
                .with_context(|| format!("Invalid pattern for parameter '{}'", spec.name))?;
            if !regex.is_match(&value) {
                return Err(SeedError::InvalidParameter {
                    name: spec.name.clone(),
                    value,
                }
                .into());
            }
        }
        params.insert(spec.name.clone(), value);
    }
    Ok(params)
}

async fn run_transforms(project: &Project, transforms: &[Arc<dyn CodeTransform>], params: &TransformParams) -> Result<()> {
    for transform in transforms {
        debug!(transform = %transform.name(), "Applying transform");
        transform
            .apply(project, params)
            .await
            .with_context(|| format!("Transform {} failed", transform.name()))?;
    }
    Ok(())
}

pub struct UniversalGenerator {
    analyzer: ProjectAnalyzer,
    loader: Arc<dyn ProjectLoader>,
    scan: ScanContext,
    notifier: Arc<dyn Notifier>,
    enablement: Enablement,
    sdm_name: String,
}

impl UniversalGenerator {
    pub fn new(
        analyzer: ProjectAnalyzer,
        loader: Arc<dyn ProjectLoader>,
        scan: ScanContext,
        notifier: Arc<dyn Notifier>,
        enablement: Enablement,
        sdm_name: impl Into<String>,
    ) -> Self {
        Self {
            analyzer,
            loader,
            scan,
            notifier,
            enablement,
            sdm_name: sdm_name.into(),
        }
    }

    fn enablement_transform(&self) -> Arc<dyn CodeTransform> {
        Arc::new(SdmEnablementTransform {
            enablement: self.enablement.clone(),
            sdm_name: self.sdm_name.clone(),
            notifier: self.notifier.clone(),
        })
    }

    async fn display_messages(&self, seed: &SeedAnalysis) -> Result<()> {
        for message in seed.messages() {
            self.notifier.send(Message::info(SEED_ANALYSIS_TITLE, message)).await?;
        }
        for warning in seed.warnings() {
            self.notifier.send(Message::warning(SEED_ANALYSIS_TITLE, warning)).await?;
        }
        Ok(())
    }

    /// Creates `target` from the seed described by `seed_params`
    pub async fn generate(
        &self,
        seed_params: &SeedDrivenCommandParams,
        target: RepoRef,
        supplied: TransformParams,
        prompt: &dyn ParameterPrompt,
    ) -> Result<Generated> {
        seed_params.validate()?;
        let seed_repo = seed_params.to_repo_ref()?;
        let seed_project = self.loader.load(&seed_repo).await?;
        let analysis = self.analyzer.analyze_seed(&seed_project, &self.scan).await?;
        let seed = analysis.seed_analysis.unwrap_or_default();

        let missing = missing_parameters(&seed, &supplied);
        let mut params = supplied;
        if !missing.is_empty() {
            params.extend(prompt.prompt(&missing).await?);
        }
        let params = resolve_parameters(&seed.parameters(), params)?;

        self.display_messages(&seed).await?;
        let transforms = seed.transforms();
        self.notifier
            .send(Message::plain(format!(
                "Running {} transform{} against your seed project",
                transforms.len(),
                if transforms.len() == 1 { "" } else { "s" }
            )))
            .await?;

        let project = seed_project.rebind(target);
        let provenance: Arc<dyn CodeTransform> = Arc::new(ProvenanceFile {
            sdm_name: self.sdm_name.clone(),
            seed_url: seed_params.seed_url.clone(),
            originators: seed.originators().into_iter().map(String::from).collect(),
        });
        let mut chain = vec![provenance];
        chain.extend(transforms);
        chain.push(self.enablement_transform());
        if let Err(e) = run_transforms(&project, &chain, &params).await {
            warn!("Error transforming project: {:#}", e);
            return Err(e);
        }

        info!(target = %project.id().slug(), seed = %seed_params.seed_url, "Generated project from seed");
        Ok(Generated {
            transforms: chain.iter().map(|t| t.name().to_string()).collect(),
            project,
            params,
        })
    }

    /// Copies a Node seed into `target` and registers the copy as a seed
    pub async fn import_seed(
        &self,
        seed_params: &SeedDrivenCommandParams,
        target: RepoRef,
        description: Option<&str>,
        params: TransformParams,
        registry: &SeedRegistry,
    ) -> Result<Project> {
        let seed_project = validate_seed(
            &self.analyzer,
            self.loader.as_ref(),
            &self.scan,
            seed_params,
            self.notifier.as_ref(),
        )
        .await?;
        let project = seed_project.rebind(target);
        let chain: Vec<Arc<dyn CodeTransform>> = vec![
            Arc::new(UpdateReadmeTitle),
            Arc::new(UpdatePackageJsonIdentification),
            Arc::new(ProvenanceFile {
                sdm_name: self.sdm_name.clone(),
                seed_url: seed_params.seed_url.clone(),
                originators: vec!["node".to_string()],
            }),
            self.enablement_transform(),
        ];
        run_transforms(&project, &chain, &params).await?;

        let id = project.id();
        let seed_url = id
            .url
            .clone()
            .unwrap_or_else(|| format!("https://github.com/{}/{}", id.owner, id.repo));
        registry
            .add(SelectedRepo::new(
                seed_url,
                description.filter(|d| !d.is_empty()).unwrap_or(DEFAULT_SEED_DESCRIPTION),
            ))
            .await?;
        Ok(project)
    }
}
