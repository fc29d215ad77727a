//! Command handlers; each returns the process exit code

use super::commands::{
    AnalyzeArgs, ClassifyArgs, DeploymentCommand, EnablementArgs, GoalCommand, PlanArgs, ProjectArgs,
    RepoCommand, SeedArgs, SeedsCommand,
};
use super::output::OutputFormatter;
use crate::config::MachineConfig;
use crate::fs::RealFileSystem;
use crate::github::{delete_repo, select_repo_to_delete, GitHubHosting, RepoHosting};
use crate::interpret::{NotifyingReviewListener, ReviewListener};
use crate::k8s::{namespace, DeploymentClient, StaticDeploymentClient};
use crate::machine::Machine;
use crate::notify::{ConsoleNotifier, Notifier};
use crate::pipeline::{default_analyzer, ProjectAnalyzer};
use crate::preference::{
    configure_deployment, show_deployment, toggle_goal_enablement, DeploymentPhase, Enablement, EnablementTarget,
    FilePreferenceStore, Preferences,
};
use crate::progress::LoggingHandler;
use crate::project::{Project, PushContext, RepoRef};
use crate::seed::{GitCloneLoader, SeedDrivenCommandParams, SeedRegistry};
use crate::stack::{ScanContext, ScanOptions};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};

const DEFAULT_SEED_DESCRIPTION: &str = "Seed project";

/// Everything a command needs, built from the environment
struct CliContext {
    config: MachineConfig,
    preferences: Preferences,
    client: Arc<dyn DeploymentClient>,
    notifier: Arc<dyn Notifier>,
}

impl CliContext {
    fn from_env() -> Result<Self> {
        let config = MachineConfig::from_env().context("Failed to load configuration")?;
        config.validate().context("Invalid configuration")?;
        debug!("{}", config);

        let path = config
            .preferences_path
            .clone()
            .unwrap_or_else(FilePreferenceStore::default_path);
        debug!(path = %path.display(), "Using preference file");
        let preferences = Preferences::new(Arc::new(FilePreferenceStore::new(path)));
        let client: Arc<dyn DeploymentClient> = Arc::new(StaticDeploymentClient::new(config.k8s_clusters.clone()));

        Ok(Self {
            config,
            preferences,
            client,
            notifier: Arc::new(ConsoleNotifier),
        })
    }

    fn analyzer(&self) -> ProjectAnalyzer {
        let listener: Arc<dyn ReviewListener> = Arc::new(NotifyingReviewListener::new(self.notifier.clone()));
        default_analyzer(self.client.clone(), vec![listener])
            .with_progress(Arc::new(LoggingHandler))
            .build()
    }

    fn hosting(&self) -> Result<Arc<dyn RepoHosting>> {
        let hosting = GitHubHosting::new(&self.config.github_api, self.config.github_token.clone())?;
        Ok(Arc::new(hosting))
    }

    fn scan_context(&self) -> ScanContext {
        ScanContext::new(self.preferences.clone()).with_ephemeral_deployments(self.config.ephemeral_deployments)
    }
}

fn report(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn open_project(args: &ProjectArgs) -> Result<Project> {
    let path = args
        .repository_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let root = path
        .canonicalize()
        .with_context(|| format!("Repository path does not exist: {}", path.display()))?;
    if !root.is_dir() {
        anyhow::bail!("Repository path is not a directory: {}", root.display());
    }
    let repo = match &args.repo {
        Some(repo) => repo.clone(),
        None => root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string()),
    };
    Ok(Project::new(RepoRef::new(&args.owner, repo), Arc::new(RealFileSystem::new(root))))
}

fn print(output: String) {
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
}

pub async fn handle_analyze(args: &AnalyzeArgs) -> i32 {
    report(analyze(args).await)
}

async fn analyze(args: &AnalyzeArgs) -> Result<()> {
    let ctx = CliContext::from_env()?;
    let project = open_project(&args.project)?;
    let options = if args.full { ScanOptions::full() } else { ScanOptions::fast() };
    let analysis = ctx.analyzer().analyze(&project, &ctx.scan_context(), options).await?;
    print(OutputFormatter::new(args.format.into()).format_analysis(&analysis)?);
    Ok(())
}

pub async fn handle_classify(args: &ClassifyArgs) -> i32 {
    report(classify(args).await)
}

async fn classify(args: &ClassifyArgs) -> Result<()> {
    let ctx = CliContext::from_env()?;
    let project = open_project(&args.project)?;
    let classifications = ctx.analyzer().classify(&project, &ctx.scan_context()).await;
    print(OutputFormatter::new(args.format.into()).format_classifications(&classifications)?);
    Ok(())
}

pub async fn handle_plan(args: &PlanArgs) -> i32 {
    report(plan(args).await)
}

async fn plan(args: &PlanArgs) -> Result<()> {
    let ctx = CliContext::from_env()?;
    let project = open_project(&args.project)?;
    let push = PushContext::new(
        project.id().clone().with_branch(&args.branch),
        &args.branch,
        &args.default_branch,
    )
    .with_changed_files(args.changed.iter().cloned())
    .with_first_push(args.first_push);

    let analyzer = ctx.analyzer();
    let hosting = ctx.hosting()?;
    let machine =
        Machine::new(ctx.config, analyzer, ctx.preferences, ctx.client).with_hosting(hosting, ctx.notifier);
    let plan = machine.plan_push(&project, &push).await?;
    print(OutputFormatter::new(args.format.into()).format_plan(&plan)?);
    Ok(())
}

fn seed_params(args: &SeedArgs) -> SeedDrivenCommandParams {
    SeedDrivenCommandParams {
        seed_url: args.seed_url.clone(),
        git_ref: args.git_ref.clone(),
        path: args.path.clone(),
    }
}

pub async fn handle_seeds(command: &SeedsCommand) -> i32 {
    report(seeds(command).await)
}

async fn seeds(command: &SeedsCommand) -> Result<()> {
    let ctx = CliContext::from_env()?;
    let registry = SeedRegistry::new(ctx.preferences.clone(), ctx.notifier.clone());
    match command {
        SeedsCommand::List => {
            registry.list().await?;
        }
        SeedsCommand::Add(args) => {
            let loader = GitCloneLoader::new(std::env::temp_dir().join("stackgoals-seeds"));
            let description = args.description.as_deref().unwrap_or(DEFAULT_SEED_DESCRIPTION);
            registry
                .add_validated(&ctx.analyzer(), &loader, &ctx.scan_context(), &seed_params(args), description)
                .await?;
        }
        SeedsCommand::Remove(args) => {
            registry.remove(&seed_params(args)).await?;
        }
    }
    Ok(())
}

pub async fn handle_enablement(args: &EnablementArgs, opt_in: bool) -> i32 {
    report(enablement(args, opt_in).await)
}

async fn enablement(args: &EnablementArgs, opt_in: bool) -> Result<()> {
    let ctx = CliContext::from_env()?;
    let target = match (&args.repo, args.org) {
        (Some(repo), false) => EnablementTarget::repo(&args.owner, repo),
        _ => EnablementTarget::org(&args.owner),
    };
    Enablement::new(ctx.preferences.clone(), ctx.config.default_enablement)
        .toggle(&target, opt_in, &ctx.config.name, ctx.notifier.as_ref())
        .await
}

pub async fn handle_goal(command: &GoalCommand) -> i32 {
    report(goal(command).await)
}

async fn goal(command: &GoalCommand) -> Result<()> {
    let ctx = CliContext::from_env()?;
    let (name, opt_in) = match command {
        GoalCommand::Enable { name } => (name, true),
        GoalCommand::Disable { name } => (name, false),
    };
    toggle_goal_enablement(
        &ctx.preferences,
        &ctx.config.optional_goals,
        name,
        opt_in,
        ctx.notifier.as_ref(),
    )
    .await
}

pub async fn handle_deployment(command: &DeploymentCommand) -> i32 {
    report(deployment(command).await)
}

async fn deployment(command: &DeploymentCommand) -> Result<()> {
    let ctx = CliContext::from_env()?;
    match command {
        DeploymentCommand::Configure { phase, cluster, ns } => {
            let phase: DeploymentPhase = phase.parse()?;
            configure_deployment(
                &ctx.preferences,
                ctx.client.as_ref(),
                ctx.notifier.as_ref(),
                phase,
                cluster,
                ns,
            )
            .await?;
        }
        DeploymentCommand::Show => {
            show_deployment(&ctx.preferences, ctx.notifier.as_ref(), &ctx.config.name).await?;
        }
    }
    Ok(())
}

pub async fn handle_repo(command: &RepoCommand) -> i32 {
    report(repo(command).await)
}

async fn repo(command: &RepoCommand) -> Result<()> {
    let ctx = CliContext::from_env()?;
    match command {
        RepoCommand::Delete { owner, repo, yes } => {
            let repo = RepoRef::new(owner, repo);
            if *yes {
                delete_repo(ctx.hosting()?.as_ref(), &repo, ctx.notifier.as_ref()).await?;
            } else {
                select_repo_to_delete(&repo, ctx.notifier.as_ref()).await?;
            }
        }
    }
    Ok(())
}

pub async fn handle_namespace() -> i32 {
    report(print_namespace())
}

fn print_namespace() -> Result<()> {
    let config = MachineConfig::from_env().context("Failed to load configuration")?;
    let workspace_id = config.require_workspace_id()?;
    println!("{}", namespace(workspace_id, &config.environment));
    Ok(())
}
