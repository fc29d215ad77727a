use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Stack detection and goal planning for a software delivery machine
#[derive(Parser, Debug)]
#[command(
    name = "stackgoals",
    about = "Stack detection and goal planning for a software delivery machine",
    version,
    long_about = "stackgoals scans a project for the technology stacks it uses, interprets \
                  them into a goal graph for a delivery scheduler, and manages the machine's \
                  seeds, enablement and deployment preferences."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Verbose logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Detect the technology stacks of a project",
        long_about = "Runs every scanner against the project and prints the resulting analysis.\n\n\
                      Examples:\n  \
                      stackgoals analyze\n  \
                      stackgoals analyze /path/to/repo --full --format json"
    )]
    Analyze(AnalyzeArgs),

    #[command(about = "Cheap classification of a project without a full scan")]
    Classify(ClassifyArgs),

    #[command(
        about = "Plan the goals for a push",
        long_about = "Analyzes and interprets the project, then applies the machine's push rules \
                      to produce the goal graph.\n\n\
                      Examples:\n  \
                      stackgoals plan --branch feature/x --changed src/index.ts"
    )]
    Plan(PlanArgs),

    #[command(subcommand, about = "Manage generator seeds")]
    Seeds(SeedsCommand),

    #[command(about = "Enable the machine for a repository or organization")]
    Enable(EnablementArgs),

    #[command(about = "Disable the machine for a repository or organization")]
    Disable(EnablementArgs),

    #[command(subcommand, about = "Toggle optional goals")]
    Goal(GoalCommand),

    #[command(subcommand, about = "Configure Kubernetes deployment targets")]
    Deployment(DeploymentCommand),

    #[command(about = "Print the namespace for machine-managed deployments")]
    Namespace,

    #[command(subcommand, about = "Manage hosted repositories")]
    Repo(RepoCommand),
}

/// Identifies the project being worked on
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(value_name = "PATH", help = "Path to repository (defaults to current directory)")]
    pub repository_path: Option<PathBuf>,

    #[arg(long, default_value = "local", help = "Repository owner")]
    pub owner: String,

    #[arg(long, help = "Repository name (defaults to the directory name)")]
    pub repo: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[arg(long, help = "Run the expensive scan steps as well")]
    pub full: bool,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[arg(long, default_value = "main", help = "Branch pushed to")]
    pub branch: String,

    #[arg(long, default_value = "main", help = "Default branch of the repository")]
    pub default_branch: String,

    #[arg(long, value_delimiter = ',', value_name = "FILES", help = "Files changed by the push")]
    pub changed: Vec<String>,

    #[arg(long, help = "Treat as the first push to a new repository (publishes topics)")]
    pub first_push: bool,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Subcommand, Debug)]
pub enum SeedsCommand {
    #[command(about = "List seeds registered for the organization")]
    List,

    #[command(about = "Validate and register a seed")]
    Add(SeedArgs),

    #[command(about = "Remove a registered seed")]
    Remove(SeedArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    #[arg(value_name = "URL", help = "Seed repository URL")]
    pub seed_url: String,

    #[arg(long = "ref", value_name = "REF", help = "Branch or sha")]
    pub git_ref: Option<String>,

    #[arg(long, help = "Path within the repository")]
    pub path: Option<String>,

    #[arg(long, help = "Description shown when choosing a seed")]
    pub description: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EnablementArgs {
    #[arg(long, help = "Repository owner")]
    pub owner: String,

    #[arg(long, required_unless_present = "org", help = "Repository name")]
    pub repo: Option<String>,

    #[arg(long, help = "Apply to the whole organization")]
    pub org: bool,
}

#[derive(Subcommand, Debug)]
pub enum GoalCommand {
    Enable {
        #[arg(value_name = "GOAL")]
        name: String,
    },
    Disable {
        #[arg(value_name = "GOAL")]
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DeploymentCommand {
    #[command(about = "Deploy a phase to a cluster and namespace")]
    Configure {
        #[arg(value_name = "PHASE", help = "testing or production")]
        phase: String,

        #[arg(value_name = "CLUSTER")]
        cluster: String,

        #[arg(value_name = "NAMESPACE")]
        ns: String,
    },

    #[command(about = "Show configured deployment targets")]
    Show,
}

#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    #[command(about = "Delete a repository from the source host")]
    Delete {
        #[arg(long, help = "Repository owner")]
        owner: String,

        #[arg(long, help = "Repository name")]
        repo: String,

        #[arg(long, help = "Delete without asking for confirmation")]
        yes: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
