use stackgoals::cli::commands::{CliArgs, Commands};
use stackgoals::cli::handlers::{
    handle_analyze, handle_classify, handle_deployment, handle_enablement, handle_goal, handle_namespace,
    handle_plan, handle_repo, handle_seeds,
};
use stackgoals::util::logging::{init_logging, parse_level, LoggingConfig};
use stackgoals::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("stackgoals v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Analyze(analyze_args) => handle_analyze(analyze_args).await,
        Commands::Classify(classify_args) => handle_classify(classify_args).await,
        Commands::Plan(plan_args) => handle_plan(plan_args).await,
        Commands::Seeds(command) => handle_seeds(command).await,
        Commands::Enable(target) => handle_enablement(target, true).await,
        Commands::Disable(target) => handle_enablement(target, false).await,
        Commands::Goal(command) => handle_goal(command).await,
        Commands::Deployment(command) => handle_deployment(command).await,
        Commands::Namespace => handle_namespace().await,
        Commands::Repo(command) => handle_repo(command).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("STACKGOALS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    };

    let use_json = env::var("STACKGOALS_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        use_json,
        ..LoggingConfig::with_level(level)
    });
}
