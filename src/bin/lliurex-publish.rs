use clap::Parser;
use lliurex_state::cli::{fatal, startup, ConfigArgs};
use lliurex_state::logging::LoggingArgs;
use lliurex_state::publish::{commit_message, PublishOutcome, Publisher};
use lliurex_state::utils;
use std::path::PathBuf;

#[derive(Parser)]
/// Commit and push the state, pages and README if any of them changed.
struct Args {
    /// Commit message; defaults to one naming the time of the run.
    #[clap(long)]
    message: Option<String>,

    /// Commit but don't push.
    #[clap(long)]
    no_push: bool,

    /// Root of the git working tree.
    #[clap(long, default_value = ".")]
    repo: PathBuf,

    #[clap(flatten)]
    config: ConfigArgs,

    #[clap(flatten)]
    logging: LoggingArgs,
}

#[tokio::main]
async fn main() -> Result<(), i32> {
    let args = Args::parse();
    let config = startup(&args.config, &args.logging, "lliurex-publish")?;

    let mut publisher = Publisher::new(&args.repo, &config.publish);
    if args.no_push {
        publisher = publisher.without_push();
    }

    let paths = vec![
        config.paths.data_dir.clone(),
        config.paths.site_dir.clone(),
        config.paths.readme.clone(),
    ];
    let message = args
        .message
        .unwrap_or_else(|| commit_message("lliurex-publish", utils::now()));

    match publisher.publish(&paths, &message).await.map_err(fatal)? {
        PublishOutcome::NoChanges => tracing::info!("No changes"),
        PublishOutcome::Committed => tracing::info!("Committed without pushing"),
        PublishOutcome::Pushed => tracing::info!("Published"),
    }
    Ok(())
}
