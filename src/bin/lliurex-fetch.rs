use clap::Parser;
use lliurex_state::cli::{fatal, startup, ConfigArgs};
use lliurex_state::fetcher::Fetcher;
use lliurex_state::logging::LoggingArgs;
use lliurex_state::store::Store;
use lliurex_state::update::update_packages;
use lliurex_state::utils;

#[derive(Parser)]
/// Fetch the package indexes of every release and record what changed.
struct Args {
    #[clap(flatten)]
    config: ConfigArgs,

    #[clap(flatten)]
    logging: LoggingArgs,
}

#[tokio::main]
async fn main() -> Result<(), i32> {
    let args = Args::parse();
    let config = startup(&args.config, &args.logging, "lliurex-fetch")?;

    let store = Store::new(&config.paths.data_dir);
    let fetcher = Fetcher::new(&config).map_err(fatal)?;

    tracing::info!(
        "Fetching package indexes for {}",
        config.mirror.releases.join(", ")
    );
    let summary = update_packages(&fetcher, &store, &config.mirror.releases, utils::now())
        .await
        .map_err(fatal)?;

    tracing::info!(
        "Done: {}/{} releases updated{}",
        summary.releases.len() - summary.failed(),
        summary.releases.len(),
        if summary.wrote_anything() {
            ""
        } else {
            ", no files changed"
        }
    );
    Ok(())
}
