use clap::Parser;
use lliurex_state::cli::{fatal, startup, ConfigArgs};
use lliurex_state::logging::LoggingArgs;
use lliurex_state::prober::Prober;
use lliurex_state::store::Store;
use lliurex_state::update::update_status;
use lliurex_state::Vantage;

#[derive(Parser)]
/// Check whether each mirror release is reachable.
struct Args {
    /// Network position the probe runs from.
    #[clap(long, value_enum, default_value_t = Vantage::External)]
    vantage: Vantage,

    #[clap(flatten)]
    config: ConfigArgs,

    #[clap(flatten)]
    logging: LoggingArgs,
}

#[tokio::main]
async fn main() -> Result<(), i32> {
    let args = Args::parse();
    let config = startup(&args.config, &args.logging, "lliurex-probe")?;

    let store = Store::new(&config.paths.data_dir);
    let prober = Prober::new(&config, args.vantage).map_err(fatal)?;

    tracing::info!(
        "Probing {} from {}",
        config.base_url_for(args.vantage),
        args.vantage
    );
    let outcome = update_status(&prober, &store, config.probe.history_limit)
        .await
        .map_err(fatal)?;

    if outcome.changed() {
        tracing::info!("{} change(s) recorded", outcome.changes.len());
    }
    Ok(())
}
