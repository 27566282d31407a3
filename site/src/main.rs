use anyhow::{Context, Result};
use clap::Parser;
use lliurex_site::{write_pages, Renderer, SiteData};
use lliurex_state::cli::{fatal, startup, ConfigArgs};
use lliurex_state::logging::LoggingArgs;
use lliurex_state::store::{write_if_changed, Store};
use lliurex_state::Config;
use tracing::info;

#[derive(Parser)]
/// Render the status pages and the README from the stored state.
struct Args {
    #[clap(flatten)]
    config: ConfigArgs,

    #[clap(flatten)]
    logging: LoggingArgs,
}

fn render(config: &Config) -> Result<()> {
    let store = Store::new(&config.paths.data_dir);
    let data = SiteData::load(config, &store).context("Failed to load state")?;
    let renderer = Renderer::new().context("Failed to load templates")?;

    let pages = renderer.render_site(&data)?;
    let written = write_pages(&config.paths.site_dir, &pages)
        .context("Failed to write pages")?
        .into_iter()
        .filter(|(_, outcome)| outcome.is_written())
        .count();

    let readme = renderer.render_readme(&data)?;
    let readme_outcome = write_if_changed(&config.paths.readme, readme.as_bytes())
        .context("Failed to write README")?;

    info!(
        "Rendered {} pages ({} changed), README {}",
        pages.len(),
        written,
        if readme_outcome.is_written() {
            "updated"
        } else {
            "unchanged"
        }
    );
    Ok(())
}

fn main() -> Result<(), i32> {
    let args = Args::parse();
    let config = startup(&args.config, &args.logging, "lliurex-render")?;
    render(&config).map_err(|e| fatal(format!("{:#}", e)))
}
