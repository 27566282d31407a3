//! Command line plumbing shared by the binaries.

use std::path::PathBuf;
use tracing::error;

use crate::config::{Config, PathsConfig, DEFAULT_CONFIG_PATH};
use crate::logging::LoggingArgs;

#[derive(clap::Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to configuration.
    #[arg(long, env = "LLIUREX_STATE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

/// Load the configuration and set up logging for `command`.
///
/// Logging goes to the configured log file, or to the default one when the
/// configuration itself is broken so the failure still gets recorded.
/// Errors are logged here; the caller only needs to exit with the code.
pub fn startup(config: &ConfigArgs, logging: &LoggingArgs, command: &str) -> Result<Config, i32> {
    let loaded = Config::read_file(&config.config);

    let log_file = match &loaded {
        Ok(config) => config.paths.log_file.clone(),
        Err(_) => PathsConfig::default().log_file,
    };
    if let Err(e) = logging.init(&log_file, command) {
        eprintln!("Failed to set up logging: {}", e);
        return Err(1);
    }

    loaded.map_err(|e| {
        error!("Error: {}", e);
        1
    })
}

/// Log a fatal error and turn it into the exit code.
pub fn fatal<E: std::fmt::Display>(e: E) -> i32 {
    error!("Error: {}", e);
    1
}
