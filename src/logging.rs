use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Errors setting up logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("cannot open log file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(clap::Args, Debug, Clone, Default)]
#[group()]
pub struct LoggingArgs {
    /// Enable debug mode.
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Append the log to this file instead of the configured one.
    #[arg(long, env = "LLIUREX_STATE_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl LoggingArgs {
    /// The log file to append to, preferring the command line.
    pub fn log_file<'a>(&'a self, configured: &'a Path) -> &'a Path {
        self.log_file.as_deref().unwrap_or(configured)
    }

    pub fn init(&self, configured_log_file: &Path, command: &str) -> Result<(), LoggingError> {
        init_logging(self.log_file(configured_log_file), command, self.debug)
    }
}

fn default_filter(debug_mode: bool) -> &'static str {
    if debug_mode {
        "lliurex_state=debug,lliurex_site=debug,apt_index=debug,info"
    } else {
        "info"
    }
}

/// Log to stderr and append to `log_file`.
///
/// `RUST_LOG` overrides the default filter. A header line naming `command`
/// and the start time separates runs in the file.
pub fn init_logging(log_file: &Path, command: &str, debug_mode: bool) -> Result<(), LoggingError> {
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = log_file.file_name().ok_or_else(|| LoggingError::Io {
        path: log_file.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path"),
    })?;
    write_run_header(dir, log_file, command)?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter(debug_mode))?,
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug_mode)
        .with_line_number(debug_mode);

    let file_layer = fmt::layer()
        .with_writer(tracing_appender::rolling::never(dir, file_name))
        .with_ansi(false);

    Registry::default()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

fn write_run_header(dir: &Path, log_file: &Path, command: &str) -> Result<(), LoggingError> {
    let io_error = |source: std::io::Error| LoggingError::Io {
        path: log_file.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(io_error)?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(io_error)?;
    writeln!(
        file,
        "===== {} started at {} =====",
        command,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
    .map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_command_line_log_file_wins() {
        let args = LoggingArgs {
            debug: false,
            log_file: Some(PathBuf::from("/tmp/other.log")),
        };
        assert_eq!(
            args.log_file(Path::new("logs/lliurex-state.log")),
            Path::new("/tmp/other.log")
        );
        assert_eq!(
            LoggingArgs::default().log_file(Path::new("logs/lliurex-state.log")),
            Path::new("logs/lliurex-state.log")
        );
    }

    #[test]
    fn test_run_header_is_appended() {
        let dir = TempDir::new().unwrap();
        let log_file = dir.path().join("logs").join("run.log");

        write_run_header(&dir.path().join("logs"), &log_file, "lliurex-fetch").unwrap();
        write_run_header(&dir.path().join("logs"), &log_file, "lliurex-probe").unwrap();

        let contents = std::fs::read_to_string(&log_file).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("===== lliurex-fetch started at "));
        assert!(lines[1].starts_with("===== lliurex-probe started at "));
    }

    #[test]
    fn test_default_filters_parse() {
        assert!(EnvFilter::try_new(default_filter(true)).is_ok());
        assert!(EnvFilter::try_new(default_filter(false)).is_ok());
    }
}
