//! Logging system configuration and initialization
//!
//! Console and optional file output through `tracing-subscriber`, with the
//! level taken from `RUST_LOG` when set and from [`LoggingConfig`] otherwise.
//! File output goes through a non-blocking `tracing-appender` writer whose
//! guard is kept alive for the life of the process.

use anyhow::{Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

type FilteredRegistry = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<WorkerGuard>> = Mutex::new(Vec::new());
}

/// Local wall-clock timestamps with millisecond precision
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Directory for log files: the configured one, else `logs/` next to the executable
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    if let Some(dir) = &config.log_directory {
        return dir.clone();
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Build the filter used when `RUST_LOG` is not set.
///
/// Dependency noise (HTTP internals, the HTML tokenizer) is held back unless
/// the configured level asks for trace output.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter =
        EnvFilter::try_new(&config.level).map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        let mut targets: Vec<_> = config.module_filters.iter().collect();
        targets.sort();
        for (target, level) in targets {
            let directive = format!("{target}={level}");
            filter = filter.add_directive(
                directive
                    .parse()
                    .map_err(|e| anyhow!("Invalid log directive '{}': {}", directive, e))?,
            );
        }
    }

    let own = format!("learn_module_reader={}", config.level);
    if let Ok(directive) = own.parse() {
        filter = filter.add_directive(directive);
    }

    Ok(filter)
}

/// Initialize logging with custom configuration.
///
/// Fails instead of panicking when a global subscriber is already installed.
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_env_filter(&config)?,
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        let console = fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(LocalTimeFormatter)
            .with_target(false);
        layers.push(if config.json_format {
            console.json().boxed()
        } else {
            console.boxed()
        });
    }

    let mut log_file = None;
    let mut guard = None;
    if config.file_output {
        let log_dir = get_log_directory(&config);
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        let (file_writer, file_guard) = non_blocking(rolling::never(&log_dir, &config.file_name));
        guard = Some(file_guard);

        let file = fmt::Layer::new()
            .with_writer(file_writer)
            .with_timer(LocalTimeFormatter)
            .with_target(true)
            .with_ansi(false);
        layers.push(if config.json_format {
            file.json().with_file(true).with_line_number(true).boxed()
        } else {
            file.boxed()
        });
        log_file = Some(log_dir.join(&config.file_name));
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    // Dropping the guard on a failed init stops its writer thread.
    if let Some(guard) = guard {
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry is poisoned"))?
            .push(guard);
    }

    match log_file {
        Some(path) => info!("Logging initialized (level: {}, file: {})", config.level, path.display()),
        None => info!("Logging initialized (level: {})", config.level),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_directory_prefers_configured_path() {
        let temp = TempDir::new().unwrap();
        let config = LoggingConfig {
            log_directory: Some(temp.path().to_path_buf()),
            ..LoggingConfig::default()
        };
        assert_eq!(get_log_directory(&config), temp.path());
        assert!(get_log_directory(&LoggingConfig::default()).ends_with("logs"));
    }

    #[test]
    fn test_env_filter_from_config() {
        assert!(build_env_filter(&LoggingConfig::default()).is_ok());

        let invalid = LoggingConfig {
            level: "reqwest=loudest".to_string(),
            ..LoggingConfig::default()
        };
        assert!(build_env_filter(&invalid).is_err());
    }

    #[test]
    fn test_second_initialization_is_an_error() {
        let temp = TempDir::new().unwrap();
        let config = LoggingConfig {
            console_output: false,
            file_output: true,
            log_directory: Some(temp.path().to_path_buf()),
            ..LoggingConfig::default()
        };

        // Another test in this binary may have installed a subscriber already;
        // either way the second call must fail without panicking.
        let _ = init_logging_with_config(config.clone());
        let guards_before = LOG_GUARDS.lock().unwrap().len();
        assert!(init_logging_with_config(config).is_err());
        assert_eq!(LOG_GUARDS.lock().unwrap().len(), guards_before);
    }
}
