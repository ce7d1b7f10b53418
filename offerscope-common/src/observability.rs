//! Process-wide `tracing` setup shared by the binary and integration tests.
//!
//! Events go to a daily rolling file and, optionally, to stderr in the same
//! encoding. [`init_logging`] installs the subscriber once; later calls only
//! return the path resolved by the first one.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Utc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

pub const LOG_DIR_ENV: &str = "OFFERSCOPE_LOG_DIR";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static ACTIVE_LOG: OnceLock<PathBuf> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Used as the log file stem and the default data directory name.
    pub app_name: &'static str,
    /// Explicit log directory. Falls back to `OFFERSCOPE_LOG_DIR`, then to
    /// `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "offerscope",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

/// Install the global subscriber and return today's log file.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = ACTIVE_LOG.get() {
        return Ok(path.clone());
    }

    let dir = resolve_log_dir(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;

    // rolling::daily suffixes the stem with the UTC date
    let stem = format!("{}.log", config.app_name);
    let path = dir.join(format!("{stem}.{}", Utc::now().format("%Y-%m-%d")));

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, &stem));
    let _ = FILE_GUARD.set(guard);

    let mut layers = vec![output_layer(config.format, file_writer, false)];
    if config.emit_stderr {
        layers.push(output_layer(config.format, std::io::stderr, true));
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    let _ = ACTIVE_LOG.set(path.clone());
    Ok(path)
}

fn output_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(ansi).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

fn resolve_log_dir(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(dir) => expand_home(dir),
        None => std::env::var_os(LOG_DIR_ENV)
            .map(|dir| expand_home(Path::new(&dir)))
            .unwrap_or_else(|| default_data_dir(app_name)),
    }
}

/// Expand a leading `~/` against `$HOME`.
///
/// ```
/// use offerscope_common::observability::expand_home;
/// use std::path::Path;
///
/// assert_eq!(expand_home(Path::new("/var/log")), Path::new("/var/log"));
/// ```
pub fn expand_home(path: &Path) -> PathBuf {
    let home = std::env::var_os("HOME");
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

/// `~/.local/share/<app_name>`, or `./<app_name>` without a home directory.
pub fn default_data_dir(app_name: &str) -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => Path::new(&home).join(".local/share").join(app_name),
        None => Path::new(".").join(app_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let dir = resolve_log_dir("offerscope", Some(Path::new("/tmp/offerscope-logs")));
        assert_eq!(dir, PathBuf::from("/tmp/offerscope-logs"));
    }

    #[test]
    fn relative_paths_are_untouched() {
        assert_eq!(
            expand_home(Path::new("relative/logs")),
            PathBuf::from("relative/logs")
        );
        assert_eq!(expand_home(Path::new("~user/x")), PathBuf::from("~user/x"));
    }

    #[test]
    fn data_dir_ends_with_app_name() {
        assert!(default_data_dir("offerscope").ends_with("offerscope"));
    }
}
