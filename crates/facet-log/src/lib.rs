//! Tracing setup shared by the viewer and the print exporter.
//!
//! Console output is always on. When a log directory is given, a second
//! layer writes newline-delimited JSON to `facet.log` so a long print run
//! can be inspected afterwards.

use std::path::{Path, PathBuf};

use facet_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Targets that are far too chatty at `info` for a map viewer.
const QUIET_TARGETS: &[&str] = &["wgpu=warn", "wgpu_core=warn", "wgpu_hal=warn", "naga=warn"];

const LOG_FILE: &str = "facet.log";

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("cannot create log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("a global subscriber is already installed")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Build the filter directive for a configured level.
///
/// GPU backend targets are pinned to `warn` unless the directive names them.
pub fn filter_directive(level: &str) -> String {
    let level = level.trim();
    let mut parts: Vec<String> = vec![if level.is_empty() { "info".to_string() } else { level.to_string() }];
    for quiet in QUIET_TARGETS {
        let target = quiet.split('=').next().unwrap_or_default();
        let named = level
            .split(',')
            .any(|d| d.split('=').next().map(str::trim) == Some(target));
        if !named {
            parts.push((*quiet).to_string());
        }
    }
    parts.join(",")
}

/// `RUST_LOG` wins over the config when set.
pub fn env_filter_for(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(&config.debug.log_level)))
}

/// Install the global subscriber.
pub fn init_logging(config: &Config, log_dir: Option<&Path>) -> Result<(), LogError> {
    let console = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_timer(fmt::time::uptime());

    let registry = tracing_subscriber::registry()
        .with(env_filter_for(config))
        .with(console);

    let Some(dir) = log_dir else {
        registry.try_init()?;
        return Ok(());
    };

    let path = dir.join(LOG_FILE);
    let file = std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::File::create(&path))
        .map_err(|source| LogError::File { path: path.clone(), source })?;

    let json = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_timer(fmt::time::uptime())
        .json();
    registry.with(json).try_init()?;

    tracing::debug!(path = %path.display(), "json log enabled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_quiets_gpu_targets() {
        let directive = filter_directive("info");
        assert!(directive.starts_with("info"), "got {directive}");
        assert!(directive.contains("wgpu=warn"));
        assert!(directive.contains("naga=warn"));
    }

    #[test]
    fn test_empty_level_falls_back_to_info() {
        assert!(filter_directive("  ").starts_with("info,"));
    }

    #[test]
    fn test_explicit_target_is_not_overridden() {
        let directive = filter_directive("debug,wgpu=trace");
        assert!(directive.contains("wgpu=trace"));
        assert!(!directive.contains("wgpu=warn"), "got {directive}");
        assert!(directive.contains("naga=warn"));
    }

    #[test]
    fn test_directives_parse() {
        for level in ["info", "debug,facet_loader=trace", "warn,facet_shapes=debug", "error"] {
            let directive = filter_directive(level);
            assert!(
                EnvFilter::try_new(&directive).is_ok(),
                "failed to parse {directive}"
            );
        }
    }

    #[test]
    fn test_unwritable_log_dir_reports_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let err = init_logging(&Config::default(), Some(&blocker)).unwrap_err();
        assert!(matches!(err, LogError::File { .. }), "got {err:?}");
    }
}
