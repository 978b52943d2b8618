use crate::error::{Result, ScraperError};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes logging: human-readable console output on stderr, plus JSON
/// files with daily rotation when `log_dir` is set.
///
/// stdout is left to the report itself. An unusable `log_dir` is a
/// `ScraperError::Config`.
pub fn init_logging(verbose: bool, log_dir: Option<&str>) -> Result<()> {
    // Respect RUST_LOG if set; otherwise default by verbosity
    let default_directive = if verbose {
        "brewscan=debug,warn"
    } else {
        "brewscan=info,warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let console_layer = fmt::layer()
        .with_target(verbose)
        .without_time()
        .with_writer(std::io::stderr);

    let file_layer = match log_dir {
        Some(dir) => {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("brewscan.log")
                .build(dir)
                .map_err(|e| {
                    ScraperError::Config(format!("can't write logs to '{}': {}", dir, e))
                })?;
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            // Keep the guard alive for the whole process so logs are flushed on exit
            std::mem::forget(guard);
            Some(fmt::layer().json().with_writer(non_blocking_writer))
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_log_dir_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("plain-file");
        std::fs::write(&not_a_dir, "x").unwrap();
        let log_dir = not_a_dir.join("logs");

        let err = init_logging(false, log_dir.to_str()).unwrap_err();
        assert!(matches!(err, ScraperError::Config(msg) if msg.contains("can't write logs")));
    }
}
