//! File logging for the binary. The terminal belongs to the TUI, so all
//! tracing output goes to `<log_dir>/delve.log`.

use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "delve.log";

/// Installs the global subscriber. `RUST_LOG` wins over the `info` default.
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init_logging(log_dir: &Path) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("nested").join("logs");
        // Another test may already own the global subscriber; the directory
        // is created either way.
        let _ = init_logging(&logs);
        assert!(logs.is_dir());
    }
}
