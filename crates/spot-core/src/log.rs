use crate::error::{Error, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

const DEFAULT_LOG_LEVEL: &str = "info";

/// Installs a panic hook that routes panics through `tracing` before the
/// default hook prints them.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "<non-string panic payload>".to_owned());

        tracing::error!(%location, %payload, "Panic");
        default_hook(info);
    }));
}

/// Sends all tracing output to `log_file_path` through a non-blocking writer.
///
/// `RUST_LOG` wins over `log_level` when set. Keep the returned guard alive
/// for as long as logs should be flushed.
pub fn init_tracing(log_file_path: &Path, log_level: Option<&str>) -> Result<WorkerGuard> {
    if let Some(parent) = log_file_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or(DEFAULT_LOG_LEVEL)))
        .map_err(|e| Error::TracingInit(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE)
        .try_init()
        .map_err(|e| Error::TracingInit(e.to_string()))?;

    install_panic_hook();
    tracing::info!(path = ?log_file_path, "Tracing initialized");
    Ok(guard)
}
