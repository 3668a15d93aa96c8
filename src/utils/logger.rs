use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing stack: stdout plus a daily-rolling file in `dir`.
///
/// The returned guard must be held for the lifetime of the process, or the
/// file writer is flushed and dropped early.
pub fn init(dir: String) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(dir, "webhook.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()?;

    Ok(guard)
}
