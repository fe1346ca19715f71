//! Structured logging with tracing
//!
//! Sets up:
//! - Console logging on stderr (text or JSON), so stdout stays clean for reports
//! - Optional JSON file logging with daily rotation

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling::daily};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use super::config::{LogFormat, MonitoringConfig};

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Initialize the global tracing subscriber.
///
/// Returns the file writer guard when file logging is on; dropping it stops
/// file logging. Calling this twice is harmless, the second call is ignored.
pub fn init_tracing(config: &MonitoringConfig) -> std::io::Result<Option<WorkerGuard>> {
    if !config.enabled {
        return Ok(None);
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if config.enable_console_logging {
        let console = fmt::layer().with_writer(std::io::stderr).with_target(false);
        layers.push(match config.log_format {
            LogFormat::Json => console.json().boxed(),
            LogFormat::Text => console.boxed(),
        });
    }

    if config.enable_file_logging {
        config.ensure_log_dir()?;
        let (writer, file_guard) = non_blocking(daily(&config.log_dir, "trendlens.log"));
        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false) // No ANSI codes in files
                .json()
                .boxed(),
        );
        guard = Some(file_guard);
    }

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init();

    Ok(guard)
}
