//! Logging setup for trendlens
//!
//! Provides:
//! - Structured logging with tracing
//! - Optional rotated JSON log files under ~/.trendlens/logs

pub mod config;
pub mod tracing_config;

pub use config::{LogFormat, MonitoringConfig};
pub use tracing_config::init_tracing;
