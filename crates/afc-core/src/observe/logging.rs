//! # Logging
//!
//! One `tracing` subscriber for the whole process, writing to stderr so
//! that JSON responses on stdout stay clean.
//!
//! Filter precedence: [`LogConfig::filter`], then `RUST_LOG`, then
//! [`LogConfig::level`]. A filter string that fails to parse falls back to
//! the level.
//!
//! ```rust,ignore
//! use afc_core::observe::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production());
//! tracing::info!(request_id = "req-1", channels = 14, "request evaluated");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event, for log shippers
    Json,
    /// Multi-line with colours
    Pretty,
    #[default]
    Compact,
}

/// `logging:` section of the engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Annotate events with file and line
    pub source_location: bool,
    /// Annotate events with the emitting thread (useful with the rayon pool)
    pub thread_ids: bool,
    /// Directive string such as `afc_engine=debug,afc_core=warn`
    pub filter: Option<String>,
}

impl LogConfig {
    /// Pretty debug output with thread and source annotations
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            source_location: true,
            thread_ids: true,
            filter: None,
        }
    }

    /// JSON at info
    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            ..Self::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.as_str());
        match &self.filter {
            Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(self.source_location)
            .with_line_number(self.source_location)
            .with_thread_ids(self.thread_ids);
        match self.format {
            LogFormat::Json => base.json().boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
            LogFormat::Compact => base.compact().boxed(),
        }
    }
}

/// Install the global subscriber. Returns `false` if one was already
/// installed, in which case the existing subscriber is kept.
pub fn init_logging(config: &LogConfig) -> bool {
    let subscriber = tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(config.env_filter());
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
