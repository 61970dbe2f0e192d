//! # Observability
//!
//! - **Logging**: structured `tracing` output, configured by [`LogConfig`]
//! - **Data quality**: per-request fallback counters ([`DataQuality`])
//! - **Engine counters**: cumulative request outcomes ([`EngineMetrics`])

pub mod logging;
pub mod quality;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use quality::{Counter, DataQuality, DataQualityReport, EngineMetrics, EngineMetricsSnapshot};
