//! Telemetry for the driver host: subscriber setup and setup spans.
//!
//! The loader itself emits nothing; events come from the host and registry.

mod logging;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use spans::{SetupSpan, SpanExt};
