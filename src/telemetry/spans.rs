//! Span helpers for driver setup.

use tracing::{info_span, Span};

/// Extension trait for recording an operation's outcome on its span.
pub trait SpanExt {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for driver setup spans.
pub struct SetupSpan;

impl SetupSpan {
    /// Span carrying `class` and `paths`; `status`, `error.message` and
    /// `context_id` are filled in as setup proceeds.
    pub fn new(class: &str, paths: &str) -> Span {
        info_span!(
            "driver_setup",
            class = %class,
            paths = %paths,
            context_id = tracing::field::Empty,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    }
}
