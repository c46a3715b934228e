//! Metrics collection and export for mediacopy.
//!
//! Crates record through the `metrics` facade using the names in this
//! crate. Without an installed recorder the macros are no-ops. With the
//! `prometheus` feature, [`init_metrics`] installs a Prometheus recorder
//! whose text output is available from [`MetricsHandle::render`].
//!
//! ```rust,ignore
//! use mediacopy_metrics::{counter, relay};
//!
//! counter!(relay::RELAYED_TOTAL).increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
