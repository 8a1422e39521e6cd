//! Prometheus metrics for observability.
//!
//! The Store records its own counters and histograms through the `metrics`
//! facade; this module installs a Prometheus recorder so they can be rendered.
//!
//! # Example
//!
//! ```rust,no_run
//! use freekick_runtime::metrics::install_recorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let recorder = install_recorder()?;
//!
//! // ... dispatch actions ...
//!
//! if let Some(text) = recorder.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

// Re-export metrics macros for use in other crates
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installed Prometheus recorder.
///
/// `handle` is `None` when another recorder was already installed in this
/// process; metrics are still recorded by that recorder.
#[derive(Clone)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("installed", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

impl MetricsRecorder {
    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus exposition format.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register metric descriptions and install the Prometheus recorder.
///
/// # Errors
///
/// Returns [`MetricsError::Build`] if the histogram buckets are rejected and
/// [`MetricsError::Install`] if installation fails for a reason other than
/// a recorder already being present.
pub fn install_recorder() -> Result<MetricsRecorder, MetricsError> {
    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        )
        .map_err(|e| MetricsError::Build(e.to_string()))?;

    match builder.install_recorder() {
        Ok(handle) => {
            register_metrics();
            tracing::info!("Prometheus recorder installed");
            Ok(MetricsRecorder {
                handle: Some(handle),
            })
        },
        Err(e) => {
            let err_msg = e.to_string();
            if err_msg.contains("already") {
                tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                Ok(MetricsRecorder { handle: None })
            } else {
                Err(MetricsError::Install(err_msg))
            }
        },
    }
}

/// Register all metric descriptions.
pub fn register_metrics() {
    // Store
    describe_counter!("store.commands.total", "Total number of actions sent to stores");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken to execute reducers"
    );
    describe_histogram!("store.effects.count", "Number of effects returned per action");
    describe_counter!("store.effects.executed", "Total number of effects executed, by type");
    describe_counter!("store.shutdown.initiated", "Graceful shutdowns started");
    describe_counter!("store.shutdown.completed", "Graceful shutdowns that drained all effects");
    describe_counter!("store.shutdown.timeout", "Graceful shutdowns that timed out");
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );

    // API transport
    describe_counter!("api.requests.total", "Total number of API requests, by method and status");
    describe_histogram!(
        "api.request.duration_seconds",
        "Time taken by API requests"
    );
}
