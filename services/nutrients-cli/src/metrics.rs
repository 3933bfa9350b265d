//! Prometheus recorder for the session metrics
//!
//! The session crate records through the `metrics` facade; this installs the
//! recorder so those calls land somewhere. The rendered snapshot is logged at
//! debug level when the command finishes.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Waiter counts released per refresh cycle.
const WAITER_BUCKETS: &[f64] = &[0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0];

fn builder() -> Result<PrometheusBuilder> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("session_refresh_waiters".to_string()),
            WAITER_BUCKETS,
        )
        .context("failed to set histogram buckets")
}

/// Install the global recorder and return a handle for rendering.
pub fn install_recorder() -> Result<PrometheusHandle> {
    builder()?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}
