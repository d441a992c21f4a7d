//! Vendor-agnostic resolution metrics via a pluggable sink.
//!
//! Every top-level [`OrgResolver`](crate::OrgResolver) operation reports a
//! [`ResolutionStats`] to the global sink once it finishes, successfully or
//! not. Without a sink installed the events are dropped.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use orgtree_core::metrics::{MetricsSink, ResolutionStats};
//!
//! struct CountingSink {
//!     resolutions: AtomicU64,
//! }
//!
//! impl MetricsSink for CountingSink {
//!     fn on_resolution(&self, _stats: &ResolutionStats) {
//!         self.resolutions.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! orgtree_core::metrics::set_sink(Arc::new(CountingSink { resolutions: AtomicU64::new(0) }));
//! ```

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use tracing::warn;

/// The resolver operations that report metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
pub enum Operation {
    ResolvePath,
    BuildTree,
    EffectivePolicyIds,
    FetchPolicyContents,
    AllPolicies,
    FindAccountId,
}

/// Snapshot of one finished resolution, passed to [`MetricsSink::on_resolution`].
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionStats {
    pub operation: Operation,
    /// The id (or account name) the operation was invoked with.
    pub target: String,
    /// Wall-clock time including every directory round trip.
    pub duration: Duration,
    /// Size of the result: path length, tree nodes, policy count. Zero on failure.
    pub items: usize,
    pub success: bool,
}

/// Consumer of resolution metrics. Called synchronously, so keep it cheap.
pub trait MetricsSink: Send + Sync {
    fn on_resolution(&self, stats: &ResolutionStats);
}

static SINK: OnceLock<Arc<dyn MetricsSink>> = OnceLock::new();

/// Install the global metrics sink. Only the first call takes effect.
pub fn set_sink(sink: Arc<dyn MetricsSink>) {
    if SINK.set(sink).is_err() {
        warn!("Metrics sink was already initialized. Ignoring subsequent set_sink call.");
    }
}

/// Run `f`, then report its duration and outcome for `operation`.
pub(crate) fn measure<T, E>(
    operation: Operation,
    target: &str,
    size: impl FnOnce(&T) -> usize,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let start = Instant::now();
    let result = f();
    let stats = ResolutionStats {
        operation,
        target: target.to_string(),
        duration: start.elapsed(),
        items: result.as_ref().map(size).unwrap_or(0),
        success: result.is_ok(),
    };
    if let Some(sink) = SINK.get() {
        sink.on_resolution(&stats);
    }
    result
}
