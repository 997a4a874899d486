//! Tracing helpers shared by the mold crates.
//!
//! Enable output by installing a subscriber in the application:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter(EnvFilter::from_default_env())
//!     .init();
//! // RUST_LOG=mold_shell=debug for per-stage detail
//! ```
//!
//! # Log Levels
//!
//! - **WARN**: Recoverable issues (open input, clamped geometry, empty grids)
//! - **INFO**: Stage summaries and timing
//! - **DEBUG**: Grid sizes, gap counts, intermediate mesh sizes
//! - **TRACE**: Per-column fallbacks

use std::time::Instant;
use tracing::{Span, debug, info};

/// A performance timer that logs its duration on drop.
///
/// ```rust,ignore
/// let _timer = OperationTimer::new("sample_profile");
/// // ... work ...
/// // logs elapsed_ms when dropped
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    /// Create a new operation timer.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("mold_operation", operation = name);
        debug!(target: "mold::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Create a timer that also records the size of the mesh being processed.
    pub fn with_context(name: &'static str, face_count: usize, vertex_count: usize) -> Self {
        let span = tracing::info_span!(
            "mold_operation",
            operation = name,
            faces = face_count,
            vertices = vertex_count
        );
        debug!(
            target: "mold::timing",
            operation = name,
            faces = face_count,
            vertices = vertex_count,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Get the span for this timer.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        info!(
            target: "mold::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", self.elapsed_ms()),
            "Operation completed"
        );
    }
}

/// Log mesh statistics at debug level.
pub fn log_mesh_stats(mesh: &crate::Mesh, context: &str) {
    let dims = mesh.bounds().map(|b| b.size()).unwrap_or_default();
    debug!(
        target: "mold::mesh_state",
        context = context,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        dimensions = format!("{:.2} x {:.2} x {:.2}", dims.x, dims.y, dims.z),
        "Mesh state"
    );
}
