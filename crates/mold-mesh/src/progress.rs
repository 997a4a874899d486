//! Progress reporting and cancellation for long-running operations.
//!
//! ```ignore
//! use mold_mesh::progress::{Progress, ProgressCallback};
//!
//! let callback: ProgressCallback = Box::new(|progress| {
//!     println!("{}% {}", progress.percent(), progress.message);
//!     true // return false to cancel
//! });
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Progress information passed to callbacks.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Current step.
    pub current: u64,

    /// Total number of steps.
    pub total: u64,

    /// What is being worked on.
    pub message: String,

    /// Elapsed time since the operation started.
    pub elapsed: Duration,
}

impl Progress {
    pub fn new(current: u64, total: u64, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
            elapsed: Duration::ZERO,
        }
    }

    /// Progress as a fraction in `[0, 1]`.
    #[inline]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64 / self.total as f64).min(1.0)
        }
    }

    #[inline]
    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

/// Callback function for progress reporting.
///
/// Returns `true` to continue, `false` to request cancellation.
pub type ProgressCallback = Box<dyn Fn(&Progress) -> bool + Send + Sync>;

/// A thread-safe progress tracker shared by parallel workers.
///
/// Workers call [`ProgressTracker::increment`] and poll
/// [`ProgressTracker::is_cancelled`]; the callback is throttled to
/// `callback_interval`.
#[derive(Debug)]
pub struct ProgressTracker {
    current: AtomicU64,
    total: u64,
    cancelled: AtomicBool,
    start_time: Instant,
    last_callback_time: Mutex<Option<Instant>>,
    callback_interval: Duration,
}

impl ProgressTracker {
    pub fn new(total: u64) -> Self {
        Self::with_interval(total, Duration::from_millis(100))
    }

    /// Create a tracker with a custom callback interval.
    pub fn with_interval(total: u64, interval: Duration) -> Self {
        Self {
            current: AtomicU64::new(0),
            total,
            cancelled: AtomicBool::new(false),
            start_time: Instant::now(),
            last_callback_time: Mutex::new(None),
            callback_interval: interval,
        }
    }

    #[inline]
    pub fn increment(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_by(&self, amount: u64) {
        self.current.fetch_add(amount, Ordering::Relaxed);
    }

    #[inline]
    pub fn set(&self, value: u64) {
        self.current.store(value, Ordering::Relaxed);
    }

    #[inline]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Check if cancellation was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Request cancellation. Workers stop at their next check.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Create a Progress snapshot.
    pub fn snapshot(&self, message: impl Into<String>) -> Progress {
        Progress {
            current: self.current(),
            total: self.total,
            message: message.into(),
            elapsed: self.elapsed(),
        }
    }

    /// Invoke the callback unconditionally.
    ///
    /// Returns `false` if the operation is (now) cancelled.
    pub fn report(&self, callback: Option<&ProgressCallback>, message: impl Into<String>) -> bool {
        if self.is_cancelled() {
            return false;
        }
        let Some(callback) = callback else {
            return true;
        };

        if let Ok(mut last) = self.last_callback_time.lock() {
            *last = Some(Instant::now());
        }
        if !callback(&self.snapshot(message)) {
            self.cancel();
            return false;
        }
        true
    }

    /// Invoke the callback if at least `callback_interval` has passed since
    /// the previous call.
    ///
    /// Returns `false` if the operation is (now) cancelled.
    pub fn maybe_callback(
        &self,
        callback: Option<&ProgressCallback>,
        message: impl Into<String>,
    ) -> bool {
        if self.is_cancelled() {
            return false;
        }
        if callback.is_none() {
            return true;
        }

        let due = match self.last_callback_time.lock() {
            Ok(last) => last.is_none_or(|t| t.elapsed() >= self.callback_interval),
            Err(_) => true,
        };
        if !due {
            return true;
        }

        self.report(callback, message)
    }
}

/// Arc-wrapped progress tracker for sharing across threads.
pub type SharedProgressTracker = Arc<ProgressTracker>;

/// Create a shared progress tracker.
pub fn shared_tracker(total: u64) -> SharedProgressTracker {
    Arc::new(ProgressTracker::new(total))
}
