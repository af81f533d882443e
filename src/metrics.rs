// Resolver metrics
//
// Lightweight counters for how often the analyzer is resolved, how often the
// command is rendered and how saves go.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Resolver metrics
///
/// Atomic counters, so a shared reference is enough to record. A summary is
/// logged when the resolver is dropped by the binary.
#[derive(Debug)]
pub struct Metrics {
    /// Locator runs
    pub resolutions: AtomicU64,

    /// Locator runs that produced an analyzer handle
    pub resolutions_succeeded: AtomicU64,

    /// Locator runs that ended in a locate error
    pub resolutions_failed: AtomicU64,

    /// Commands rendered
    pub renders: AtomicU64,

    /// Successful saves
    pub saves: AtomicU64,

    /// Saves rejected by the persistence collaborator
    pub save_failures: AtomicU64,

    /// Total time spent locating, in milliseconds
    pub total_resolution_time_ms: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            resolutions: AtomicU64::new(0),
            resolutions_succeeded: AtomicU64::new(0),
            resolutions_failed: AtomicU64::new(0),
            renders: AtomicU64::new(0),
            saves: AtomicU64::new(0),
            save_failures: AtomicU64::new(0),
            total_resolution_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one locator run and how long it took
    pub fn record_resolution(&self, succeeded: bool, duration: Duration) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        if succeeded {
            self.resolutions_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.resolutions_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.total_resolution_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_render(&self) {
        self.renders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save(&self, succeeded: bool) {
        if succeeded {
            self.saves.fetch_add(1, Ordering::Relaxed);
        } else {
            self.save_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average locator run time in milliseconds
    pub fn avg_resolution_time_ms(&self) -> f64 {
        let total = self.total_resolution_time_ms.load(Ordering::Relaxed);
        let count = self.resolutions.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Resolver Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Resolutions: {} ({} succeeded, {} failed, avg {:.2}ms)",
            self.resolutions.load(Ordering::Relaxed),
            self.resolutions_succeeded.load(Ordering::Relaxed),
            self.resolutions_failed.load(Ordering::Relaxed),
            self.avg_resolution_time_ms()
        );
        tracing::info!(
            "Renders: {}, saves: {}, save failures: {}",
            self.renders.load(Ordering::Relaxed),
            self.saves.load(Ordering::Relaxed),
            self.save_failures.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.resolutions.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.renders.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_resolutions() {
        let metrics = Metrics::new();

        metrics.record_resolution(true, Duration::from_millis(100));
        metrics.record_resolution(false, Duration::from_millis(200));
        metrics.record_resolution(true, Duration::from_millis(0));

        assert_eq!(metrics.resolutions.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.resolutions_succeeded.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.resolutions_failed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.avg_resolution_time_ms(), 100.0);
    }

    #[test]
    fn test_avg_resolution_time_no_runs() {
        assert_eq!(Metrics::new().avg_resolution_time_ms(), 0.0);
    }

    #[test]
    fn test_render_and_save_counters() {
        let metrics = Metrics::new();

        metrics.record_render();
        metrics.record_save(true);
        metrics.record_save(false);

        assert_eq!(metrics.renders.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.saves.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.save_failures.load(Ordering::Relaxed), 1);
    }
}
