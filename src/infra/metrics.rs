//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations so recording never contends with the
//! engine lock. Two read paths exist:
//! - `report()` swaps the windowed counters to zero (periodic log line)
//! - `snapshot()` only loads (Prometheus scrape, cumulative)
//!
//! NOTE: All atomics use Relaxed ordering. These are statistical counters only
//! and must not be used for coordination.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Exponential bucket boundaries for engine processing latency (microseconds)
/// Buckets: ≤5, ≤10, ≤20, ≤40, ≤80, ≤160, ≤320, ≤640, ≤1280, ≤2560, >2560
const BUCKET_BOUNDS: [u64; 10] = [5, 10, 20, 40, 80, 160, 320, 640, 1280, 2560];
const NUM_BUCKETS: usize = 11;

pub const METRICS_NUM_BUCKETS: usize = NUM_BUCKETS;
pub const METRICS_BUCKET_BOUNDS: [u64; 10] = BUCKET_BOUNDS;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    std::array::from_fn(|i| buckets[i].swap(0, Ordering::Relaxed))
}

#[inline]
fn load_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    std::array::from_fn(|i| buckets[i].load(Ordering::Relaxed))
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = ((total as f64 * percentile).ceil() as u64).max(1);
    let mut cumulative = 0u64;

    // Last bucket is open-ended; report 2x the previous bound
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] =
        [5, 10, 20, 40, 80, 160, 320, 640, 1280, 2560, 5120];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
pub struct Metrics {
    /// Location events processed (monotonic)
    events_total: AtomicU64,
    /// Events since last report (reset on report)
    events_since_report: AtomicU64,
    /// Zone enter transitions (monotonic)
    enter_total: AtomicU64,
    /// Zone exit transitions (monotonic)
    exit_total: AtomicU64,
    /// Location payloads rejected at the boundary (monotonic)
    rejected_total: AtomicU64,
    /// Status lookups for unknown vehicles (monotonic)
    status_not_found_total: AtomicU64,
    /// Processing latency histogram (cumulative, for Prometheus)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Processing latency sum (cumulative, for Prometheus)
    latency_sum_total_us: AtomicU64,
    /// Processing latency histogram (reset on report)
    window_latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Sum of latencies in microseconds (reset on report)
    window_latency_sum_us: AtomicU64,
    /// Max latency in microseconds (reset on report)
    window_latency_max_us: AtomicU64,
    /// Last report time (only accessed from reporter)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            events_total: AtomicU64::new(0),
            events_since_report: AtomicU64::new(0),
            enter_total: AtomicU64::new(0),
            exit_total: AtomicU64::new(0),
            rejected_total: AtomicU64::new(0),
            status_not_found_total: AtomicU64::new(0),
            latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            latency_sum_total_us: AtomicU64::new(0),
            window_latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            window_latency_sum_us: AtomicU64::new(0),
            window_latency_max_us: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record a location event was processed with given latency
    #[inline]
    pub fn record_event_processed(&self, latency_us: u64) {
        self.events_total.fetch_add(1, Ordering::Relaxed);
        self.events_since_report.fetch_add(1, Ordering::Relaxed);

        let bucket = bucket_index(latency_us);
        self.latency_buckets[bucket].fetch_add(1, Ordering::Relaxed);
        self.latency_sum_total_us.fetch_add(latency_us, Ordering::Relaxed);

        self.window_latency_buckets[bucket].fetch_add(1, Ordering::Relaxed);
        self.window_latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.window_latency_max_us, latency_us);
    }

    #[inline]
    pub fn record_enter(&self) {
        self.enter_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_exit(&self) {
        self.exit_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_status_not_found(&self) {
        self.status_not_found_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn events_total(&self) -> u64 {
        self.events_total.load(Ordering::Relaxed)
    }

    /// Cumulative view for scraping; does not reset anything
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_total: self.events_total.load(Ordering::Relaxed),
            enter_total: self.enter_total.load(Ordering::Relaxed),
            exit_total: self.exit_total.load(Ordering::Relaxed),
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            status_not_found_total: self.status_not_found_total.load(Ordering::Relaxed),
            lat_buckets: load_buckets(&self.latency_buckets),
            lat_sum_us: self.latency_sum_total_us.load(Ordering::Relaxed),
        }
    }

    /// Windowed summary since the previous report
    ///
    /// Swaps windowed counters to zero; monotonic totals are only read.
    pub fn report(&self, tracked_vehicles: usize) -> MetricsSummary {
        let events_count = self.events_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.window_latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency = self.window_latency_max_us.swap(0, Ordering::Relaxed);
        let lat_buckets = swap_buckets(&self.window_latency_buckets);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let events_per_sec = if elapsed.as_secs_f64() > 0.0 {
            events_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let avg_latency = if events_count > 0 { latency_sum / events_count } else { 0 };

        MetricsSummary {
            events_total: self.events_total.load(Ordering::Relaxed),
            events_per_sec,
            avg_process_latency_us: avg_latency,
            max_process_latency_us: max_latency,
            lat_p50_us: percentile_from_buckets(&lat_buckets, 0.50),
            lat_p95_us: percentile_from_buckets(&lat_buckets, 0.95),
            lat_p99_us: percentile_from_buckets(&lat_buckets, 0.99),
            enter_total: self.enter_total.load(Ordering::Relaxed),
            exit_total: self.exit_total.load(Ordering::Relaxed),
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            tracked_vehicles,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Cumulative counters for Prometheus exposition
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub events_total: u64,
    pub enter_total: u64,
    pub exit_total: u64,
    pub rejected_total: u64,
    pub status_not_found_total: u64,
    pub lat_buckets: [u64; NUM_BUCKETS],
    pub lat_sum_us: u64,
}

#[derive(Debug)]
pub struct MetricsSummary {
    pub events_total: u64,
    pub events_per_sec: f64,
    pub avg_process_latency_us: u64,
    pub max_process_latency_us: u64,
    pub lat_p50_us: u64,
    pub lat_p95_us: u64,
    pub lat_p99_us: u64,
    pub enter_total: u64,
    pub exit_total: u64,
    pub rejected_total: u64,
    pub tracked_vehicles: usize,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            events_total = %self.events_total,
            events_per_sec = format!("{:.1}", self.events_per_sec),
            avg_latency_us = %self.avg_process_latency_us,
            max_latency_us = %self.max_process_latency_us,
            p50_us = %self.lat_p50_us,
            p95_us = %self.lat_p95_us,
            p99_us = %self.lat_p99_us,
            enters = %self.enter_total,
            exits = %self.exit_total,
            rejected = %self.rejected_total,
            tracked_vehicles = %self.tracked_vehicles,
            "metrics"
        );
    }
}
