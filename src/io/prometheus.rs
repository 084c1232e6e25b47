//! Prometheus text exposition for engine metrics
//!
//! Rendered on demand by the HTTP server at /metrics.

use crate::infra::metrics::{Metrics, METRICS_BUCKET_BOUNDS, METRICS_NUM_BUCKETS};
use std::fmt::Write;

/// Prometheus metric type
enum MetricType {
    Counter,
    Gauge,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
        }
    }
}

/// Write a simple metric (counter or gauge)
fn write_metric(output: &mut String, name: &str, help: &str, typ: MetricType, val: u64) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} {}", typ.as_str());
    let _ = writeln!(output, "{name} {val}");
}

/// Write a histogram metric with cumulative buckets, sum, and count
fn write_histogram(
    output: &mut String,
    name: &str,
    help: &str,
    buckets: &[u64; METRICS_NUM_BUCKETS],
    bounds: &[u64; 10],
    sum: u64,
) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} histogram");

    let mut cumulative = 0u64;
    for (i, &bound) in bounds.iter().enumerate() {
        cumulative += buckets[i];
        let _ = writeln!(output, "{name}_bucket{{le=\"{bound}\"}} {cumulative}");
    }
    cumulative += buckets[METRICS_NUM_BUCKETS - 1];
    let _ = writeln!(output, "{name}_bucket{{le=\"+Inf\"}} {cumulative}");
    let _ = writeln!(output, "{name}_sum {sum}");
    let _ = writeln!(output, "{name}_count {cumulative}");
}

/// Format metrics in Prometheus text exposition format
pub fn format_prometheus_metrics(metrics: &Metrics, tracked_vehicles: usize, zones: usize) -> String {
    let snapshot = metrics.snapshot();
    let mut output = String::with_capacity(2048);

    write_metric(
        &mut output,
        "geofence_location_events_total",
        "Location events processed",
        MetricType::Counter,
        snapshot.events_total,
    );
    write_metric(
        &mut output,
        "geofence_zone_enter_total",
        "Zone enter transitions emitted",
        MetricType::Counter,
        snapshot.enter_total,
    );
    write_metric(
        &mut output,
        "geofence_zone_exit_total",
        "Zone exit transitions emitted",
        MetricType::Counter,
        snapshot.exit_total,
    );
    write_metric(
        &mut output,
        "geofence_location_rejected_total",
        "Location payloads rejected by validation",
        MetricType::Counter,
        snapshot.rejected_total,
    );
    write_metric(
        &mut output,
        "geofence_status_not_found_total",
        "Status queries for unknown vehicles",
        MetricType::Counter,
        snapshot.status_not_found_total,
    );
    write_histogram(
        &mut output,
        "geofence_process_latency_us",
        "Engine processing latency in microseconds",
        &snapshot.lat_buckets,
        &METRICS_BUCKET_BOUNDS,
        snapshot.lat_sum_us,
    );
    write_metric(
        &mut output,
        "geofence_tracked_vehicles",
        "Vehicles seen since startup",
        MetricType::Gauge,
        tracked_vehicles as u64,
    );
    write_metric(&mut output, "geofence_zones", "Configured zones", MetricType::Gauge, zones as u64);

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_prometheus_metrics() {
        let metrics = Metrics::new();
        metrics.record_event_processed(3);
        metrics.record_event_processed(50);
        metrics.record_enter();
        metrics.record_rejected();

        let output = format_prometheus_metrics(&metrics, 5, 3);

        assert!(output.contains("# TYPE geofence_location_events_total counter"));
        assert!(output.contains("geofence_location_events_total 2"));
        assert!(output.contains("geofence_zone_enter_total 1"));
        assert!(output.contains("geofence_zone_exit_total 0"));
        assert!(output.contains("geofence_location_rejected_total 1"));
        assert!(output.contains("geofence_process_latency_us_bucket{le=\"5\"} 1"));
        assert!(output.contains("geofence_process_latency_us_bucket{le=\"80\"} 2"));
        assert!(output.contains("geofence_process_latency_us_bucket{le=\"+Inf\"} 2"));
        assert!(output.contains("geofence_process_latency_us_sum 53"));
        assert!(output.contains("geofence_tracked_vehicles 5"));
        assert!(output.contains("geofence_zones 3"));
    }

    #[test]
    fn test_scrape_does_not_reset() {
        let metrics = Metrics::new();
        metrics.record_event_processed(3);

        let _ = format_prometheus_metrics(&metrics, 0, 0);
        let output = format_prometheus_metrics(&metrics, 0, 0);
        assert!(output.contains("geofence_location_events_total 1"));
        assert!(output.contains("geofence_process_latency_us_count 1"));
    }
}
