use std::env;
use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const DEFAULT_METRICS_PORT: u16 = 9464;

/// Where a matching run was triggered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSource {
    EventPosted,
    Refresh,
    Batch,
}

impl RunSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunSource::EventPosted => "event_posted",
            RunSource::Refresh => "refresh",
            RunSource::Batch => "batch",
        }
    }
}

fn resolve_port(raw: Option<&str>, default_port: u16) -> u16 {
    raw.and_then(|raw| raw.trim().parse::<u16>().ok())
        .filter(|port| *port > 0)
        .unwrap_or(default_port)
}

/// Initialize a Prometheus exporter listening on `0.0.0.0:<port>`.
///
/// The port comes from `port_env` or `default_port`. Later calls return the
/// handle installed by the first one.
pub fn init_metrics(port_env: &str, default_port: u16) -> Option<&'static PrometheusHandle> {
    if let Some(existing) = PROMETHEUS_HANDLE.get() {
        return Some(existing);
    }

    let port = resolve_port(env::var(port_env).ok().as_deref(), default_port);

    match PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install_recorder()
    {
        Ok(handle) => {
            let _ = PROMETHEUS_HANDLE.set(handle);
            info!(metrics_port = port, "started prometheus exporter");
            PROMETHEUS_HANDLE.get()
        }
        Err(err) => {
            warn!(error = %err, metrics_port = port, "failed to start prometheus exporter");
            PROMETHEUS_HANDLE.get()
        }
    }
}

/// One finished matching run. No-ops when no recorder is installed.
pub fn record_recommendation_run(source: RunSource, scored: usize, kept: usize, elapsed: Duration) {
    counter!("vm_recommendation_runs_total", "source" => source.as_str()).increment(1);
    counter!("vm_recommendations_stored_total", "source" => source.as_str())
        .increment(kept as u64);
    histogram!("vm_recommendation_candidates").record(scored as f64);
    histogram!("vm_recommendation_run_seconds", "source" => source.as_str())
        .record(elapsed.as_secs_f64());
}

pub fn record_recommendation_failure(source: RunSource) {
    counter!("vm_recommendation_failures_total", "source" => source.as_str()).increment(1);
}

pub fn record_attendance_scan(action: &'static str) {
    counter!("vm_attendance_scans_total", "action" => action).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_falls_back_on_bad_input() {
        assert_eq!(resolve_port(Some("9100"), DEFAULT_METRICS_PORT), 9100);
        assert_eq!(resolve_port(Some("zero"), DEFAULT_METRICS_PORT), DEFAULT_METRICS_PORT);
        assert_eq!(resolve_port(Some("0"), DEFAULT_METRICS_PORT), DEFAULT_METRICS_PORT);
        assert_eq!(resolve_port(None, 9200), 9200);
    }

    #[test]
    fn recording_without_recorder_is_harmless() {
        record_recommendation_run(RunSource::Batch, 10, 5, Duration::from_millis(3));
        record_recommendation_failure(RunSource::Refresh);
        record_attendance_scan("check_in");
        assert_eq!(RunSource::EventPosted.as_str(), "event_posted");
    }
}
