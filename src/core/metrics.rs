use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

pub(crate) const HTTP_REQUESTS: &str = "http_requests_total";
pub(crate) const HTTP_REQUEST_DURATION: &str = "http_request_duration_seconds";
pub(crate) const SESSIONS_STARTED: &str = "exam_sessions_started_total";
pub(crate) const SESSIONS_RESUMED: &str = "exam_sessions_resumed_total";
pub(crate) const SUBMISSIONS: &str = "exam_submissions_total";

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);

    metrics::describe_counter!(HTTP_REQUESTS, "HTTP responses by status code");
    metrics::describe_histogram!(HTTP_REQUEST_DURATION, "HTTP request latency in seconds");
    metrics::describe_counter!(SESSIONS_STARTED, "Exam sessions created");
    metrics::describe_counter!(SESSIONS_RESUMED, "Start requests answered with an open session");
    metrics::describe_counter!(SUBMISSIONS, "Completed exam sessions by completion mode");
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
