use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::rate_limit::RateLimits;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the configured limits as gauges.
    pub fn init(limits: RateLimits) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!("advisor_admitted_total", "Generation calls admitted by the limiter.");
        describe_counter!("advisor_denied_total", "Generation calls denied locally, by window.");
        describe_counter!(
            "advisor_generation_failures_total",
            "Failed generation calls, by failure kind."
        );

        gauge!("advisor_limit_per_minute").set(limits.per_minute as f64);
        gauge!("advisor_limit_per_day").set(limits.per_day as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
