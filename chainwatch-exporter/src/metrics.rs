//! Prometheus endpoint
//!
//! Every scrape of `/metrics` runs one full poll. Samples are written into a
//! fresh Prometheus recorder installed for the duration of the render only,
//! so nothing from an earlier scrape can leak into the next one.

use crate::app::App;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chainwatch_core::{MetricInfo, MetricName};
use metrics::{describe_gauge, gauge, Label};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Describe every metric family on the current recorder
fn describe_metrics() {
    for name in MetricName::ALL {
        describe_gauge!(name.as_str(), name.help());
    }
}

/// Render samples in the Prometheus text format.
pub fn render(samples: &[MetricInfo]) -> String {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    metrics::with_local_recorder(&recorder, || {
        describe_metrics();
        for sample in samples {
            let labels: Vec<Label> = sample
                .labels
                .iter()
                .map(|(key, value)| Label::new(key.clone(), value.clone()))
                .collect();
            gauge!(sample.name.as_str(), labels).set(sample.value);
        }
    });

    handle.render()
}

/// HTTP server for the metrics endpoint
pub struct MetricsServer {
    addr: SocketAddr,
    app: Arc<App>,
}

impl MetricsServer {
    pub fn new(addr: SocketAddr, app: Arc<App>) -> Self {
        Self { addr, app }
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!(addr = %listener.local_addr()?, "Starting metrics server");

        axum::serve(listener, router(self.app))
            .with_graceful_shutdown(shutdown)
            .await
    }
}

pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(app)
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn metrics_handler(State(app): State<Arc<App>>) -> impl IntoResponse {
    let started = Instant::now();
    let samples = app.collect().await;
    let body = render(&samples);

    debug!(
        samples = samples.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Scrape served"
    );

    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}
