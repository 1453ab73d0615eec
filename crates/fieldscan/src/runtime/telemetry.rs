//! Prometheus metrics for the acquisition runtime.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::thread;
use tiny_http::{Response, Server};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Input samples taken by the scan scheduler
pub static SAMPLES_TAKEN: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "fieldscan_samples_total",
        "Input samples taken by the scan scheduler",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Field-device reads that failed and were skipped for the tick
pub static READ_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "fieldscan_read_failures_total",
        "Field-device reads that failed (sample skipped, retried next due tick)",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Alarm activations published to the notification channel
pub static ALARMS_ACTIVATED: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "fieldscan_alarms_activated_total",
        "Alarm activations published to the notification channel",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Number of tags currently configured in the registry
pub static TAGS_CONFIGURED: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        "fieldscan_tags_configured",
        "Number of tags currently configured in the registry",
    )
    .unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Scan tick duration distribution in microseconds
pub static TICK_DURATION_US: LazyLock<Histogram> = LazyLock::new(|| {
    let histogram = Histogram::with_opts(
        HistogramOpts::new(
            "fieldscan_tick_duration_microseconds",
            "Scan tick duration distribution in microseconds",
        )
        .buckets(vec![
            10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0, 25000.0,
        ]),
    )
    .unwrap();
    REGISTRY.register(Box::new(histogram.clone())).unwrap();
    histogram
});

/// Scan ticks executed
pub static TICKS_EXECUTED: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new("fieldscan_ticks_executed_total", "Scan ticks executed").unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Force-register every metric so an early scrape sees them at zero.
pub fn init() {
    LazyLock::force(&SAMPLES_TAKEN);
    LazyLock::force(&READ_FAILURES);
    LazyLock::force(&ALARMS_ACTIVATED);
    LazyLock::force(&TAGS_CONFIGURED);
    LazyLock::force(&TICK_DURATION_US);
    LazyLock::force(&TICKS_EXECUTED);
}

pub fn start_metrics_server(addr: &Option<String>) -> Option<thread::JoinHandle<()>> {
    addr.as_ref().map(|addr| {
        tracing::info!(addr = %addr, "Starting metrics server");
        serve_metrics(addr.clone())
    })
}

/// Start the metrics HTTP server on the given address.
/// Returns a join handle for the server thread.
fn serve_metrics(bind_addr: String) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to start metrics server on {}: {}", bind_addr, e);
                return;
            }
        };

        tracing::info!("Metrics server listening on http://{}/metrics", bind_addr);

        for request in server.incoming_requests() {
            match request.url() {
                "/metrics" => {
                    let encoder = TextEncoder::new();
                    let metric_families = REGISTRY.gather();
                    let mut buffer = Vec::new();

                    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
                        tracing::warn!("Failed to encode metrics: {}", e);
                        let _ = request.respond(
                            Response::from_string("Internal Server Error").with_status_code(500),
                        );
                        continue;
                    }

                    let response = Response::from_data(buffer).with_header(
                        tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"text/plain; version=0.0.4"[..],
                        )
                        .unwrap(),
                    );
                    let _ = request.respond(response);
                }
                "/health" => {
                    let _ = request.respond(Response::from_string("OK"));
                }
                "/ready" => {
                    // Ready once the scan loop has completed a tick
                    if TICKS_EXECUTED.get() > 0 {
                        let _ = request.respond(Response::from_string("Ready"));
                    } else {
                        let _ = request
                            .respond(Response::from_string("Not Ready").with_status_code(503));
                    }
                }
                _ => {
                    let _ =
                        request.respond(Response::from_string("Not Found").with_status_code(404));
                }
            }
        }
    })
}
