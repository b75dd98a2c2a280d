use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::header::{HeaderName, CONTENT_TYPE, USER_AGENT};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use tower::{Layer, Service};
use tracing::info;

static REGISTRY: Lazy<Registry> =
    Lazy::new(|| Registry::new_custom(None, Some(static_labels())).unwrap());

fn static_labels() -> std::collections::HashMap<String, String> {
    let mut labels = std::collections::HashMap::new();
    if let Ok(env) = std::env::var("APP_ENV") {
        labels.insert("env".to_string(), env);
    }
    if let Ok(service) = std::env::var("SERVICE_NAME") {
        labels.insert("service".to_string(), service);
    } else {
        labels.insert("service".to_string(), "brevet-align".to_string());
    }
    if let Ok(instance) = std::env::var("INSTANCE_ID") {
        labels.insert("instance".to_string(), instance);
    }
    if let Ok(version) = std::env::var("VERSION") {
        labels.insert("version".to_string(), version);
    }
    labels
}

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new("http_requests_total", "Total HTTP requests");
    let counter =
        IntCounterVec::new(opts, &["method", "route", "status_class"]).expect("counter vec");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("register http_requests_total");
    counter
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let opts = HistogramOpts::new("http_request_duration_seconds", "HTTP request latency")
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0]);
    let hist = HistogramVec::new(opts, &["method", "route", "status_class"]).expect("hist vec");
    REGISTRY
        .register(Box::new(hist.clone()))
        .expect("register http_request_duration_seconds");
    hist
});

static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::with_opts(Opts::new(
        "http_requests_in_flight",
        "In-flight HTTP requests",
    ))
    .expect("gauge");
    REGISTRY
        .register(Box::new(gauge.clone()))
        .expect("register http_requests_in_flight");
    gauge
});

static HTTP_REQUEST_SIZE_BYTES: Lazy<HistogramVec> = Lazy::new(|| {
    let opts = HistogramOpts::new("http_request_size_bytes", "HTTP request size").buckets(vec![
        512.0, 1_024.0, 2_048.0, 5_000.0, 10_000.0, 50_000.0, 100_000.0, 500_000.0, 1_000_000.0,
        5_000_000.0,
    ]);
    let hist = HistogramVec::new(opts, &["method", "route"]).expect("hist vec");
    REGISTRY
        .register(Box::new(hist.clone()))
        .expect("register http_request_size_bytes");
    hist
});

static HTTP_RESPONSE_SIZE_BYTES: Lazy<HistogramVec> = Lazy::new(|| {
    let opts = HistogramOpts::new("http_response_size_bytes", "HTTP response size").buckets(vec![
        512.0, 1_024.0, 2_048.0, 5_000.0, 10_000.0, 50_000.0, 100_000.0, 500_000.0, 1_000_000.0,
        5_000_000.0,
    ]);
    let hist = HistogramVec::new(opts, &["method", "route", "status_class"]).expect("hist vec");
    REGISTRY
        .register(Box::new(hist.clone()))
        .expect("register http_response_size_bytes");
    hist
});

static HTTP_REQUEST_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "http_requests_errors_total",
        "HTTP error responses by class",
    );
    let counter = IntCounterVec::new(opts, &["route", "status_class"]).expect("counter vec");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("register http_requests_errors_total");
    counter
});

static ALIGNMENT_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "alignment_requests_total",
        "Alignment requests by outcome",
    );
    let counter = IntCounterVec::new(opts, &["outcome"]).expect("counter vec");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("register alignment_requests_total");
    counter
});

static ALIGNMENT_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let opts = HistogramOpts::new(
        "alignment_duration_seconds",
        "Time to run the alignment pipeline end to end",
    )
    .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0]);
    let hist = HistogramVec::new(opts, &["outcome"]).expect("hist vec");
    REGISTRY
        .register(Box::new(hist.clone()))
        .expect("register alignment_duration_seconds");
    hist
});

static ALIGNMENT_TRACK_POINTS: Lazy<HistogramVec> = Lazy::new(|| {
    let opts = HistogramOpts::new(
        "alignment_track_points",
        "Raw track point counts at each shaping stage",
    )
    .buckets(vec![
        10.0, 50.0, 100.0, 500.0, 1_000.0, 5_000.0, 10_000.0, 20_000.0, 50_000.0,
    ]);
    let hist = HistogramVec::new(opts, &["stage"]).expect("hist vec");
    REGISTRY
        .register(Box::new(hist.clone()))
        .expect("register alignment_track_points");
    hist
});

static ALIGNMENT_ROUTE_DEVIATION_METERS: Lazy<prometheus::Histogram> = Lazy::new(|| {
    let opts = HistogramOpts::new(
        "alignment_route_deviation_meters",
        "Recomputed route deviation (factor=0)",
    )
    .buckets(vec![
        50.0, 100.0, 200.0, 500.0, 1_000.0, 2_000.0, 5_000.0, 10_000.0,
    ]);
    let hist = prometheus::Histogram::with_opts(opts).expect("histogram");
    REGISTRY
        .register(Box::new(hist.clone()))
        .expect("register alignment_route_deviation_meters");
    hist
});

static ALIGNMENT_CONTROL_DEVIATION_METERS: Lazy<prometheus::Histogram> = Lazy::new(|| {
    let opts = HistogramOpts::new(
        "alignment_control_deviation_meters",
        "Recomputed control deviation (factor=0)",
    )
    .buckets(vec![
        50.0, 100.0, 200.0, 500.0, 1_000.0, 2_000.0, 5_000.0, 10_000.0,
    ]);
    let hist = prometheus::Histogram::with_opts(opts).expect("histogram");
    REGISTRY
        .register(Box::new(hist.clone()))
        .expect("register alignment_control_deviation_meters");
    hist
});

static ALIGNMENT_CHECKPOINTS_MATCHED: Lazy<prometheus::IntGauge> = Lazy::new(|| {
    let gauge = prometheus::IntGauge::with_opts(Opts::new(
        "alignment_checkpoints_matched",
        "Checkpoints matched in the most recent successful alignment",
    ))
    .expect("gauge");
    REGISTRY
        .register(Box::new(gauge.clone()))
        .expect("register alignment_checkpoints_matched");
    gauge
});

#[derive(Clone)]
pub struct HttpMetricsLayer;

impl Default for HttpMetricsLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpMetricsLayer {
    pub fn new() -> Self {
        let _ = &*HTTP_REQUESTS_TOTAL;
        let _ = &*HTTP_REQUEST_DURATION_SECONDS;
        let _ = &*HTTP_REQUESTS_IN_FLIGHT;
        let _ = &*HTTP_REQUEST_SIZE_BYTES;
        let _ = &*HTTP_RESPONSE_SIZE_BYTES;
        let _ = &*HTTP_REQUEST_ERRORS_TOTAL;
        let _ = &*ALIGNMENT_REQUESTS_TOTAL;
        let _ = &*ALIGNMENT_DURATION_SECONDS;
        let _ = &*ALIGNMENT_TRACK_POINTS;
        let _ = &*ALIGNMENT_ROUTE_DEVIATION_METERS;
        let _ = &*ALIGNMENT_CONTROL_DEVIATION_METERS;
        let _ = &*ALIGNMENT_CHECKPOINTS_MATCHED;
        Self
    }
}

/// Pre-create label value combinations so metrics appear in scraping even before traffic.
pub fn initialize_metrics_baseline() {
    let _ = HttpMetricsLayer::new();

    {
        let families = REGISTRY.gather();
        let names: Vec<String> = families.iter().map(|f| f.name().to_string()).collect();
        info!(count = families.len(), names = ?names, "metrics baseline registered");
    }

    let _ = HTTP_REQUESTS_TOTAL.with_label_values(&["INIT", "/init", "0xx"]);
    let _ = HTTP_REQUEST_DURATION_SECONDS.with_label_values(&["INIT", "/init", "0xx"]);
    let _ = HTTP_REQUEST_SIZE_BYTES.with_label_values(&["INIT", "/init"]);
    let _ = HTTP_RESPONSE_SIZE_BYTES.with_label_values(&["INIT", "/init", "0xx"]);
    let _ = HTTP_REQUEST_ERRORS_TOTAL.with_label_values(&["/init", "5xx"]);
    HTTP_REQUESTS_IN_FLIGHT.set(0);

    let _ = ALIGNMENT_REQUESTS_TOTAL.with_label_values(&["passed"]);
    let _ = ALIGNMENT_REQUESTS_TOTAL.with_label_values(&["route_deviation"]);
    let _ = ALIGNMENT_REQUESTS_TOTAL.with_label_values(&["control_deviation"]);
    let _ = ALIGNMENT_REQUESTS_TOTAL.with_label_values(&["checkpoint_missing"]);
    let _ = ALIGNMENT_REQUESTS_TOTAL.with_label_values(&["no_track"]);
    let _ = ALIGNMENT_DURATION_SECONDS.with_label_values(&["passed"]);
    let _ = ALIGNMENT_TRACK_POINTS.with_label_values(&["raw"]);
    let _ = ALIGNMENT_TRACK_POINTS.with_label_values(&["down_sampled"]);
    let _ = ALIGNMENT_TRACK_POINTS.with_label_values(&["shaped"]);
    ALIGNMENT_CHECKPOINTS_MATCHED.set(0);
}

impl<S> Layer<S> for HttpMetricsLayer {
    type Service = HttpMetricsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpMetricsMiddleware { inner }
    }
}

#[derive(Clone)]
pub struct HttpMetricsMiddleware<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for HttpMetricsMiddleware<S>
where
    S: Service<Request<B>, Response = Response<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let method = req.method().to_string();
        let matched = req
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());
        let uri = req.uri().path().to_string();
        let req_size = req
            .headers()
            .get(axum::http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);
        let user_agent = req
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let request_id = req
            .headers()
            .get(HeaderName::from_static("x-request-id"))
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        HTTP_REQUESTS_IN_FLIGHT.inc();
        let start = Instant::now();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let result: Result<Response, Infallible> = inner.call(req).await;
            let elapsed = start.elapsed().as_secs_f64();
            HTTP_REQUESTS_IN_FLIGHT.dec();

            match result {
                Ok(response) => {
                    let status = response.status();
                    let status_class = status.as_u16() / 100;
                    let status_class_str = status_class.to_string();

                    HTTP_REQUESTS_TOTAL
                        .with_label_values(&[
                            method.as_str(),
                            matched.as_str(),
                            status_class_str.as_str(),
                        ])
                        .inc();
                    HTTP_REQUEST_DURATION_SECONDS
                        .with_label_values(&[
                            method.as_str(),
                            matched.as_str(),
                            status_class_str.as_str(),
                        ])
                        .observe(elapsed);
                    HTTP_REQUEST_SIZE_BYTES
                        .with_label_values(&[method.as_str(), matched.as_str()])
                        .observe(req_size);

                    let resp_size = response
                        .headers()
                        .get(axum::http::header::CONTENT_LENGTH)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<f64>().ok());

                    if let Some(len) = resp_size {
                        HTTP_RESPONSE_SIZE_BYTES
                            .with_label_values(&[
                                method.as_str(),
                                matched.as_str(),
                                status_class_str.as_str(),
                            ])
                            .observe(len);
                    }

                    if status.is_server_error() || status.is_client_error() {
                        HTTP_REQUEST_ERRORS_TOTAL
                            .with_label_values(&[matched.as_str(), status_class_str.as_str()])
                            .inc();
                    }

                    info!(
                        method = method.as_str(),
                        route = matched.as_str(),
                        uri = uri,
                        status = status.as_u16(),
                        status_class = status_class,
                        latency_ms = elapsed * 1000.0,
                        request_size_bytes = req_size,
                        response_size_bytes = resp_size.unwrap_or(0.0),
                        user_agent = user_agent.as_deref().unwrap_or(""),
                        request_id = request_id.as_deref().unwrap_or(""),
                        "http_request"
                    );

                    Ok(response)
                }
                Err(err) => {
                    HTTP_REQUESTS_TOTAL
                        .with_label_values(&[method.as_str(), matched.as_str(), "5xx"])
                        .inc();
                    HTTP_REQUEST_ERRORS_TOTAL
                        .with_label_values(&[matched.as_str(), "5xx"])
                        .inc();
                    Err(err)
                }
            }
        })
    }
}

pub async fn serve_metrics() -> impl IntoResponse {
    initialize_metrics_baseline();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&["init", "/metrics", "0xx"])
        .inc_by(0);

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(_e) = encoder.encode(&metric_families, &mut buffer) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let body = String::from_utf8(buffer).unwrap_or_default();

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, encoder.format_type())
        .body(Body::from(body))
        .unwrap()
}

/// Record the terminal outcome of one alignment request plus its wall-clock
/// duration. `outcome` is one of `passed`, `route_deviation`,
/// `control_deviation`, `checkpoint_missing`, `no_track`.
pub fn record_alignment_outcome(outcome: &str, seconds: f64) {
    ALIGNMENT_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
    ALIGNMENT_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(seconds);
}

/// Record a track's point count at a given shaping stage (`raw`,
/// `down_sampled`, `shaped`).
pub fn observe_track_points(stage: &str, count: usize) {
    ALIGNMENT_TRACK_POINTS
        .with_label_values(&[stage])
        .observe(count as f64);
}

pub fn observe_route_deviation(meters: f64) {
    ALIGNMENT_ROUTE_DEVIATION_METERS.observe(meters);
}

pub fn observe_control_deviation(meters: f64) {
    ALIGNMENT_CONTROL_DEVIATION_METERS.observe(meters);
}

pub fn set_checkpoints_matched(count: usize) {
    ALIGNMENT_CHECKPOINTS_MATCHED.set(count as i64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn metrics_endpoint_returns_ok() {
        let response = serve_metrics().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body to bytes");
        let body_str = String::from_utf8(body.to_vec()).expect("utf8 body");
        assert!(body_str.contains("http_requests_total"));
    }

    #[tokio::test]
    async fn baseline_exposes_alignment_metrics() {
        initialize_metrics_baseline();
        let response = serve_metrics().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body to bytes");
        let body_str = String::from_utf8(body.to_vec()).expect("utf8 body");
        assert!(body_str.contains("alignment_requests_total"));
        assert!(body_str.contains("alignment_track_points"));
    }

    #[test]
    fn record_alignment_outcome_increments_counter() {
        record_alignment_outcome("passed", 0.25);
        observe_route_deviation(123.0);
        observe_control_deviation(45.0);
        set_checkpoints_matched(4);
        observe_track_points("raw", 1000);
    }
}
