use axum::{
    Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
};
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder, register_histogram,
    register_int_counter, register_int_counter_vec, register_int_gauge,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

pub static DISPATCH_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "owui_mcp_dispatch_latency_ms",
        "Latency of tool dispatch in ms"
    )
    .unwrap()
});

pub static TOOL_CALLS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("owui_mcp_tool_calls_total", "Tool invocations received").unwrap()
});

pub static TOOL_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "owui_mcp_tool_failures_total",
        "Tool invocations that produced a failure result",
        &["kind"]
    )
    .unwrap()
});

pub static DISPATCH_INFLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("owui_mcp_dispatch_inflight", "In-flight tool dispatches").unwrap()
});

pub struct InflightGuard;

impl InflightGuard {
    pub fn new() -> Self {
        DISPATCH_INFLIGHT.inc();
        InflightGuard
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        DISPATCH_INFLIGHT.dec();
    }
}

pub fn record_failure(kind: &str) {
    TOOL_FAILURES.with_label_values(&[kind]).inc();
}

#[derive(Clone, Debug)]
pub struct MetricsServerConfig {
    pub addr: SocketAddr,
    pub auth_token: Option<String>,
}

#[derive(Clone)]
struct MetricsState {
    auth_token: Option<String>,
}

pub async fn spawn_metrics_server(config: MetricsServerConfig) {
    let MetricsServerConfig { addr, auth_token } = config;
    let state = MetricsState { auth_token };
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    tokio::spawn(async move {
        info!(%addr, "metrics server starting");
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(err) = axum::serve(listener, app.into_make_service()).await {
                    error!(%addr, %err, "metrics server terminated");
                }
            }
            Err(err) => {
                error!(%addr, %err, "failed to bind metrics listener");
            }
        }
    });
}

async fn metrics_handler(
    State(state): State<MetricsState>,
    headers: HeaderMap,
) -> axum::response::Response {
    if let Some(token) = &state.auth_token {
        if !is_authorized(headers.get(http::header::AUTHORIZATION), token) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let encoder = TextEncoder::new();
    let metrics = prometheus::gather();
    let mut buf = Vec::new();
    if let Err(err) = encoder.encode(&metrics, &mut buf) {
        error!(%err, "failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response();
    }

    let body = axum::body::Bytes::from(buf);
    let mut resp: http::Response<axum::body::Body> =
        http::Response::new(axum::body::Body::from(body));
    let ct = encoder.format_type().to_string();
    resp.headers_mut().insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_str(&ct).unwrap_or(HeaderValue::from_static("text/plain")),
    );
    resp.into_response()
}

fn is_authorized(header: Option<&HeaderValue>, token: &str) -> bool {
    match header.and_then(|value| value.to_str().ok()) {
        Some(value) if value.starts_with("Bearer ") => value[7..].trim() == token,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_check_requires_exact_token() {
        let header = HeaderValue::from_static("Bearer secret");
        assert!(is_authorized(Some(&header), "secret"));
        assert!(!is_authorized(Some(&header), "other"));
        let bare = HeaderValue::from_static("secret");
        assert!(!is_authorized(Some(&bare), "secret"));
        assert!(!is_authorized(None, "secret"));
    }
}
