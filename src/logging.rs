use std::time::Instant;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_bytes = declared_length(&request);
    let started_at = Instant::now();

    let response = next.run(request).await;
    let status = response.status();

    info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        request_bytes,
        duration_ms = started_at.elapsed().as_millis(),
        "request summary"
    );

    match status {
        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
            debug!(method = %method, path = %path, status = status.as_u16(), "call rejected");
        }
        status if status.is_server_error() => {
            warn!(method = %method, path = %path, status = status.as_u16(), "call failed");
        }
        _ => {}
    }

    response
}

fn declared_length(request: &Request) -> Option<u64> {
    request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}
