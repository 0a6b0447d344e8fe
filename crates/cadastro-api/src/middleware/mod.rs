//! Request bookkeeping and cross-origin middleware

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, warn};

/// Count every request reaching the router and log its latency
pub async fn count_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let total = state.increment_requests() + 1;
    let method = request.method().clone();
    let endpoint = normalize_endpoint(request.uri().path());

    let response = next.run(request).await;

    debug!(
        %method,
        endpoint = %endpoint,
        status = response.status().as_u16(),
        latency_us = start.elapsed().as_micros() as u64,
        total,
        "Request handled"
    );
    response
}

/// Build the CORS layer from configured origins
///
/// An empty list allows any origin. Origins that are not valid header
/// values are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
}

/// Replace numeric path segments with `:id` so log lines group by route
fn normalize_endpoint(path: &str) -> String {
    path.split('/')
        .map(|seg| {
            if !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()) {
                ":id"
            } else {
                seg
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
