//! Router construction.

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;
use crate::web::middleware::request_id::RequestIdLayer;
use crate::web::{gateway, status};

/// Upper bound for one inbound request. `init_login` makes two portal calls
/// back to back, each bounded by the portal timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(75);

/// Creates the gateway router.
///
/// The same endpoint is mounted at `/` and `/api` so it works both locally
/// and behind a serverless `api/` path prefix.
pub fn create_router(app_state: AppState) -> Router {
    let endpoint = get(status::liveness)
        .post(gateway::dispatch)
        .options(status::preflight);

    let router = Router::new()
        .route("/", endpoint.clone())
        .route("/api", endpoint)
        .with_state(app_state);

    with_layers(router, REQUEST_TIMEOUT)
}

fn with_layers(router: Router, request_timeout: Duration) -> Router {
    router.layer((
        // Outermost: per-request ID span + severity-proportional response logging.
        RequestIdLayer,
        // The mobile app calls from its own origin; allow everything.
        CorsLayer::permissive(),
        // The portal is the slow upstream, so an overrun is a gateway timeout.
        TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, request_timeout),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_slow_request_is_gateway_timeout() {
        let router = Router::new().route(
            "/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "late"
            }),
        );
        let req = Request::builder()
            .uri("/")
            .header(header::ORIGIN, "capacitor://localhost")
            .body(Body::empty())
            .unwrap();

        let resp = with_layers(router, Duration::from_millis(50))
            .oneshot(req)
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(resp.headers().contains_key("x-request-id"));
    }
}
