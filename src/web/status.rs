//! Liveness and preflight handlers.

use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use tracing::trace;

use crate::web::envelope::Envelope;

#[derive(Debug, Serialize)]
pub struct LivenessInfo {
    version: &'static str,
    commit: &'static str,
    timestamp: String,
}

/// `GET /`: liveness probe.
pub(super) async fn liveness() -> Json<Envelope<LivenessInfo>> {
    trace!("liveness probe");
    Json(
        Envelope::success(LivenessInfo {
            version: env!("CARGO_PKG_VERSION"),
            commit: env!("GIT_COMMIT_SHORT"),
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
        .with_message("OBS gateway is running"),
    )
}

/// `OPTIONS /`: CORS preflight. Headers come from the CORS layer; no body.
pub(super) async fn preflight() -> StatusCode {
    StatusCode::OK
}
