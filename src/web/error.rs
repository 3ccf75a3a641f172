//! Gateway error type and its mapping onto the JSON envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::{error, warn};

use crate::portal::PortalError;
use crate::web::envelope::Envelope;

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The body could not be parsed as JSON at all.
    #[error("Request body is not valid JSON: {0}")]
    MalformedBody(#[source] serde_json::Error),
    /// Missing or unknown action, or a known action with bad fields.
    #[error("{0}")]
    InvalidCommand(String),
    /// Credentials or CAPTCHA rejected by the portal.
    #[error("{0}")]
    LoginRejected(String),
    #[error("{}", SESSION_EXPIRED_MESSAGE)]
    SessionExpired,
    #[error(transparent)]
    Portal(#[from] PortalError),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MalformedBody(_) | GatewayError::Portal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::InvalidCommand(_) => StatusCode::BAD_REQUEST,
            GatewayError::LoginRejected(_) | GatewayError::SessionExpired => {
                StatusCode::UNAUTHORIZED
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(error = ?self, "Command failed");
        } else if status == StatusCode::BAD_REQUEST {
            warn!(message = message.as_str(), "Rejected command");
        }

        (status, Json(Envelope::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatewayError::InvalidCommand("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::LoginRejected("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::SessionExpired.status_code(),
            StatusCode::UNAUTHORIZED
        );
        let portal = PortalError::Status {
            status: 503,
            url: "https://obs.example.edu.tr/".into(),
        };
        assert_eq!(
            GatewayError::from(portal).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_session_expired_message() {
        assert_eq!(
            GatewayError::SessionExpired.to_string(),
            SESSION_EXPIRED_MESSAGE
        );
    }
}
