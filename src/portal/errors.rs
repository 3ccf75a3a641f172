//! Error types for the portal client.

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("Portal request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Portal responded with {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Invalid portal URL '{input}'")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
}

pub type Result<T, E = PortalError> = std::result::Result<T, E>;
