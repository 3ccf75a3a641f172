//! The JSON envelope every response is wrapped in.
//!
//! `{status: "success"|"error", data?, cookies?, message?}` with absent
//! members omitted.

use serde::Serialize;

use crate::portal::SessionCookies;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T = ()> {
    pub status: EnvelopeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<SessionCookies>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            data: None,
            cookies: None,
            message: Some(message.into()),
        }
    }

    /// Success without a data payload.
    pub fn ok() -> Self {
        Self {
            status: EnvelopeStatus::Success,
            data: None,
            cookies: None,
            message: None,
        }
    }
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            data: Some(data),
            cookies: None,
            message: None,
        }
    }

    pub fn with_cookies(mut self, cookies: SessionCookies) -> Self {
        self.cookies = Some(cookies);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
