//! Inbound command decoding.
//!
//! The body is a JSON object tagged by `action`. Decoding happens in two
//! passes so the three failure kinds stay distinguishable: a body that is
//! not JSON at all, a missing or unknown action, and a known action whose
//! fields are missing or mistyped.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::portal::{SessionCookies, ViewState};
use crate::web::error::GatewayError;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginCommand {
    pub cookies: SessionCookies,
    pub username: String,
    pub password: String,
    pub captcha_code: String,
    pub view_state_data: ViewState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetGradesCommand {
    pub cookies: SessionCookies,
}

#[derive(Debug, Clone)]
pub enum Command {
    InitLogin,
    Login(LoginCommand),
    GetGrades(GetGradesCommand),
}

impl Command {
    pub fn decode(body: &[u8]) -> Result<Self, GatewayError> {
        let value: Value = serde_json::from_slice(body).map_err(GatewayError::MalformedBody)?;

        let action = value
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::InvalidCommand("Missing 'action' field".to_string()))?;

        match action {
            "init_login" => Ok(Command::InitLogin),
            "login" => Ok(Command::Login(decode_fields(action, &value)?)),
            "get_grades" => Ok(Command::GetGrades(decode_fields(action, &value)?)),
            other => Err(GatewayError::InvalidCommand(format!(
                "Unknown action '{other}'"
            ))),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Command::InitLogin => "init_login",
            Command::Login(_) => "login",
            Command::GetGrades(_) => "get_grades",
        }
    }
}

/// Deserialize action-specific fields, naming the offending path on failure.
fn decode_fields<T: DeserializeOwned>(action: &str, value: &Value) -> Result<T, GatewayError> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        let message = if path.is_empty() || path == "." {
            format!("Invalid '{action}' command: {inner}")
        } else {
            format!("Invalid '{action}' command at '{path}': {inner}")
        };
        GatewayError::InvalidCommand(message)
    })
}
