//! Configuration module for the gateway.
//!
//! Values come from environment variables (optionally seeded from `.env`)
//! and are extracted with figment.

use fundu::DurationParser;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use url::Url;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base log level for crate targets; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Graceful shutdown budget, e.g. `8s` or `1500ms`
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub shutdown_timeout: Duration,
    #[serde(flatten)]
    pub portal: PortalConfig,
}

/// Where the student portal lives and how to talk to it.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Directory URL that the page paths are resolved against.
    #[serde(rename = "portal_base_url", default = "default_base_url")]
    pub base_url: Url,
    #[serde(rename = "portal_login_path", default = "default_login_path")]
    pub login_path: String,
    #[serde(rename = "portal_grades_path", default = "default_grades_path")]
    pub grades_path: String,
    /// Term reported when the grades page has no selected term.
    #[serde(
        rename = "portal_fallback_term",
        default = "default_fallback_term",
        deserialize_with = "deserialize_term"
    )]
    pub fallback_term: String,
    #[serde(rename = "portal_user_agent", default = "default_user_agent")]
    pub user_agent: String,
    #[serde(
        rename = "portal_timeout",
        default = "default_portal_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub timeout: Duration,
}

impl PortalConfig {
    /// Config pointing at `base_url` with every other value defaulted.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            login_path: default_login_path(),
            grades_path: default_grades_path(),
            fallback_term: default_fallback_term(),
            user_agent: default_user_agent(),
            timeout: default_portal_timeout(),
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::with_base_url(default_base_url())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(8)
}

fn default_base_url() -> Url {
    Url::parse("https://obs.example.edu.tr/oibs/std/").expect("static URL is valid")
}

fn default_login_path() -> String {
    "login.aspx".to_string()
}

fn default_grades_path() -> String {
    "not_listesi_op.aspx".to_string()
}

fn default_fallback_term() -> String {
    "20251".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string()
}

fn default_portal_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Accepts either a bare number of seconds or a unit-suffixed string
/// (`"30"`, `"30s"`, `"1500ms"`, `"2m"`).
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

/// Term ids look numeric (`20251`), so the env provider hands them over as
/// integers.
fn deserialize_term<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(text) => text.trim().to_string(),
    })
}

fn parse_duration(text: &str) -> Result<Duration, String> {
    let parser = DurationParser::with_all_time_units();
    let parsed = parser
        .parse(text.trim())
        .map_err(|e| format!("invalid duration '{text}': {e}"))?;
    Duration::try_from(parsed).map_err(|e| format!("invalid duration '{text}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::{Figment, providers::Serialized};

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("1500ms"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("5"), Ok(Duration::from_secs(5)));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config: Config = Figment::new().extract().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.shutdown_timeout, Duration::from_secs(8));
        assert_eq!(config.portal.login_path, "login.aspx");
        assert_eq!(config.portal.fallback_term, "20251");
        assert_eq!(config.portal.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_overrides() {
        let config: Config = Figment::new()
            .merge(Serialized::default("port", 3000))
            .merge(Serialized::default(
                "portal_base_url",
                "http://127.0.0.1:9000/oibs/std/",
            ))
            .merge(Serialized::default("portal_fallback_term", 20242))
            .merge(Serialized::default("portal_timeout", "5s"))
            .merge(Serialized::default("shutdown_timeout", 2))
            .extract()
            .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.portal.base_url.as_str(), "http://127.0.0.1:9000/oibs/std/");
        assert_eq!(config.portal.fallback_term, "20242");
        assert_eq!(config.portal.timeout, Duration::from_secs(5));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_config_term_as_text() {
        let config: Config = Figment::new()
            .merge(Serialized::default("portal_fallback_term", "20243"))
            .extract()
            .unwrap();
        assert_eq!(config.portal.fallback_term, "20243");
    }
}
