//! HTTP client for the OBS student portal.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use html_scraper::Html;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest_cookie_store::CookieStoreMutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::errors::{PortalError, Result};
use super::forms::{self, ViewState};
use super::grades::{self, GradeReport};
use super::session::{self, SessionCookies};
use crate::config::PortalConfig;
use crate::utils::log_if_slow;

/// Portal round-trips slower than this are logged.
const SLOW_REQUEST: Duration = Duration::from_secs(3);

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7";

/// Login page state handed to the caller for the next step.
#[derive(Debug, Clone, Serialize)]
pub struct LoginPage {
    /// Base64 of the CAPTCHA image bytes; `None` when the page had no CAPTCHA.
    pub captcha_image: Option<String>,
    pub view_state_data: ViewState,
    pub cookies: SessionCookies,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub success: bool,
    pub cookies: SessionCookies,
    pub message: String,
}

/// Result of a grades fetch. An expired session is an expected outcome, not
/// an error: the caller has to log in again.
#[derive(Debug, Clone)]
pub enum GradesOutcome {
    Grades(GradeReport),
    SessionExpired,
}

/// One portal session. Build a fresh client per inbound request, load the
/// caller's cookies, run a single operation, then read the cookies back.
pub struct PortalClient {
    http: reqwest::Client,
    jar: Arc<CookieStoreMutex>,
    login_url: Url,
    grades_url: Url,
    /// Lowercased file name of the login page; its presence in a final URL
    /// means the portal bounced us back to the login form.
    login_marker: String,
    fallback_term: String,
}

impl PortalClient {
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let login_url = join_url(&config.base_url, &config.login_path)?;
        let grades_url = join_url(&config.base_url, &config.grades_path)?;

        let login_marker = login_url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .unwrap_or(config.login_path.as_str())
            .to_ascii_lowercase();

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );

        let jar = Arc::new(CookieStoreMutex::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            jar,
            login_url,
            grades_url,
            login_marker,
            fallback_term: config.fallback_term.clone(),
        })
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    pub fn grades_url(&self) -> &Url {
        &self.grades_url
    }

    /// Load caller-supplied cookies into this client's jar.
    pub fn set_cookies(&self, cookies: &SessionCookies) {
        session::load_into(&self.jar, cookies, &self.login_url);
    }

    /// Every cookie the jar currently holds for the portal pages.
    pub fn cookies(&self) -> SessionCookies {
        session::export_from(&self.jar, &[&self.login_url, &self.grades_url])
    }

    /// GET the login page, capture its hidden fields, and download the CAPTCHA.
    #[instrument(skip_all)]
    pub async fn fetch_login_page(&self) -> Result<LoginPage> {
        let start = Instant::now();
        let resp = self.http.get(self.login_url.clone()).send().await?;
        let page_url = resp.url().clone();
        let body = read_html(resp).await?;

        // `Html` is not Send; drop it before the next await.
        let (view_state_data, captcha_src) = {
            let html = Html::parse_document(&body);
            (
                forms::extract_hidden_fields(&html),
                forms::find_captcha_src(&html),
            )
        };
        debug!(fields = view_state_data.len(), "Captured login form state");

        let captcha_image = match captcha_src {
            Some(src) => {
                let image_url = join_url(&page_url, &src)?;
                Some(self.fetch_captcha(image_url).await?)
            }
            None => {
                warn!("No CAPTCHA image found on login page");
                None
            }
        };

        log_if_slow(start, SLOW_REQUEST, "fetch login page");
        Ok(LoginPage {
            captcha_image,
            view_state_data,
            cookies: self.cookies(),
        })
    }

    async fn fetch_captcha(&self, image_url: Url) -> Result<String> {
        let resp = self
            .http
            .get(image_url)
            .header(header::REFERER, self.login_url.as_str())
            .header(header::ACCEPT, "image/*,*/*;q=0.8")
            .send()
            .await?;
        let resp = ensure_success(resp)?;
        let bytes = resp.bytes().await?;
        debug!(bytes = bytes.len(), "Downloaded CAPTCHA image");
        Ok(BASE64.encode(&bytes))
    }

    /// POST the login form built from `view_state` plus credentials.
    ///
    /// The portal answers a good login with a redirect away from the login
    /// page; a bad one re-renders the form. Nothing in the body is checked,
    /// but the page the redirects end on must answer 2xx.
    #[instrument(skip_all)]
    pub async fn attempt_login(
        &self,
        username: &str,
        password: &str,
        captcha_code: &str,
        view_state: &ViewState,
    ) -> Result<LoginOutcome> {
        let start = Instant::now();
        let params = forms::build_login_payload(view_state, username, password, captcha_code);

        let resp = self
            .http
            .post(self.login_url.clone())
            .header(header::REFERER, self.login_url.as_str())
            .header(header::ORIGIN, self.login_url.origin().ascii_serialization())
            .form(&params)
            .send()
            .await?;

        let resp = ensure_success(resp)?;
        let success = !self.is_login_url(resp.url());
        log_if_slow(start, SLOW_REQUEST, "login postback");

        let message = if success {
            info!("Portal login succeeded");
            "Login successful".to_string()
        } else {
            info!("Portal login rejected");
            "Login failed. Check your student number, password and CAPTCHA code.".to_string()
        };

        Ok(LoginOutcome {
            success,
            cookies: self.cookies(),
            message,
        })
    }

    /// GET the grades page and parse the course table.
    #[instrument(skip_all)]
    pub async fn fetch_grades_data(&self) -> Result<GradesOutcome> {
        let start = Instant::now();
        let resp = self.http.get(self.grades_url.clone()).send().await?;

        if self.is_login_url(resp.url()) {
            info!("Grades request redirected to login, session expired");
            return Ok(GradesOutcome::SessionExpired);
        }

        let body = read_html(resp).await?;
        let report = grades::parse_grade_report(&Html::parse_document(&body), &self.fallback_term);

        log_if_slow(start, SLOW_REQUEST, "fetch grades");
        info!(
            courses = report.courses.len(),
            term_id = report.term_id.as_str(),
            "Fetched grades"
        );
        Ok(GradesOutcome::Grades(report))
    }

    fn is_login_url(&self, url: &Url) -> bool {
        url.as_str().to_ascii_lowercase().contains(&self.login_marker)
    }
}

fn join_url(base: &Url, input: &str) -> Result<Url> {
    base.join(input).map_err(|source| PortalError::InvalidUrl {
        input: input.to_string(),
        source,
    })
}

fn status_error(resp: &reqwest::Response) -> PortalError {
    PortalError::Status {
        status: resp.status().as_u16(),
        url: resp.url().to_string(),
    }
}

fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(status_error(&resp))
    }
}

async fn read_html(resp: reqwest::Response) -> Result<String> {
    Ok(ensure_success(resp)?.text().await?)
}
