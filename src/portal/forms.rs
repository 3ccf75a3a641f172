//! ASP.NET WebForms state handling for the login page.
//!
//! The portal rejects any postback whose hidden fields (`__VIEWSTATE`,
//! `__EVENTVALIDATION`, ...) do not come from the same page load as the
//! session cookie, so the bundle is captured verbatim and replayed as-is.

use html_scraper::{Html, Selector};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::markup;

/// Hidden form fields captured from the login page, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewState(IndexMap<String, String>);

impl ViewState {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ViewState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Collect every `<input type="hidden">` with a non-empty name.
///
/// A missing `value` attribute becomes an empty string. If a name repeats,
/// the last occurrence wins and the key still appears once.
pub fn extract_hidden_fields(html: &Html) -> ViewState {
    let input_sel = Selector::parse("input").unwrap();
    let mut fields = IndexMap::new();

    for input in html.select(&input_sel) {
        let is_hidden = input
            .attr("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("hidden"));
        if !is_hidden {
            continue;
        }

        let name = match input.attr("name") {
            Some(n) if !n.is_empty() => n,
            _ => continue,
        };

        let value = input.attr("value").unwrap_or_default();
        fields.insert(name.to_string(), value.to_string());
    }

    ViewState(fields)
}

/// Locate the CAPTCHA image source on the login page.
///
/// Prefers the element with the known id and falls back to any image whose
/// `src` mentions "captcha". The returned value is unresolved.
pub fn find_captcha_src(html: &Html) -> Option<String> {
    let img_sel = Selector::parse("img").unwrap();
    let mut fallback = None;

    for img in html.select(&img_sel) {
        let Some(src) = img.attr("src").map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };

        if img.attr("id") == Some(markup::CAPTCHA_IMAGE_ID) {
            return Some(src.to_string());
        }

        if fallback.is_none() && src.to_ascii_lowercase().contains("captcha") {
            fallback = Some(src.to_string());
        }
    }

    fallback
}

/// Build the login postback body.
///
/// Starts from the supplied view-state, overlays the credential fields and
/// the postback target, then drops the submit-button key.
pub fn build_login_payload(
    view_state: &ViewState,
    username: &str,
    password: &str,
    captcha_code: &str,
) -> Vec<(String, String)> {
    let mut params = view_state.0.clone();

    let overrides = [
        (markup::USERNAME_FIELD, username),
        (markup::PASSWORD_FIELD, password),
        (markup::PASSWORD_FIELD_LEGACY, password),
        (markup::CAPTCHA_FIELD, captcha_code),
        (markup::EVENT_TARGET, markup::LOGIN_BUTTON),
        (markup::EVENT_ARGUMENT, ""),
    ];
    for (key, val) in overrides {
        params.insert(key.to_string(), val.to_string());
    }

    params.shift_remove(markup::SUBMIT_BUTTON_KEY);

    params.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!("<html><body><form>{body}</form></body></html>"))
    }

    fn payload_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    // --- extract_hidden_fields ---

    #[test]
    fn test_extract_hidden_fields_basic() {
        let html = doc(r#"
            <input type="hidden" name="__VIEWSTATE" value="abc123" />
            <input type="hidden" name="__EVENTVALIDATION" value="ev" />
            <input type="text" name="txtParamT01" value="ignored" />
        "#);
        let fields = extract_hidden_fields(&html);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("__VIEWSTATE"), Some("abc123"));
        assert_eq!(fields.get("__EVENTVALIDATION"), Some("ev"));
        assert_eq!(fields.get("txtParamT01"), None);
    }

    #[test]
    fn test_extract_hidden_fields_missing_value_is_empty() {
        let html = doc(r#"<input type="hidden" name="__EVENTTARGET" />"#);
        let fields = extract_hidden_fields(&html);
        assert_eq!(fields.get("__EVENTTARGET"), Some(""));
    }

    #[test]
    fn test_extract_hidden_fields_skips_unnamed() {
        let html = doc(r#"
            <input type="hidden" value="orphan" />
            <input type="hidden" name="" value="blank" />
            <input type="hidden" name="kept" value="1" />
        "#);
        let fields = extract_hidden_fields(&html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("kept"), Some("1"));
    }

    #[test]
    fn test_extract_hidden_fields_type_case_insensitive() {
        let html = doc(r#"<input type="HIDDEN" name="__VIEWSTATEGENERATOR" value="C2EE9ABB" />"#);
        let fields = extract_hidden_fields(&html);
        assert_eq!(fields.get("__VIEWSTATEGENERATOR"), Some("C2EE9ABB"));
    }

    #[test]
    fn test_extract_hidden_fields_duplicate_name_once() {
        let html = doc(r#"
            <input type="hidden" name="dup" value="first" />
            <input type="hidden" name="dup" value="second" />
        "#);
        let fields = extract_hidden_fields(&html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("dup"), Some("second"));
    }

    #[test]
    fn test_extract_hidden_fields_preserves_order() {
        let html = doc(r#"
            <input type="hidden" name="b" value="" />
            <input type="hidden" name="a" value="" />
            <input type="hidden" name="c" value="" />
        "#);
        let fields = extract_hidden_fields(&html);
        let names: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    // --- find_captcha_src ---

    #[test]
    fn test_find_captcha_src_by_id() {
        let html = doc(r#"
            <img src="logo.png" />
            <img id="imgCaptchaImg" src="captcha/CaptchaImg.aspx?r=1" />
        "#);
        assert_eq!(
            find_captcha_src(&html).as_deref(),
            Some("captcha/CaptchaImg.aspx?r=1")
        );
    }

    #[test]
    fn test_find_captcha_src_by_src_fallback() {
        let html = doc(r#"<img src="/oibs/Captcha/Image.ashx" />"#);
        assert_eq!(
            find_captcha_src(&html).as_deref(),
            Some("/oibs/Captcha/Image.ashx")
        );
    }

    #[test]
    fn test_find_captcha_src_absent() {
        let html = doc(r#"<img src="logo.png" />"#);
        assert_eq!(find_captcha_src(&html), None);
    }

    // --- build_login_payload ---

    #[test]
    fn test_build_login_payload_overlays_credentials() {
        let vs: ViewState = [("__VIEWSTATE", "vs"), ("__EVENTVALIDATION", "ev")]
            .into_iter()
            .collect();
        let params = build_login_payload(&vs, "20201234", "hunter2", "X7K9");

        assert_eq!(payload_value(&params, "__VIEWSTATE"), Some("vs"));
        assert_eq!(payload_value(&params, "__EVENTVALIDATION"), Some("ev"));
        assert_eq!(payload_value(&params, markup::USERNAME_FIELD), Some("20201234"));
        assert_eq!(payload_value(&params, markup::PASSWORD_FIELD), Some("hunter2"));
        assert_eq!(
            payload_value(&params, markup::PASSWORD_FIELD_LEGACY),
            Some("hunter2")
        );
        assert_eq!(payload_value(&params, markup::CAPTCHA_FIELD), Some("X7K9"));
        assert_eq!(payload_value(&params, markup::EVENT_ARGUMENT), Some(""));
    }

    #[test]
    fn test_build_login_payload_drops_submit_key() {
        let vs: ViewState = [("__VIEWSTATE", "vs"), (markup::SUBMIT_BUTTON_KEY, "Giriş")]
            .into_iter()
            .collect();
        let params = build_login_payload(&vs, "u", "p", "c");
        assert!(!params.iter().any(|(k, _)| k == markup::SUBMIT_BUTTON_KEY));
    }

    #[test]
    fn test_build_login_payload_never_has_submit_key_even_when_empty() {
        let params = build_login_payload(&ViewState::default(), "u", "p", "c");
        assert!(!params.iter().any(|(k, _)| k == markup::SUBMIT_BUTTON_KEY));
        assert!(payload_value(&params, markup::USERNAME_FIELD).is_some());
    }

    #[test]
    fn test_build_login_payload_overrides_stale_credentials() {
        let vs: ViewState = [(markup::USERNAME_FIELD, "old"), (markup::EVENT_TARGET, "")]
            .into_iter()
            .collect();
        let params = build_login_payload(&vs, "new", "p", "c");
        assert_eq!(payload_value(&params, markup::USERNAME_FIELD), Some("new"));
        assert_eq!(
            payload_value(&params, markup::EVENT_TARGET),
            Some(markup::LOGIN_BUTTON)
        );
        assert_eq!(
            params
                .iter()
                .filter(|(k, _)| k == markup::USERNAME_FIELD)
                .count(),
            1
        );
    }
}
