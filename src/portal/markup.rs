//! Field names, element ids and column positions of the OBS portal markup.
//!
//! These mirror the live ASP.NET pages and break whenever the portal is
//! redesigned. Keep every literal the scraper depends on in this file.

/// `name` of the student number text box on the login form.
pub const USERNAME_FIELD: &str = "txtParamT01";

/// Current `name` of the password box.
pub const PASSWORD_FIELD: &str = "txtParamT02";

/// Older `name` of the password box, still read by some portal builds.
pub const PASSWORD_FIELD_LEGACY: &str = "txtParamT1";

/// `name` of the CAPTCHA answer box.
pub const CAPTCHA_FIELD: &str = "txtSecCode";

/// Control id of the login button, sent as the postback event target.
pub const LOGIN_BUTTON: &str = "btnLogin";

/// Submit-button key that must never reach the POST body. The form rejects
/// it when `__EVENTTARGET` already names the same control.
pub const SUBMIT_BUTTON_KEY: &str = "btnLogin";

pub const EVENT_TARGET: &str = "__EVENTTARGET";
pub const EVENT_ARGUMENT: &str = "__EVENTARGUMENT";

/// Element id of the CAPTCHA `<img>` on the login page.
pub const CAPTCHA_IMAGE_ID: &str = "imgCaptchaImg";

/// Element id of the grades `<table>`.
pub const GRADES_TABLE_ID: &str = "grd_not_listesi";

/// Element id of the term `<select>` on the grades page.
pub const TERM_SELECT_ID: &str = "cmbDonemler";

/// Column positions inside a grades table row.
pub mod columns {
    pub const CODE: usize = 0;
    pub const NAME: usize = 1;
    pub const SUMMARY: usize = 2;
    pub const LETTER_GRADE: usize = 3;
    pub const STATUS: usize = 4;

    /// Rows shorter than this are merged/decorative rows and get skipped.
    pub const MIN_CELLS: usize = 5;
}

/// Value shown for a score the instructor has not published yet.
pub const SCORE_PLACEHOLDER: &str = "--";
