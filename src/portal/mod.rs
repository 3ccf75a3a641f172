//! Scraper for the university's ASP.NET student information portal (OBS).
//!
//! Three operations make up a session: fetch the login page (hidden form
//! state + CAPTCHA), post the login form, then read the grades table. The
//! cookies and form state produced by one step must be replayed together
//! on the next.

pub mod client;
pub mod errors;
pub mod forms;
pub mod grades;
pub mod markup;
pub mod session;

pub use client::{GradesOutcome, LoginOutcome, LoginPage, PortalClient};
pub use errors::PortalError;
pub use forms::ViewState;
pub use grades::{CourseGrade, GradeReport};
pub use session::SessionCookies;
