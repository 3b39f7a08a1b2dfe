//! Web side of docsift: admitting URLs and capturing rendered pages.
//!
//! - [`validate`] checks a raw URL (scheme, DNS, optional `HEAD` probe)
//! - [`capture`] drives a [`docsift_drivers::BrowserSession`] through
//!   navigate, idle-wait, settle and DOM read
//! - [`naming`] derives the file name a captured page is stored under

pub mod capture;
pub mod naming;
pub mod validate;

pub use capture::{BrowserCapturer, CaptureOptions, PageCapture, SessionCapturer, capture_html};
pub use validate::{Scheme, UrlValidator, ValidatedUrl, is_html_content_type, parse_url};
