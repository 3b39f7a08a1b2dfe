//! Chrome over WebDriver, backed by `fantoccini`.
pub mod args;
pub mod driver;
pub mod page;
