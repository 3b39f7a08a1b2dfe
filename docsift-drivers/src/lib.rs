//! Driver layer for browser automation.
//!
//! The capture pipeline only depends on the capability traits in
//! [`session`]; the Chrome/WebDriver backing lives in [`chrome`].
//!
//! - [`session::BrowserSession`]: navigate, wait for network idle, read the DOM, close
//! - [`session::SessionFactory`]: one fresh session per capture
//! - [`chrome::driver::ChromeLauncher`]: `fantoccini` client against chromedriver
//! - [`chrome::page::WebDriverSession`]: the page handle it returns
pub mod chrome;
pub mod session;

pub use chrome::args::LaunchOptions;
pub use chrome::driver::ChromeLauncher;
pub use session::{BrowserSession, DriverError, IdlePolicy, NetworkSample, SessionFactory};
