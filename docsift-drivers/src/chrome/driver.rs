use crate::chrome::args::{build_chrome_arguments, LaunchOptions};
use crate::chrome::page::WebDriverSession;
use crate::session::{BrowserSession, DriverError, SessionFactory};
use async_trait::async_trait;
use fantoccini::ClientBuilder;
use serde_json::json;
use webdriver::capabilities::Capabilities;

/// Opens Chrome sessions through a running WebDriver service.
///
/// Every [`SessionFactory::open`] call starts a new WebDriver session, so a
/// single launcher can serve concurrent captures without them sharing a
/// browser.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    options: LaunchOptions,
}

impl ChromeLauncher {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::new();
        let args = build_chrome_arguments(&self.options);
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        caps.insert("pageLoadStrategy".to_string(), json!("normal"));
        caps
    }

    /// Connect to the WebDriver endpoint and start a session.
    pub async fn connect(&self) -> Result<WebDriverSession, DriverError> {
        tracing::debug!(
            webdriver_url = %self.options.webdriver_url,
            headless = self.options.headless,
            "browser.session.connect"
        );
        let client = ClientBuilder::native()
            .capabilities(self.capabilities())
            .connect(&self.options.webdriver_url)
            .await
            .map_err(|e| DriverError::Session(e.to_string()))?;
        Ok(WebDriverSession::new(client))
    }
}

#[async_trait]
impl SessionFactory for ChromeLauncher {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, DriverError> {
        Ok(Box::new(self.connect().await?))
    }
}
