/// Options used to start a Chrome session through chromedriver.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// WebDriver endpoint, e.g. `http://localhost:9515`.
    pub webdriver_url: String,
    pub headless: bool,
    pub window: (u32, u32),
    pub user_agent: Option<String>,
    /// Appended verbatim after the built-in flags.
    pub extra_args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
            window: (1366, 768),
            user_agent: None,
            extra_args: Vec::new(),
        }
    }
}

/// Construct Chrome command-line arguments for a capture session.
pub fn build_chrome_arguments(opts: &LaunchOptions) -> Vec<String> {
    let mut args = vec![
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-extensions".to_string(),
        "--mute-audio".to_string(),
        format!("--window-size={},{}", opts.window.0, opts.window.1),
    ];
    if opts.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    if let Some(ua) = &opts.user_agent {
        args.push(format!("--user-agent={ua}"));
    }
    args.extend(opts.extra_args.iter().cloned());
    args
}
