use crate::core::{BrowserConfig, BrowserDriver};
use crate::errors::{AutoFillError, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;

/// Chrome backend. Either launches its own browser or attaches over CDP
/// to one that is already running (a desktop shell exposing a debugging
/// port) and locates the target page among the open tabs.
pub struct ChromeBrowser {
    browser: Option<Browser>,
}

impl ChromeBrowser {
    pub fn new() -> Self {
        Self { browser: None }
    }

    fn connected(&self) -> Result<&Browser> {
        self.browser
            .as_ref()
            .ok_or(AutoFillError::BrowserNotConnected)
    }
}

impl Default for ChromeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserDriver for ChromeBrowser {
    type PageHandle = Arc<Tab>;

    async fn launch(&mut self, config: &BrowserConfig) -> Result<()> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );

        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| AutoFillError::LaunchFailed(e.to_string()))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| AutoFillError::LaunchFailed(e.to_string()))?;

        self.browser = Some(browser);
        Ok(())
    }

    async fn attach(&mut self, ws_url: &str) -> Result<()> {
        let browser = Browser::connect(ws_url.to_string())
            .map_err(|e| AutoFillError::AttachFailed(e.to_string()))?;
        self.browser = Some(browser);
        Ok(())
    }

    async fn open_page(&self, url: &str) -> Result<Self::PageHandle> {
        let browser = self.connected()?;

        let tab = browser
            .new_tab()
            .map_err(|e| AutoFillError::PageCreationFailed(e.to_string()))?;

        tab.navigate_to(url)
            .map_err(|e| AutoFillError::NavigationFailed(e.to_string()))?;
        tab.wait_until_navigated()
            .map_err(|e| AutoFillError::NavigationFailed(e.to_string()))?;

        Ok(tab)
    }

    async fn find_page(&self, url_fragment: &str) -> Result<Self::PageHandle> {
        let browser = self.connected()?;

        let tabs = browser
            .get_tabs()
            .lock()
            .map_err(|_| AutoFillError::ChromeError("tab registry poisoned".to_string()))?;

        for tab in tabs.iter() {
            if tab.get_url().contains(url_fragment) {
                return Ok(tab.clone());
            }
        }

        Err(AutoFillError::TargetPageNotFound(url_fragment.to_string()))
    }

    async fn execute_script(&self, page: &Self::PageHandle, script: &str) -> Result<Value> {
        // CDP hands object results back as remote handles without a value;
        // stringify in-page so the data actually crosses the wire
        let wrapped = format!("JSON.stringify({})", script);
        let result = page
            .evaluate(&wrapped, false)
            .map_err(|e| AutoFillError::JavaScriptFailed(e.to_string()))?;

        match result.value {
            Some(Value::String(serialized)) => {
                serde_json::from_str(&serialized).map_err(AutoFillError::from)
            }
            _ => Ok(Value::Null),
        }
    }

    async fn page_url(&self, page: &Self::PageHandle) -> Result<String> {
        Ok(page.get_url())
    }

    async fn page_title(&self, page: &Self::PageHandle) -> Result<String> {
        let result = self.execute_script(page, "document.title").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    fn is_connected(&self) -> bool {
        self.browser.is_some()
    }

    async fn close(&mut self) -> Result<()> {
        self.browser = None;
        Ok(())
    }
}
