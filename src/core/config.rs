use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub browser: BrowserConfig,
    pub ai: AiConfig,
    pub fill: FillConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    /// WebSocket debugger URL of an already-running Chromium. When set the
    /// driver attaches over CDP instead of launching its own browser.
    pub attach_ws_url: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Falls back to the GEMINI_API_KEY environment variable when unset.
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillConfig {
    pub scroll_settle_ms: u64,
    pub clear_settle_ms: u64,
    pub field_pause_ms: u64,
    pub field_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub page_settle_ms: u64,
    pub form_scroll_settle_ms: u64,
    pub post_submit_wait_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser: BrowserConfig::default(),
            ai: AiConfig::default(),
            fill: FillConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
            attach_ws_url: None,
            args: vec![],
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            scroll_settle_ms: 500,
            clear_settle_ms: 200,
            field_pause_ms: 1200,
            field_timeout_ms: 5000,
            poll_interval_ms: 250,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_settle_ms: 5000,
            form_scroll_settle_ms: 2000,
            post_submit_wait_ms: 3000,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
