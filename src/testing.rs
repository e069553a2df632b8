//! Test doubles for driving the pipeline without a live browser or model.

use crate::core::{BrowserConfig, BrowserDriver};
use crate::errors::{AutoFillError, Result};
use crate::mapping::CompletionClient;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

struct MockState {
    html: Mutex<String>,
    script_log: Mutex<Vec<String>>,
    fail_selectors: Vec<String>,
    radio_label_matches: bool,
    radio_group_matches: bool,
    radio_selector_matches: bool,
    select_native_matches: bool,
    next_page_queue: Mutex<Vec<bool>>,
    url: String,
    title: String,
}

/// Browser stand-in that serves a canned HTML snapshot and answers the
/// dispatcher's page scripts by recognizing their shape. Clones share
/// state so a test can keep a handle after moving the mock into a
/// session.
#[derive(Clone)]
pub struct MockBrowser {
    state: Arc<MockState>,
}

impl MockBrowser {
    pub fn new(html: &str) -> Self {
        Self {
            state: Arc::new(MockState {
                html: Mutex::new(html.to_string()),
                script_log: Mutex::new(Vec::new()),
                fail_selectors: Vec::new(),
                radio_label_matches: true,
                radio_group_matches: true,
                radio_selector_matches: true,
                select_native_matches: true,
                next_page_queue: Mutex::new(Vec::new()),
                url: "https://example.com/contact".to_string(),
                title: "Contact".to_string(),
            }),
        }
    }

    pub fn with_fail_selectors(html: &str, fail_selectors: &[&str]) -> Self {
        let mut mock = Self::new(html);
        Arc::get_mut(&mut mock.state)
            .expect("fresh mock")
            .fail_selectors = fail_selectors.iter().map(|s| s.to_string()).collect();
        mock
    }

    pub fn with_radio_tiers(
        html: &str,
        label_matches: bool,
        group_matches: bool,
        selector_matches: bool,
    ) -> Self {
        let mut mock = Self::new(html);
        let state = Arc::get_mut(&mut mock.state).expect("fresh mock");
        state.radio_label_matches = label_matches;
        state.radio_group_matches = group_matches;
        state.radio_selector_matches = selector_matches;
        mock
    }

    pub fn with_select_fallback(html: &str) -> Self {
        let mut mock = Self::new(html);
        Arc::get_mut(&mut mock.state)
            .expect("fresh mock")
            .select_native_matches = false;
        mock
    }

    pub fn set_html(&self, html: &str) {
        *self.state.html.lock().unwrap() = html.to_string();
    }

    /// Answer the next next-page probe with `true` (once), simulating a
    /// paginated flow.
    pub fn queue_next_page(&self) {
        self.state.next_page_queue.lock().unwrap().push(true);
    }

    pub fn scripts(&self) -> Vec<String> {
        self.state.script_log.lock().unwrap().clone()
    }

    pub fn scripts_containing(&self, needle: &str) -> usize {
        self.scripts().iter().filter(|s| s.contains(needle)).count()
    }
}

#[async_trait]
impl BrowserDriver for MockBrowser {
    type PageHandle = ();

    async fn launch(&mut self, _config: &BrowserConfig) -> Result<()> {
        Ok(())
    }

    async fn attach(&mut self, _ws_url: &str) -> Result<()> {
        Ok(())
    }

    async fn open_page(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    async fn find_page(&self, url_fragment: &str) -> Result<()> {
        if self.state.url.contains(url_fragment) {
            Ok(())
        } else {
            Err(AutoFillError::TargetPageNotFound(url_fragment.to_string()))
        }
    }

    async fn execute_script(&self, _page: &(), script: &str) -> Result<Value> {
        self.state
            .script_log
            .lock()
            .unwrap()
            .push(script.to_string());

        if script.contains("documentElement.outerHTML") {
            return Ok(Value::String(self.state.html.lock().unwrap().clone()));
        }

        if self
            .state
            .fail_selectors
            .iter()
            .any(|sel| script.contains(sel.as_str()))
        {
            return Ok(json!({ "ok": false, "error": "element not found" }));
        }

        if script.contains("tier: 'label'") {
            return Ok(json!({ "ok": self.state.radio_label_matches }));
        }
        if script.contains("tier: 'group'") {
            return Ok(json!({ "ok": self.state.radio_group_matches }));
        }
        if script.contains("tier: 'selector'") {
            return Ok(json!({ "ok": self.state.radio_selector_matches }));
        }
        if script.contains("el.options") {
            return Ok(json!({ "ok": self.state.select_native_matches }));
        }
        if script.contains("next:") {
            let next = self.state.next_page_queue.lock().unwrap().pop().unwrap_or(false);
            return Ok(json!({ "ok": true, "next": next }));
        }

        Ok(json!({ "ok": true }))
    }

    async fn page_url(&self, _page: &()) -> Result<String> {
        Ok(self.state.url.clone())
    }

    async fn page_title(&self, _page: &()) -> Result<String> {
        Ok(self.state.title.clone())
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Completion client that always answers with the same canned reply.
pub struct StaticCompletion {
    reply: String,
}

impl StaticCompletion {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl CompletionClient for StaticCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.reply.clone())
    }
}

/// Zeroed waits so pipeline tests run instantly.
pub fn fast_config() -> crate::core::Config {
    let mut config = crate::core::Config::default();
    config.fill.scroll_settle_ms = 0;
    config.fill.clear_settle_ms = 0;
    config.fill.field_pause_ms = 0;
    config.fill.field_timeout_ms = 0;
    config.fill.poll_interval_ms = 0;
    config.session.page_settle_ms = 0;
    config.session.form_scroll_settle_ms = 0;
    config.session.post_submit_wait_ms = 0;
    config
}
