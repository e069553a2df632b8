use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Seam between the pipeline and a concrete browser backend. The pipeline
/// only ever needs a page handle, script execution, and an HTML snapshot;
/// everything else (extraction, detection) happens off-line over the
/// snapshot.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    type PageHandle: Send + Sync;

    /// Launch a new browser instance
    async fn launch(&mut self, config: &crate::core::BrowserConfig) -> Result<()>;

    /// Attach to an already-running browser over CDP
    async fn attach(&mut self, ws_url: &str) -> Result<()>;

    /// Open a new page and navigate it to a URL
    async fn open_page(&self, url: &str) -> Result<Self::PageHandle>;

    /// Locate an already-open page whose URL contains the fragment
    async fn find_page(&self, url_fragment: &str) -> Result<Self::PageHandle>;

    /// Execute JavaScript in the page
    async fn execute_script(&self, page: &Self::PageHandle, script: &str) -> Result<Value>;

    /// Get current page URL
    async fn page_url(&self, page: &Self::PageHandle) -> Result<String>;

    /// Get page title
    async fn page_title(&self, page: &Self::PageHandle) -> Result<String>;

    /// Capture the full document HTML
    async fn page_html(&self, page: &Self::PageHandle) -> Result<String> {
        let value = self
            .execute_script(page, "document.documentElement.outerHTML")
            .await?;
        Ok(value.as_str().unwrap_or("").to_string())
    }

    /// Check if browser is still connected
    fn is_connected(&self) -> bool;

    /// Close the browser / detach
    async fn close(&mut self) -> Result<()>;
}
