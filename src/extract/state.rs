use crate::core::BrowserDriver;
use crate::errors::Result;
use crate::extract::{extract_fields, FieldDescriptor, FieldKind};
use serde::{Deserialize, Serialize};

/// One extraction pass over a form page. Superseded wholesale by the next
/// pass; descriptors are never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionPass {
    pub url: String,
    pub title: String,
    pub descriptors: Vec<FieldDescriptor>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ExtractionPass {
    pub fn new(url: String, title: String, descriptors: Vec<FieldDescriptor>) -> Self {
        Self {
            url,
            title,
            descriptors,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn field_count(&self) -> usize {
        self.descriptors.len()
    }

    pub fn find_by_index(&self, index: usize) -> Option<&FieldDescriptor> {
        self.descriptors.iter().find(|d| d.index == index)
    }

    pub fn find_by_kind(&self, kind: FieldKind) -> Vec<&FieldDescriptor> {
        self.descriptors.iter().filter(|d| d.kind == kind).collect()
    }
}

/// Capture the page HTML and derive a fresh extraction pass from it.
pub async fn snapshot_page<B: BrowserDriver>(
    browser: &B,
    page: &B::PageHandle,
) -> Result<ExtractionPass> {
    let url = browser.page_url(page).await?;
    let title = browser.page_title(page).await?;
    let html = browser.page_html(page).await?;
    Ok(ExtractionPass::new(url, title, extract_fields(&html)))
}
