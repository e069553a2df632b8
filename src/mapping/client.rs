use crate::core::AiConfig;
use crate::errors::{AutoFillError, Result};
use async_trait::async_trait;
use serde_json::json;

/// One text-completion call: a single prompt string in, a single text
/// reply out. No streaming, no multi-turn state.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Gemini generateContent client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                AutoFillError::ConfigurationError(
                    "no Gemini API key: set ai.api_key or GEMINI_API_KEY".to_string(),
                )
            })?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        let payload: serde_json::Value = response.json().await?;

        if !status.is_success() {
            let detail = payload["error"]["message"]
                .as_str()
                .unwrap_or("unknown API error");
            return Err(AutoFillError::CompletionFailed(format!(
                "{}: {}",
                status, detail
            )));
        }

        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                AutoFillError::CompletionFailed("no text candidate in model reply".to_string())
            })
    }
}
