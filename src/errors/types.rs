use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutoFillError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Browser attach failed: {0}")]
    AttachFailed(String),

    #[error("Browser not connected")]
    BrowserNotConnected,

    #[error("Page creation failed: {0}")]
    PageCreationFailed(String),

    #[error("No active page")]
    NoActivePage,

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Target page not found: {0}")]
    TargetPageNotFound(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Field fill failed: {0}")]
    FieldFillFailed(String),

    #[error("Mapping unavailable: {0}")]
    MappingUnavailable(String),

    #[error("Model request failed: {0}")]
    CompletionFailed(String),

    #[error("Submit failed: {0}")]
    SubmitFailed(String),

    #[error("Invalid session phase for {action}: {phase}")]
    InvalidPhase { action: &'static str, phase: String },

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Chrome error: {0}")]
    ChromeError(String),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, AutoFillError>;

// Convert anyhow::Error to AutoFillError
impl From<anyhow::Error> for AutoFillError {
    fn from(err: anyhow::Error) -> Self {
        AutoFillError::AnyhowError(err.to_string())
    }
}
