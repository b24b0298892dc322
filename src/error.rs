use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Browser launch failed: {0}")]
    LaunchError(String),

    #[error("Navigation failed: {0}")]
    NavigationError(String),

    #[error("Element is detached: {0}")]
    Detached(String),

    #[error("Element is not interactable: {0}")]
    NotInteractable(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("JavaScript error: {0}")]
    JsError(String),

    #[error("No option matches '{value}'")]
    NoMatchingOption { value: String },

    #[error("Every fill strategy failed for {field}")]
    Exhausted { field: String },

    #[error("Invalid fill plan: {0}")]
    Plan(String),

    #[error("CDP error: {0}")]
    CdpError(#[from] chromiumoxide::error::CdpError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Failures caused by the page moving under us. A fallback ladder treats
    /// these as "try the next tier", never as a reason to stop.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Detached(_)
                | Error::NotInteractable(_)
                | Error::Timeout(_)
                | Error::JsError(_)
                | Error::CdpError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
