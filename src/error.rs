//! Structured error types for the Folio engine.
//!
//! Only a handful of failures are fatal: unreadable request JSON, fonts that
//! cannot be embedded, and page state-machine violations. Asset fetch
//! failures and malformed inline markup are recovered locally and never
//! reach this type.

use thiserror::Error;

/// Boxed cause attached to font failures.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The unified error type returned by all public Folio API functions.
#[derive(Debug, Error)]
pub enum FolioError {
    /// JSON input failed to parse as a valid generation request.
    #[error("Failed to parse request: {source}{}", hint_suffix(.hint))]
    ParseError {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// A font could not be loaded, parsed, or embedded.
    #[error("Font error: {message}")]
    FontError {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    /// A page was still open when the document was serialized.
    #[error("Page {index} is still open at serialization time")]
    OpenPage { index: usize },

    /// A page was finalized a second time.
    #[error("Page {index} was already finalized")]
    PageFinalized { index: usize },

    /// Layout or PDF generation failed.
    #[error("Render error: {0}")]
    RenderError(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, FolioError>;

impl FolioError {
    pub fn font(message: impl Into<String>) -> Self {
        FolioError::FontError {
            message: message.into(),
            source: None,
        }
    }

    pub fn font_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        FolioError::FontError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the request schema. Check the report \"type\" tag and field names.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FolioError::ParseError { source: e, hint }
    }
}
