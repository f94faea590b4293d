// src/error.rs

//! Unified error handling for the watcher application.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Upstream fetch or payload parse failure; aborts the current cycle
    #[error("Extraction failed for {context}: {message}")]
    ExtractionFailed { context: String, message: String },

    /// Persisted snapshot missing or unreadable
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Wishlist phrase not present; carries the current entries for the 404 body
    #[error("{title} not found in wish list. Wish list items are: {}.", .entries.join(", "))]
    WishlistNotFound { title: String, entries: Vec<String> },

    /// Notifier transport failure; logged by the engine, never propagated
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scheduler setup error
    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl AppError {
    /// Create an extraction error with context.
    pub fn extraction(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ExtractionFailed {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a delivery error.
    pub fn delivery(message: impl fmt::Display) -> Self {
        Self::DeliveryFailed(message.to_string())
    }

    /// Create a scheduler error.
    pub fn scheduler(message: impl fmt::Display) -> Self {
        Self::Scheduler(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wishlist_not_found_enumerates_entries() {
        let err = AppError::WishlistNotFound {
            title: "ghost".to_string(),
            entries: vec!["dune".to_string(), "the road".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "ghost not found in wish list. Wish list items are: dune, the road."
        );
    }

    #[test]
    fn extraction_error_carries_context() {
        let err = AppError::extraction("available now", "connection refused");
        assert_eq!(
            err.to_string(),
            "Extraction failed for available now: connection refused"
        );
    }
}
