//! Custom error types for Foreman
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for Foreman operations
#[derive(Error, Debug)]
pub enum ForemanError {
    /// Missing or invalid configuration (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend returned an error or an unusable answer
    #[error("Provider '{provider}' error: {message}")]
    Provider { provider: String, message: String },

    /// Backend could not be reached
    #[error("Provider '{provider}' transport error: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    /// `chat` was called before the provider manager was initialized
    #[error("Model provider manager is not initialized")]
    NotInitialized,

    /// Two provider factories share an id
    #[error("Model provider '{0}' is registered more than once")]
    DuplicateProvider(String),

    /// No stored conversation with this id
    #[error("Conversation '{0}' not found")]
    ConversationNotFound(String),

    /// Channel startup, shutdown or delivery failure
    #[error("Channel error: {0}")]
    Channel(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Foreman operations
pub type Result<T> = std::result::Result<T, ForemanError>;

impl ForemanError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider error
    pub fn provider(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: msg.into(),
        }
    }

    /// Create a transport error for a provider
    pub fn transport(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            provider: provider.into(),
            source,
        }
    }

    /// Create a channel error
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Whether this error came from a model backend
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Transport { .. })
    }

    /// Whether this error is a configuration problem
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::DuplicateProvider(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ForemanError::provider("openrouter", "bad gateway");
        assert_eq!(err.to_string(), "Provider 'openrouter' error: bad gateway");
        assert!(err.is_provider_error());
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_duplicate_is_config_error() {
        let err = ForemanError::DuplicateProvider("ollama".to_string());
        assert!(err.is_config_error());
    }

    #[test]
    fn test_with_context() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = ForemanError::with_context("saving conversation", io);
        assert_eq!(err.to_string(), "saving conversation: disk full");
    }
}
