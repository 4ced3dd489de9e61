//! Error types for the conversational pipeline
//!
//! This module defines strongly-typed errors for prompt loading, template
//! rendering and text generation, using thiserror for automatic error trait
//! implementations.

use thiserror::Error;

/// Main error type for the chat pipeline
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChatError {
    /// Prompt resource or model files missing or malformed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Model or tokenizer unavailable, or the generation call failed
    #[error("Generation error: {message}")]
    Generation { message: String },

    /// A template was rendered without binding every placeholder
    #[error("Missing variable '{name}' while rendering template '{template}'")]
    MissingVariable { name: String, template: String },

    /// Generation input violated its constraints
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl ChatError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation { message: message.into() }
    }

    /// Create a missing variable error
    pub fn missing_variable(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self::MissingVariable { name: name.into(), template: template.into() }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }
}

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        Self::Configuration { message: err.to_string() }
    }
}

impl From<serde_yaml::Error> for ChatError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Configuration { message: err.to_string() }
    }
}

impl From<toml::de::Error> for ChatError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration { message: err.to_string() }
    }
}

impl From<candle_core::Error> for ChatError {
    fn from(err: candle_core::Error) -> Self {
        Self::Generation { message: err.to_string() }
    }
}
