//! Plugin error types.

use thiserror::Error;

/// Errors that can occur in the plugin system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    /// The check reported a failure.
    #[error("Check failed: {0}")]
    Failed(String),

    /// The check panicked while running.
    #[error("Check panicked: {0}")]
    Panicked(String),

    /// The check produced output the checker cannot use.
    #[error("Invalid check output: {0}")]
    InvalidOutput(String),

    /// The plugin declared parameters the checker cannot supply.
    #[error("Unknown parameters: {}", .0.join(", "))]
    UnknownParameters(Vec<String>),

    /// The plugin definition itself is invalid.
    #[error("Invalid plugin: {0}")]
    InvalidPlugin(String),
}

impl PluginError {
    /// Creates a check failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Creates an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Creates an invalid plugin error.
    pub fn invalid_plugin(message: impl Into<String>) -> Self {
        Self::InvalidPlugin(message.into())
    }
}
