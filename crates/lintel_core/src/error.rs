//! Core error types.

use lintel_plugin::PluginError;
use thiserror::Error;

/// Errors that can occur while running checks.
///
/// `PluginExecution` and `UnknownParameters` abort a single file and are
/// carried on its [`FileReport`](crate::FileReport). Every other variant is
/// fatal to the run.
#[derive(Debug, Error)]
pub enum LintelError {
    /// A plugin failed while checking a file.
    #[error("{plugin} failed while checking \"{filename}\": {source}")]
    PluginExecution {
        plugin: String,
        filename: String,
        #[source]
        source: PluginError,
    },

    /// A plugin requested parameters the checker cannot supply.
    #[error(
        "{plugin} requested unknown parameters while checking \"{filename}\": {}",
        .parameters.join(", ")
    )]
    UnknownParameters {
        plugin: String,
        filename: String,
        parameters: Vec<String>,
    },

    /// The user interrupted the run.
    #[error("Early quit while running checks")]
    EarlyQuit,

    /// A plugin could not be loaded.
    #[error("Failed to load plugin {plugin}: {source}")]
    PluginLoad {
        plugin: String,
        #[source]
        source: PluginError,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested worker count is neither `auto` nor a positive integer.
    #[error("Invalid jobs value '{0}': expected 'auto' or a positive integer")]
    InvalidJobs(String),
}

impl LintelError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a plugin execution error.
    pub fn plugin_execution(
        plugin: impl Into<String>,
        filename: impl Into<String>,
        source: PluginError,
    ) -> Self {
        match source {
            PluginError::UnknownParameters(parameters) => Self::UnknownParameters {
                plugin: plugin.into(),
                filename: filename.into(),
                parameters,
            },
            source => Self::PluginExecution {
                plugin: plugin.into(),
                filename: filename.into(),
                source,
            },
        }
    }

    /// Returns true for errors that abort a single file rather than the run.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::PluginExecution { .. } | Self::UnknownParameters { .. }
        )
    }
}
