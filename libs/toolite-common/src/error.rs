//! Error type shared by the toolite crates

use thiserror::Error;

/// Errors raised by toolite controllers and helpers
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded or saved
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding failed in the named format
    #[error("{format} serialization error: {message}")]
    Serialization {
        format: &'static str,
        message: String,
    },

    /// Argument rejected before any work was done
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No timer runtime to schedule on
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// CSV export failed
    #[error("Export error: {0}")]
    Export(String),

    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::Runtime(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Error::Export(msg.into())
    }

    pub fn serialization(format: &'static str, err: impl std::fmt::Display) -> Self {
        Error::Serialization {
            format,
            message: err.to_string(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Error::Other {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a foreign error under a message
    pub fn other_with_source(
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Error::Other {
            message: message.into(),
            source: Some(source),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization("JSON", err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::serialization("YAML", err)
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::serialization("TOML", err)
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Export(err.to_string())
    }
}
