//! Error handling and custom error types
//!
//! Provides unified error handling across the bot using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Inference provider error: {0}")]
    Inference(String),

    #[error("Telegram API error (code {code}): {description}")]
    Telegram { code: i64, description: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    /// Full diagnostic text: the error itself followed by every source in its chain.
    pub fn diagnostic(&self) -> String {
        let mut out = format!("{}: {}", self.kind(), self);
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str("\nCaused by: ");
            out.push_str(&cause.to_string());
            source = std::error::Error::source(cause);
        }
        out
    }

    fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "Io",
            Error::Serialization(_) => "Serialization",
            Error::Http(_) => "Http",
            Error::Inference(_) => "Inference",
            Error::Telegram { .. } => "Telegram",
            Error::Config(_) => "Config",
            Error::EnvVar(_) => "EnvVar",
            Error::Generic(_) => "Generic",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
