//! Error types for the voice relay

use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running the relay
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Persona could not be loaded
    #[error("persona error: {0}")]
    Persona(String),

    /// HTTP server error (bind, serve)
    #[error("server error: {0}")]
    Server(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing error
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}
