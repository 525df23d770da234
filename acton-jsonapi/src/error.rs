//! Setup-time error types
//!
//! Errors raised while a service is being assembled (loading configuration,
//! installing the tracing subscriber, registering routes). Request-time
//! failures use [`ApiError`](crate::handlers::ApiError) instead, which maps
//! directly onto an HTTP response.

use thiserror::Error;

/// Result type alias using the crate's setup error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a JSON:API service
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or extracted
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// The tracing subscriber could not be installed
    #[error("Tracing initialization failed: {0}")]
    Tracing(String),

    /// A resource or route description is invalid
    #[error("Invalid resource definition: {0}")]
    InvalidResource(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}
