//! Error kinds raised while talking to the mail provider and unsubscribe endpoints.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The mail provider answered with a non-success status.
    #[error("provider error ({status}) during {operation}: {body}")]
    Provider {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },
    /// Transport failure (connect, timeout, TLS, body read).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Malformed message content.
    #[error("decode error: {0}")]
    Decode(String),
    #[error("authentication error: {0}")]
    Auth(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
