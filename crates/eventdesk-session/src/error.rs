//! Session error types.

use std::io;

use eventdesk_providers::ProviderError;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that abort a session operation.
///
/// Drafts that fail validation are not errors; see
/// [`SaveOutcome::Rejected`](crate::SaveOutcome::Rejected).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The viewer has no calendar to file the event in.
    #[error("no calendar available")]
    NoCalendars,

    /// The viewer has no mail address to organize or respond with.
    #[error("no mail address available")]
    NoMailAddress,

    /// Persisting or deleting the event failed.
    #[error("store error: {0}")]
    Store(#[source] ProviderError),

    /// The event was persisted but guests could not be notified.
    #[error("notification error: {0}")]
    Notification(#[source] ProviderError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed configuration file.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SessionError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns the underlying collaborator error, if any.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::Store(e) | Self::Notification(e) => Some(e),
            _ => None,
        }
    }
}
