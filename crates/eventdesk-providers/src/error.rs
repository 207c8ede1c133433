//! Error types for collaborator operations.
//!
//! The event store and the update distributor both report failures as a
//! [`ProviderError`]. Edit sessions only look at the code: `NotFound` is
//! tolerated in some places, everything else is passed up to the caller.

use std::fmt;
use thiserror::Error;

/// The category of a collaborator error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The entity does not exist (any more).
    NotFound,
    /// Network error - connection failed, timeout, offline.
    NetworkError,
    /// The service failed to process the request.
    ServerError,
    /// The user lacks permission for the operation.
    AuthorizationFailed,
    /// Too many requests.
    RateLimited,
    /// The entity was rejected or could not be decoded.
    InvalidData,
    /// Unexpected state in the collaborator.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns a human-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::NetworkError => "network_error",
            Self::ServerError => "server_error",
            Self::AuthorizationFailed => "authorization_failed",
            Self::RateLimited => "rate_limited",
            Self::InvalidData => "invalid_data",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error reported by the event store or the update distributor.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The collaborator that generated this error (e.g., "store", "mail").
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the collaborator name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the collaborator name, if set.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Returns true if the entity did not exist.
    pub fn is_not_found(&self) -> bool {
        self.code == ProviderErrorCode::NotFound
    }

    /// Copies code, message and collaborator name, dropping the source.
    pub fn duplicate(&self) -> Self {
        Self {
            code: self.code,
            message: self.message.clone(),
            provider: self.provider.clone(),
            source: None,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for collaborator operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_detection() {
        assert!(ProviderError::not_found("gone").is_not_found());
        assert!(!ProviderError::network("offline").is_not_found());
    }

    #[test]
    fn provider_error_display() {
        let err = ProviderError::server("mailbox full").with_provider("mail");
        let display = format!("{}", err);
        assert!(display.contains("[mail]"));
        assert!(display.contains("server_error"));
        assert!(display.contains("mailbox full"));
    }

    #[test]
    fn duplicate_drops_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("socket closed");
        let err = ProviderError::network("send failed")
            .with_provider("mail")
            .with_source(io_err);
        assert!(err.source().is_some());

        let copy = err.duplicate();
        assert_eq!(copy.code(), ProviderErrorCode::NetworkError);
        assert_eq!(copy.message(), "send failed");
        assert_eq!(copy.provider(), Some("mail"));
        assert!(copy.source().is_none());
    }
}
