//! Access-control error types

use thiserror::Error;

/// Errors surfaced by restriction and permission providers
#[derive(Error, Debug)]
pub enum AccessControlError {
    /// No provider declares the restriction at the given path
    #[error("Unsupported restriction (path = {}; name = {name})", display_path(.path))]
    UnsupportedRestriction { path: Option<String>, name: String },

    /// A restriction exists but its value, type or presence is invalid
    #[error("Invalid restriction '{name}' (path = {}): {reason}", display_path(.path))]
    InvalidRestriction {
        path: Option<String>,
        name: String,
        reason: String,
    },

    /// A single provider failed to refresh
    #[error("Provider '{provider}' failed to refresh: {reason}")]
    RefreshFailed { provider: String, reason: String },

    /// Several providers failed to refresh
    #[error("{} permission providers failed to refresh", .0.len())]
    Refresh(Vec<AccessControlError>),

    /// Action string contained unknown actions
    #[error("Unknown actions: {0}")]
    UnknownActions(String),

    /// Privilege name is not registered
    #[error("Unknown privilege: {0}")]
    UnknownPrivilege(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

fn display_path(path: &Option<String>) -> &str {
    path.as_deref().unwrap_or("null")
}

impl AccessControlError {
    /// Create an unsupported-restriction error
    pub fn unsupported_restriction(path: Option<&str>, name: impl Into<String>) -> Self {
        AccessControlError::UnsupportedRestriction {
            path: path.map(str::to_string),
            name: name.into(),
        }
    }

    /// Create an invalid-restriction error
    pub fn invalid_restriction(
        path: Option<&str>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AccessControlError::InvalidRestriction {
            path: path.map(str::to_string),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        AccessControlError::Other(msg.into())
    }
}

/// Result type alias for access-control operations
pub type AccessControlResult<T> = Result<T, AccessControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AccessControlError::unsupported_restriction(Some("/test"), "rep:glob");
        assert_eq!(
            err.to_string(),
            "Unsupported restriction (path = /test; name = rep:glob)"
        );

        let err = AccessControlError::unsupported_restriction(None, "rep:glob");
        assert_eq!(
            err.to_string(),
            "Unsupported restriction (path = null; name = rep:glob)"
        );
    }

    #[test]
    fn test_refresh_error_counts_failures() {
        let err = AccessControlError::Refresh(vec![
            AccessControlError::other("a"),
            AccessControlError::other("b"),
        ]);
        assert_eq!(err.to_string(), "2 permission providers failed to refresh");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AccessControlError = io_err.into();
        assert!(matches!(err, AccessControlError::Io(_)));
    }
}
