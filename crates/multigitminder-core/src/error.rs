//! Error types for multigitminder

use thiserror::Error;

/// A required action input that was absent or empty.
///
/// This is the soft failure class: the run stops before any client is
/// built, and the caller decides which exit code that deserves. The
/// `Display` text is the message shown in the CI log.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInput {
    #[error("Error: Beeminder user name required")]
    Username,

    #[error("Error: Beeminder auth token not found")]
    AuthToken,

    #[error("Error: Goal name not found.")]
    Goal,

    #[error("Error: Data value not found.")]
    Value,
}

/// Hard input failures. Raised after the required inputs are present.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("commit reference is absent (GITHUB_REF not set)")]
    MissingRef,

    #[error("repo languages is absent")]
    RepoLanguagesAbsent,

    #[error("repo languages is empty")]
    RepoLanguagesEmpty,

    #[error("repo languages is not a JSON object of byte counts: {0}")]
    InvalidRepoLanguages(String),

    #[error("target languages not found in repository language list")]
    NoLanguageMatch,
}

/// Failures reported by the goal-tracking service or its transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Goal or user does not exist (404).
    #[error("goal not found: {0}")]
    NotFound(String),

    /// Bad or missing auth token (401/403).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Too many requests (429).
    #[error("rate limited (retry after {retry_after:?}s): {message}")]
    RateLimited {
        message: String,
        retry_after: Option<u64>,
    },

    /// The service refused the payload (400/422).
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Server-side failure (5xx).
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Connection, TLS or timeout failure.
    #[error("network error: {0}")]
    Network(String),

    /// Response body could not be parsed.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The configured API root cannot have path segments appended.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

/// Hard failure of a run: either bad configuration or a service error.
#[derive(Error, Debug)]
pub enum MinderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Result type for multigitminder operations
pub type Result<T> = std::result::Result<T, MinderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_messages() {
        assert_eq!(
            MissingInput::Username.to_string(),
            "Error: Beeminder user name required"
        );
        assert_eq!(
            MissingInput::AuthToken.to_string(),
            "Error: Beeminder auth token not found"
        );
        assert_eq!(MissingInput::Goal.to_string(), "Error: Goal name not found.");
        assert_eq!(MissingInput::Value.to_string(), "Error: Data value not found.");
    }

    #[test]
    fn test_minder_error_is_transparent() {
        let err: MinderError = ConfigError::NoLanguageMatch.into();
        assert_eq!(
            err.to_string(),
            "target languages not found in repository language list"
        );

        let err: MinderError = ClientError::NotFound("pushups".to_string()).into();
        assert!(matches!(err, MinderError::Client(ClientError::NotFound(_))));
    }
}
