// Authentication Error Types
// Error taxonomy for the OAuth flow, session codec, and configuration

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    // Provider availability
    #[error("provider not configured: {0}")]
    ProviderUnavailable(String),

    // OAuth flow errors
    #[error("OAuth state parameter mismatch")]
    StateMismatch,

    #[error("OAuth flow state missing or expired")]
    StateExpired,

    #[error("code exchange failed: {0}")]
    UpstreamExchange(String),

    #[error("provider communication timeout")]
    Timeout,

    // Session errors
    #[error("invalid session token")]
    InvalidSessionToken,

    #[error("encryption error: {0}")]
    Crypto(String),

    // Configuration errors
    #[error("missing required configuration: {0}")]
    MissingConfig(String),

    #[error("invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    // General errors
    #[error("JSON error: {0}")]
    Json(String),

    #[error("internal authentication error: {0}")]
    Internal(String),
}

// Conversion from reqwest errors
impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Timeout
        } else {
            AuthError::UpstreamExchange(err.to_string())
        }
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Json(err.to_string())
    }
}

// HTTP status code mapping, for logging and operability
impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidSessionToken => 401,

            AuthError::StateMismatch | AuthError::StateExpired => 400,

            AuthError::ProviderUnavailable(_) => 503,

            AuthError::UpstreamExchange(_) => 502,

            AuthError::Timeout => 504,

            AuthError::Crypto(_)
            | AuthError::MissingConfig(_)
            | AuthError::InvalidConfig { .. }
            | AuthError::Json(_)
            | AuthError::Internal(_) => 500,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Timeout | AuthError::UpstreamExchange(_))
    }
}
