// Process Configuration
// Immutable configuration built once at startup and passed by reference
// into the session codec, cookie store, and provider registry.

use crate::auth::error::AuthError;
use crate::auth::providers::ProviderSettings;

/// Configuration for the authgate server
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    /// Public base URL of this service, used to build OAuth callback URIs
    pub base_url: String,

    /// Secret for session encryption: either a base64-encoded 32-byte key
    /// or a passphrase of at least 32 characters (key is derived)
    pub session_secret: String,

    /// Mark cookies `Secure` (HTTPS-only) - should be true in production
    pub cookie_secure: bool,

    /// Allow ungated demo identity issuance
    pub demo_mode: bool,

    /// GitHub OAuth app credentials; the provider is unavailable without a client id
    pub github_client_id: Option<String>,
    pub github_client_secret: Option<String>,

    /// Platform-native sign-in client id; only its presence is reported here,
    /// the platform login itself is handled outside this service
    pub platform_client_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            base_url: "http://localhost:4000".to_string(),
            session_secret: String::new(), // Must be set explicitly
            cookie_secure: false,          // Development default
            demo_mode: false,
            github_client_id: None,
            github_client_secret: None,
            platform_client_id: None,
        }
    }
}

impl Config {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("AUTHGATE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("AUTHGATE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            base_url: std::env::var("AUTHGATE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4000".to_string()),
            session_secret: std::env::var("AUTHGATE_SESSION_SECRET").unwrap_or_default(),
            cookie_secure: env_flag("AUTHGATE_COOKIE_SECURE"),
            demo_mode: env_flag("AUTHGATE_DEMO_MODE"),
            github_client_id: env_opt("AUTHGATE_GITHUB_CLIENT_ID"),
            github_client_secret: env_opt("AUTHGATE_GITHUB_CLIENT_SECRET"),
            platform_client_id: env_opt("AUTHGATE_PLATFORM_CLIENT_ID"),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.session_secret.is_empty() {
            return Err(AuthError::MissingConfig("session_secret".to_string()));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(AuthError::InvalidConfig {
                key: "base_url".to_string(),
                reason: "must start with http:// or https://".to_string(),
            });
        }

        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// GitHub provider settings, if a client id is configured.
    /// A missing client secret leaves the provider visible but the code
    /// exchange will fail upstream; the flow resolves that like any other
    /// exchange failure.
    pub fn github_settings(&self) -> Option<ProviderSettings> {
        let client_id = self.github_client_id.as_deref().filter(|id| !id.is_empty())?;

        Some(ProviderSettings {
            client_id: client_id.to_string(),
            client_secret: self.github_client_secret.clone().unwrap_or_default(),
            redirect_uri: format!(
                "{}/auth/callback/github",
                self.base_url.trim_end_matches('/')
            ),
            scopes: Vec::new(),
        })
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
