/// Identity provider implementations
///
/// The external-exchange collaborator of the OAuth flow: building the
/// authorization URL and exchanging a callback code for an external
/// profile. Kept behind a trait so the flow controller can be exercised
/// without network access.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::AuthError;

pub mod github;

/// Profile resolved from an external provider after a successful exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalProfile {
    /// Unique user identifier at the provider
    pub provider_user_id: String,

    /// Login name at the provider
    pub username: String,

    /// Display name, if the provider exposes one
    pub name: Option<String>,

    /// Email address, if public
    pub email: Option<String>,

    /// Profile picture URL
    pub avatar_url: Option<String>,
}

/// Configuration for a single OAuth2 provider
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// OAuth2 client ID
    pub client_id: String,

    /// OAuth2 client secret
    pub client_secret: String,

    /// Callback URI registered with the provider
    pub redirect_uri: String,

    /// Scopes to request; empty means the provider's defaults
    pub scopes: Vec<String>,
}

impl ProviderSettings {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.client_id.is_empty() {
            return Err(AuthError::InvalidConfig {
                key: "client_id".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if self.redirect_uri.is_empty() {
            return Err(AuthError::InvalidConfig {
                key: "redirect_uri".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        url::Url::parse(&self.redirect_uri).map_err(|e| AuthError::InvalidConfig {
            key: "redirect_uri".to_string(),
            reason: format!("not a valid URL: {}", e),
        })?;

        Ok(())
    }
}

/// Seam between the flow controller and an external OAuth2 provider.
///
/// `exchange_code` covers the whole server-side leg of the callback:
/// code-for-token exchange plus profile fetch, returned as an explicit
/// result rather than surfacing transport errors to the flow.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider name used in logs and identity namespacing
    fn name(&self) -> &'static str;

    /// Authorization endpoint URL carrying the standard
    /// authorization-code parameters and the given CSRF state
    fn authorization_url(&self, state: &str) -> Result<String, AuthError>;

    /// Exchange the callback code for the external profile
    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> ProviderSettings {
        ProviderSettings {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            redirect_uri: "https://example.com/auth/callback/github".to_string(),
            scopes: vec![],
        }
    }

    #[test]
    fn test_settings_validation() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_settings_empty_client_id() {
        let settings = ProviderSettings {
            client_id: String::new(),
            ..valid_settings()
        };
        assert!(matches!(
            settings.validate(),
            Err(AuthError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_settings_invalid_redirect_uri() {
        let settings = ProviderSettings {
            redirect_uri: "not-a-url".to_string(),
            ..valid_settings()
        };
        assert!(settings.validate().is_err());
    }
}
