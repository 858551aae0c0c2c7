/// GitHub OAuth2 Provider Implementation
///
/// Authorization-code flow against GitHub: authorize redirect, code-for-token
/// exchange, and profile fetch from the user API.
use super::{ExternalProfile, IdentityProvider, ProviderSettings};
use crate::auth::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";

/// Timeout for the token exchange and profile fetch; a hung provider
/// resolves to a failed flow, never a hung response.
const EXCHANGE_TIMEOUT_SECS: u64 = 10;

/// GitHub OAuth2 token request
#[derive(Debug, Serialize)]
struct GitHubTokenRequest {
    client_id: String,
    client_secret: String,
    code: String,
    redirect_uri: String,
}

/// GitHub OAuth2 token response. GitHub reports errors with a 200 status
/// and an `error` field, so both shapes are decoded from the same body.
#[derive(Debug, Deserialize)]
struct GitHubTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// GitHub user API response
#[derive(Debug, Deserialize)]
struct GitHubUserResponse {
    id: u64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

/// GitHub OAuth2 provider
pub struct GitHubProvider {
    settings: ProviderSettings,
    http_client: reqwest::Client,
}

impl GitHubProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, AuthError> {
        settings.validate()?;

        let mut settings = settings;
        if settings.scopes.is_empty() {
            settings.scopes = vec![
                "repo".to_string(),
                "read:user".to_string(),
                "user:email".to_string(),
            ];
        }

        // GitHub's API rejects requests without a User-Agent
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(EXCHANGE_TIMEOUT_SECS))
            .user_agent("authgate")
            .build()
            .map_err(|e| AuthError::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            settings,
            http_client,
        })
    }
}

#[async_trait]
impl IdentityProvider for GitHubProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        let mut url = url::Url::parse(GITHUB_AUTH_URL).map_err(|e| AuthError::InvalidConfig {
            key: "auth_url".to_string(),
            reason: e.to_string(),
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", &self.settings.redirect_uri)
            .append_pair("scope", &self.settings.scopes.join(","))
            .append_pair("state", state);

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AuthError> {
        let token_request = GitHubTokenRequest {
            client_id: self.settings.client_id.clone(),
            client_secret: self.settings.client_secret.clone(),
            code: code.to_string(),
            redirect_uri: self.settings.redirect_uri.clone(),
        };

        let response = self
            .http_client
            .post(GITHUB_TOKEN_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&token_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AuthError::UpstreamExchange(format!(
                "token request failed with status {}",
                status
            )));
        }

        let token_response: GitHubTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::UpstreamExchange(format!("invalid token response: {}", e)))?;

        let access_token = token_response.access_token.ok_or_else(|| {
            AuthError::UpstreamExchange(
                token_response
                    .error_description
                    .or(token_response.error)
                    .unwrap_or_else(|| "token response carried no access token".to_string()),
            )
        })?;

        let response = self
            .http_client
            .get(GITHUB_USER_URL)
            .bearer_auth(&access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AuthError::UpstreamExchange(format!(
                "user request failed with status {}",
                status
            )));
        }

        let user: GitHubUserResponse = response
            .json()
            .await
            .map_err(|e| AuthError::UpstreamExchange(format!("invalid user response: {}", e)))?;

        Ok(ExternalProfile {
            provider_user_id: user.id.to_string(),
            username: user.login,
            name: user.name,
            email: user.email,
            avatar_url: user.avatar_url,
        })
    }
}
