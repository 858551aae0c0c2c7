// OAuth Flow Controller
// Drives the authorization-code flow across its three phases: initiate,
// callback, and fallback-to-demo. All flow state lives in one encrypted,
// short-lived cookie; a callback consumes it regardless of outcome.

use axum::http::HeaderMap;
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use super::error::AuthError;
use super::providers::{ExternalProfile, IdentityProvider};
use super::registry::ProviderRegistry;
use super::session::{AuthProvider, Session, SessionUser};
use super::store::{self, SessionStore};
use crate::users::{LinkedUser, UserStore};

/// Name of the transient flow-state cookie
pub const FLOW_COOKIE_NAME: &str = "github_auth_flow";

/// Flow cookies are scoped to the auth routes only
pub const FLOW_COOKIE_PATH: &str = "/auth";

/// Flow state lives for 10 minutes; an abandoned flow self-expires
pub const FLOW_MAX_AGE_SECS: i64 = 600;

const ERROR_STATE_MISMATCH: &str = "/?error=auth_state_mismatch";
const ERROR_AUTH_FAILED: &str = "/?error=auth_failed";

/// Whether a flow authenticates a new session or links the provider to an
/// already-authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FlowMode {
    Signin,
    Connect {
        #[serde(
            rename = "connectingUserId",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        connecting_user_id: Option<String>,
    },
}

/// Transient state bridging initiate and callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowState {
    /// Single-use CSRF token
    pub state: String,

    /// Same-origin destination after the flow completes
    pub redirect_to: String,

    pub mode: FlowMode,

    /// Server-side TTL check, independent of the cookie Max-Age
    pub issued_at: DateTime<Utc>,
}

/// Result of the initiate phase; always resolves to a redirect
#[derive(Debug)]
pub enum InitiateOutcome {
    /// Send the user to the provider's authorization endpoint
    Provider {
        authorize_url: String,
        flow_cookie: String,
    },
    /// Provider unconfigured for a sign-in: continue at the demo issuer
    DemoFallback { location: String },
    /// Provider unconfigured for a connect: nothing to link against
    Unavailable { location: String },
}

/// Result of the callback phase; always resolves to a redirect, and the
/// flow cookie is cleared either way
#[derive(Debug)]
pub enum CallbackOutcome {
    Success {
        location: String,
        session_cookie: String,
        clear_flow_cookie: String,
    },
    Failed {
        location: String,
        clear_flow_cookie: String,
    },
}

pub struct FlowController {
    registry: ProviderRegistry,
    store: Arc<SessionStore>,
    users: Arc<dyn UserStore>,
    provider: Option<Arc<dyn IdentityProvider>>,
}

impl FlowController {
    pub fn new(
        registry: ProviderRegistry,
        store: Arc<SessionStore>,
        users: Arc<dyn UserStore>,
        provider: Option<Arc<dyn IdentityProvider>>,
    ) -> Self {
        Self {
            registry,
            store,
            users,
            provider,
        }
    }

    /// Begin a sign-in or connect flow.
    ///
    /// The mode is resolved from the caller's current session: a valid
    /// session makes this a connect flow for that user, otherwise a plain
    /// sign-in. With no provider configured, sign-in falls back to the demo
    /// issuer and connect reports the provider unavailable.
    pub fn initiate(
        &self,
        headers: &HeaderMap,
        next: Option<&str>,
    ) -> Result<InitiateOutcome, AuthError> {
        let mut redirect_to = safe_redirect_target(next);

        let mode = match self.store.read_session(headers) {
            Some(session) => FlowMode::Connect {
                connecting_user_id: Some(session.user.id),
            },
            None => FlowMode::Signin,
        };

        if !self.registry.capabilities().github {
            return Ok(match mode {
                FlowMode::Signin => {
                    info!("github not configured, redirecting to demo sign-in");
                    InitiateOutcome::DemoFallback {
                        location: format!(
                            "/auth/github-demo?next={}",
                            urlencoding::encode(&redirect_to)
                        ),
                    }
                }
                FlowMode::Connect { .. } => {
                    warn!("github not configured, cannot connect account");
                    InitiateOutcome::Unavailable {
                        location: append_query(&redirect_to, "error=provider_unavailable"),
                    }
                }
            });
        }

        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| AuthError::ProviderUnavailable("github".to_string()))?;

        // Let the landing page show a "connected" hint after the round trip
        if matches!(mode, FlowMode::Connect { .. }) {
            redirect_to = append_query(&redirect_to, "github_connected=true");
        }

        let state = generate_state();
        let flow = FlowState {
            state: state.clone(),
            redirect_to,
            mode,
            issued_at: Utc::now(),
        };

        let authorize_url = provider.authorization_url(&state)?;
        let flow_cookie = self.flow_cookie(&flow)?;

        info!(provider = provider.name(), "oauth flow initiated");

        Ok(InitiateOutcome::Provider {
            authorize_url,
            flow_cookie,
        })
    }

    /// Complete a flow from the provider's callback redirect.
    ///
    /// The stored flow state is consumed no matter what happens; a replayed
    /// callback finds no state and fails. No session is ever written unless
    /// the state matches exactly and the exchange succeeds.
    pub async fn callback(
        &self,
        headers: &HeaderMap,
        code: Option<&str>,
        state: Option<&str>,
        provider_error: Option<&str>,
    ) -> CallbackOutcome {
        let flow = match self.read_flow(headers) {
            Some(flow) => flow,
            None => return failed(&AuthError::StateExpired, ERROR_STATE_MISMATCH),
        };

        let presented = match state {
            Some(state) if !state.is_empty() => state,
            _ => return failed(&AuthError::StateMismatch, ERROR_STATE_MISMATCH),
        };

        if !state_matches(presented, &flow.state) {
            return failed(&AuthError::StateMismatch, ERROR_STATE_MISMATCH);
        }

        if Utc::now() - flow.issued_at > Duration::seconds(FLOW_MAX_AGE_SECS) {
            return failed(&AuthError::StateExpired, ERROR_STATE_MISMATCH);
        }

        if let Some(error) = provider_error {
            return failed(
                &AuthError::UpstreamExchange(format!("provider returned error: {}", error)),
                ERROR_AUTH_FAILED,
            );
        }

        let code = match code {
            Some(code) if !code.is_empty() => code,
            _ => {
                return failed(
                    &AuthError::UpstreamExchange("callback carried no code".to_string()),
                    ERROR_AUTH_FAILED,
                );
            }
        };

        let provider = match self.provider.as_ref() {
            Some(provider) => provider,
            None => {
                return failed(
                    &AuthError::ProviderUnavailable("github".to_string()),
                    ERROR_AUTH_FAILED,
                );
            }
        };

        let profile = match provider.exchange_code(code).await {
            Ok(profile) => profile,
            Err(e) => return failed(&e, ERROR_AUTH_FAILED),
        };

        let session = match flow.mode {
            FlowMode::Connect {
                connecting_user_id: Some(user_id),
            } if !user_id.is_empty() => match self.users.link_identity(&user_id, &profile) {
                Ok(linked) => connect_session(&linked, &profile),
                Err(e) => return failed(&e, ERROR_AUTH_FAILED),
            },
            FlowMode::Connect { .. } => {
                // Session expired mid-flow; the external identity still
                // deserves a session
                warn!("connect flow lost its user, issuing a fresh sign-in session");
                signin_session(&profile)
            }
            FlowMode::Signin => signin_session(&profile),
        };

        let session_cookie = match self.store.session_cookie(&session) {
            Ok(cookie) => cookie,
            Err(e) => return failed(&e, ERROR_AUTH_FAILED),
        };

        info!(user_id = %session.user.id, "github sign-in completed");

        CallbackOutcome::Success {
            location: flow.redirect_to,
            session_cookie,
            clear_flow_cookie: clear_flow_cookie(),
        }
    }

    fn flow_cookie(&self, flow: &FlowState) -> Result<String, AuthError> {
        let token = self.store.codec().seal(flow)?;
        Ok(store::build_cookie(
            FLOW_COOKIE_NAME,
            &token,
            FLOW_COOKIE_PATH,
            FLOW_MAX_AGE_SECS,
            self.store.cookie_secure(),
        ))
    }

    fn read_flow(&self, headers: &HeaderMap) -> Option<FlowState> {
        let token = store::cookie_value(headers, FLOW_COOKIE_NAME)?;
        self.store.codec().open(&token).ok()
    }
}

fn failed(error: &AuthError, location: &str) -> CallbackOutcome {
    warn!(status = error.status_code(), "oauth callback failed: {}", error);
    CallbackOutcome::Failed {
        location: location.to_string(),
        clear_flow_cookie: clear_flow_cookie(),
    }
}

pub(crate) fn clear_flow_cookie() -> String {
    store::build_cookie(FLOW_COOKIE_NAME, "", FLOW_COOKIE_PATH, 0, false)
}

/// Fresh unguessable state token
fn generate_state() -> String {
    let random_bytes: [u8; 32] = rand::random();
    general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
}

fn state_matches(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}

/// Constrain a post-authentication destination to same-origin relative
/// paths. Absolute URLs, protocol-relative paths and backslash variants
/// all collapse to the default.
pub fn safe_redirect_target(next: Option<&str>) -> String {
    const DEFAULT: &str = "/";

    let Some(next) = next else {
        return DEFAULT.to_string();
    };

    let bytes = next.as_bytes();
    if bytes.first() != Some(&b'/') {
        return DEFAULT.to_string();
    }
    if matches!(bytes.get(1), Some(b'/') | Some(b'\\')) {
        return DEFAULT.to_string();
    }

    next.to_string()
}

fn append_query(path: &str, param: &str) -> String {
    if path.contains('?') {
        format!("{}&{}", path, param)
    } else {
        format!("{}?{}", path, param)
    }
}

fn signin_session(profile: &ExternalProfile) -> Session {
    Session::new(
        AuthProvider::GitHub,
        SessionUser {
            id: format!("github_{}", profile.provider_user_id),
            name: profile
                .name
                .clone()
                .unwrap_or_else(|| profile.username.clone()),
            email: profile.email.clone(),
            avatar_url: profile.avatar_url.clone(),
            username: Some(profile.username.clone()),
        },
    )
}

fn connect_session(user: &LinkedUser, profile: &ExternalProfile) -> Session {
    Session::new(
        AuthProvider::GitHub,
        SessionUser {
            id: user.id.clone(),
            name: user
                .name
                .clone()
                .unwrap_or_else(|| profile.username.clone()),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            username: Some(profile.username.clone()),
        },
    )
}
