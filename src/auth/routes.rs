/// Authentication Routes
///
/// HTTP handlers for the OAuth flow endpoints, demo issuance, sign-out and
/// session status. Every flow outcome resolves to a redirect the user can
/// act on; nothing here surfaces a raw fault.
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::demo;
use super::flow::{CallbackOutcome, InitiateOutcome, safe_redirect_target};
use super::registry::Capabilities;
use super::session::AuthProvider;
use crate::AppState;

/// Sign-in initiation parameters
#[derive(Debug, Deserialize)]
pub struct SigninParams {
    /// Post-authentication destination, same-origin relative paths only
    next: Option<String>,
}

/// OAuth2 callback parameters
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Authorization code from provider
    code: Option<String>,

    /// CSRF state token
    state: Option<String>,

    /// Error from provider
    error: Option<String>,
}

/// JSON response for demo issuance
#[derive(Debug, Serialize)]
pub struct DemoResponse {
    pub success: bool,
    pub user_id: String,
}

/// JSON response for the status endpoint
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<AuthProvider>,
    pub providers: Capabilities,
}

/// Start the GitHub sign-in or connect flow
async fn signin_github(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SigninParams>,
) -> Response {
    match state.flow.initiate(&headers, params.next.as_deref()) {
        Ok(InitiateOutcome::Provider {
            authorize_url,
            flow_cookie,
        }) => with_cookies(
            Redirect::temporary(&authorize_url).into_response(),
            &[flow_cookie],
        ),
        Ok(InitiateOutcome::DemoFallback { location })
        | Ok(InitiateOutcome::Unavailable { location }) => Redirect::to(&location).into_response(),
        Err(e) => {
            error!("sign-in initiation failed: {}", e);
            Redirect::to("/?error=auth_failed").into_response()
        }
    }
}

/// Handle the provider's callback redirect
async fn callback_github(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let outcome = state
        .flow
        .callback(
            &headers,
            params.code.as_deref(),
            params.state.as_deref(),
            params.error.as_deref(),
        )
        .await;

    match outcome {
        CallbackOutcome::Success {
            location,
            session_cookie,
            clear_flow_cookie,
        } => with_cookies(
            Redirect::to(&location).into_response(),
            &[session_cookie, clear_flow_cookie],
        ),
        CallbackOutcome::Failed {
            location,
            clear_flow_cookie,
        } => with_cookies(
            Redirect::to(&location).into_response(),
            &[clear_flow_cookie],
        ),
    }
}

/// Issue a demo session; gated behind the demo-mode flag
async fn demo_signin(State(state): State<AppState>) -> Response {
    if !state.registry.capabilities().demo {
        return (StatusCode::FORBIDDEN, "Demo mode not enabled").into_response();
    }

    let session = demo::issue_demo_session();

    match state.store.session_cookie(&session) {
        Ok(cookie) => {
            info!(user_id = %session.user.id, "demo session created");
            with_cookies(
                Json(DemoResponse {
                    success: true,
                    user_id: session.user.id,
                })
                .into_response(),
                &[cookie],
            )
        }
        Err(e) => {
            error!("failed to create demo session: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Issue a github-shaped demo session and redirect onward; entry point for
/// the unconfigured-provider fallback and direct demo sign-in
async fn github_demo_signin(
    State(state): State<AppState>,
    Query(params): Query<SigninParams>,
) -> Response {
    let target = safe_redirect_target(params.next.as_deref());
    let session = demo::issue_github_demo_session();

    match state.store.session_cookie(&session) {
        Ok(cookie) => {
            info!(user_id = %session.user.id, "github demo session created");
            with_cookies(Redirect::to(&target).into_response(), &[cookie])
        }
        Err(e) => {
            error!("failed to create github demo session: {}", e);
            Redirect::to("/?error=demo_failed").into_response()
        }
    }
}

/// Sign out: clear the session cookie and redirect
async fn signout(State(state): State<AppState>, Query(params): Query<SigninParams>) -> Response {
    let target = safe_redirect_target(params.next.as_deref());
    with_cookies(
        Redirect::to(&target).into_response(),
        &[state.store.clear_cookie()],
    )
}

/// Report authentication status and the provider capability set
async fn status(State(state): State<AppState>, headers: HeaderMap) -> Json<StatusResponse> {
    let providers = state.registry.capabilities();

    match state.store.read_session(&headers) {
        Some(session) => Json(StatusResponse {
            authenticated: true,
            user_id: Some(session.user.id),
            provider: Some(session.auth_provider),
            providers,
        }),
        None => Json(StatusResponse {
            authenticated: false,
            user_id: None,
            provider: None,
            providers,
        }),
    }
}

/// Append Set-Cookie headers to a response. Values are built by the store
/// and flow modules and are always valid header material.
fn with_cookies(mut response: Response, cookies: &[String]) -> Response {
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Create the authentication router
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/signin/github", get(signin_github))
        .route("/auth/callback/github", get(callback_github))
        .route("/auth/demo", post(demo_signin))
        .route("/auth/github-demo", get(github_demo_signin))
        .route("/auth/signout", get(signout).post(signout))
        .route("/auth/status", get(status))
        .with_state(state)
}
