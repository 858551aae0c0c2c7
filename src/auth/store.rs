// Session Store Adapter
// Reads the session token from the request cookie and writes it back onto
// responses. Cookie attributes are decided here and nowhere else.

use axum::http::{HeaderMap, header};
use tracing::debug;

use super::codec::SessionCodec;
use super::error::AuthError;
use super::session::Session;

/// Name of the session cookie
pub const SESSION_COOKIE_NAME: &str = "session";

/// Session lifetime: 24 hours from issuance
pub const SESSION_MAX_AGE_SECS: i64 = 24 * 60 * 60;

/// Cookie-backed session persistence
pub struct SessionStore {
    codec: SessionCodec,
    cookie_secure: bool,
}

impl SessionStore {
    pub fn new(codec: SessionCodec, cookie_secure: bool) -> Self {
        Self {
            codec,
            cookie_secure,
        }
    }

    /// Extract and verify the session from a request's cookies.
    /// Any decode failure is treated as "no session", never an error.
    pub fn read_session(&self, headers: &HeaderMap) -> Option<Session> {
        let token = cookie_value(headers, SESSION_COOKIE_NAME)?;

        match self.codec.decode(&token) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!("session cookie rejected: {}", e);
                None
            }
        }
    }

    /// Build the Set-Cookie value persisting a session
    pub fn session_cookie(&self, session: &Session) -> Result<String, AuthError> {
        let token = self.codec.encode(session)?;
        Ok(build_cookie(
            SESSION_COOKIE_NAME,
            &token,
            "/",
            SESSION_MAX_AGE_SECS,
            self.cookie_secure,
        ))
    }

    /// Build the Set-Cookie value clearing the session
    pub fn clear_cookie(&self) -> String {
        build_cookie(SESSION_COOKIE_NAME, "", "/", 0, self.cookie_secure)
    }

    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }
}

/// Find a cookie value in the request's Cookie header
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|cookie| {
                let (cookie_name, value) = cookie.trim().split_once('=')?;
                if cookie_name == name {
                    Some(value.to_string())
                } else {
                    None
                }
            })
        })
}

/// Build a Set-Cookie value with the service-wide attribute policy:
/// HttpOnly always, SameSite=Lax (survives the OAuth redirect round trip
/// without being sent on cross-site subrequests), Secure per configuration.
pub(crate) fn build_cookie(
    name: &str,
    value: &str,
    path: &str,
    max_age_secs: i64,
    secure: bool,
) -> String {
    format!(
        "{}={}; Path={}; HttpOnly; SameSite=Lax; Max-Age={}{}",
        name,
        value,
        path,
        max_age_secs,
        if secure { "; Secure" } else { "" }
    )
}
