// Session Record Model
// The authenticated identity snapshot held by a user agent. Sessions are
// immutable once issued; re-authentication mints a new record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity source that produced a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    GitHub,
    Platform,
    Demo,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::GitHub => "github",
            AuthProvider::Platform => "platform",
            AuthProvider::Demo => "demo",
        }
    }
}

/// User identity carried inside a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// Stable unique identifier, namespaced per provider
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// External login name (e.g. the GitHub handle)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Authenticated session, persisted only as an encrypted cookie token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub created: DateTime<Utc>,
    pub auth_provider: AuthProvider,
    pub user: SessionUser,
}

impl Session {
    pub fn new(auth_provider: AuthProvider, user: SessionUser) -> Self {
        Self {
            created: Utc::now(),
            auth_provider,
            user,
        }
    }
}
