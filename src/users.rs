// User Store Collaborator
// External collaborator seam for connect-mode flows: linking an external
// provider identity to an already-authenticated user. The flow controller
// only calls `link_identity`; profile persistence beyond that lives outside
// this service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::auth::error::AuthError;
use crate::auth::providers::ExternalProfile;

/// A provider identity attached to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedIdentity {
    pub provider: String,
    pub provider_user_id: String,
    pub linked_at: DateTime<Utc>,
}

/// User view returned after linking, enough to re-issue a session
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

pub trait UserStore: Send + Sync {
    /// Merge an external identity into the user record for `user_id`,
    /// creating the record if this store has not seen the user before.
    fn link_identity(
        &self,
        user_id: &str,
        profile: &ExternalProfile,
    ) -> Result<LinkedUser, AuthError>;
}

#[derive(Debug, Clone)]
struct UserRecord {
    id: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
    identities: Vec<LinkedIdentity>,
}

/// In-memory user store
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl UserStore for MemoryUserStore {
    fn link_identity(
        &self,
        user_id: &str,
        profile: &ExternalProfile,
    ) -> Result<LinkedUser, AuthError> {
        if user_id.is_empty() {
            return Err(AuthError::Internal(
                "cannot link identity to an empty user id".to_string(),
            ));
        }

        let mut users = self
            .users
            .lock()
            .map_err(|_| AuthError::Internal("user store lock poisoned".to_string()))?;

        let record = users.entry(user_id.to_string()).or_insert_with(|| UserRecord {
            id: user_id.to_string(),
            name: None,
            email: None,
            avatar_url: None,
            identities: Vec::new(),
        });

        // Fill gaps from the external profile; never overwrite existing data
        if record.name.is_none() {
            record.name = profile.name.clone().or_else(|| Some(profile.username.clone()));
        }
        if record.email.is_none() {
            record.email = profile.email.clone();
        }
        if record.avatar_url.is_none() {
            record.avatar_url = profile.avatar_url.clone();
        }

        let already_linked = record.identities.iter().any(|identity| {
            identity.provider == "github" && identity.provider_user_id == profile.provider_user_id
        });

        if !already_linked {
            record.identities.push(LinkedIdentity {
                provider: "github".to_string(),
                provider_user_id: profile.provider_user_id.clone(),
                linked_at: Utc::now(),
            });
            debug!("linked github identity {} to user {}", profile.provider_user_id, user_id);
        }

        Ok(LinkedUser {
            id: record.id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            avatar_url: record.avatar_url.clone(),
        })
    }
}
