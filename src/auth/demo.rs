// Demo Identity Issuer
// Synthesizes session records for trial access without real OAuth, and as
// the automatic fallback when a provider is unconfigured. Demo sessions are
// structurally identical to real ones; only `auth_provider` tells them apart.

use uuid::Uuid;

use super::session::{AuthProvider, Session, SessionUser};

/// Session for the ungated "continue as demo" entry point
pub fn issue_demo_session() -> Session {
    let id = format!("demo_user_{}", random_suffix());

    Session::new(
        AuthProvider::Demo,
        SessionUser {
            id,
            name: "Demo User".to_string(),
            email: Some("demo@example.com".to_string()),
            avatar_url: None,
            username: None,
        },
    )
}

/// Session for the github sign-in fallback; mirrors the shape a real
/// GitHub sign-in would produce
pub fn issue_github_demo_session() -> Session {
    let id = format!("github_demo_{}", random_suffix());
    let avatar_url = format!("https://github.com/identicons/{}.png", id);

    Session::new(
        AuthProvider::GitHub,
        SessionUser {
            id,
            name: "Demo GitHub User".to_string(),
            email: Some("demo@github.example.com".to_string()),
            avatar_url: Some(avatar_url),
            username: Some("demo-github-user".to_string()),
        },
    )
}

fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
