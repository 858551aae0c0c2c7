use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub mod auth;
pub mod config;
pub mod users;

use auth::codec::SessionCodec;
use auth::error::AuthError;
use auth::flow::FlowController;
use auth::providers::IdentityProvider;
use auth::providers::github::GitHubProvider;
use auth::registry::ProviderRegistry;
use auth::store::SessionStore;
use config::Config;
use users::{MemoryUserStore, UserStore};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<SessionStore>,
    pub registry: ProviderRegistry,
    pub flow: Arc<FlowController>,
}

impl AppState {
    /// Build the full application state from configuration, constructing
    /// the GitHub provider when credentials are present
    pub fn new(config: Config) -> Result<Self, AuthError> {
        let provider = match config.github_settings() {
            Some(settings) => {
                Some(Arc::new(GitHubProvider::new(settings)?) as Arc<dyn IdentityProvider>)
            }
            None => None,
        };

        Self::with_provider(config, provider)
    }

    /// Like `new`, but with an explicit provider implementation; used by
    /// tests to run the flow against a stub exchange
    pub fn with_provider(
        config: Config,
        provider: Option<Arc<dyn IdentityProvider>>,
    ) -> Result<Self, AuthError> {
        config.validate()?;

        let codec = SessionCodec::from_secret(&config.session_secret)?;
        let config = Arc::new(config);
        let store = Arc::new(SessionStore::new(codec, config.cookie_secure));
        let registry = ProviderRegistry::new(Arc::clone(&config));
        let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::default());

        let flow = Arc::new(FlowController::new(
            registry.clone(),
            Arc::clone(&store),
            users,
            provider,
        ));

        Ok(Self {
            config,
            store,
            registry,
            flow,
        })
    }
}

/// Assemble the application router
pub fn build_router(state: AppState) -> Router {
    auth::routes::routes(state)
}

/// Start the server, running until it fails or the shutdown signal fires
pub async fn start_server(
    config: Config,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = config.server_addr().parse()?;
    let state = AppState::new(config)?;
    let app = build_router(state);

    info!("authgate listening on {}", addr);

    tokio::select! {
        result = axum_server::bind(addr).serve(app.into_make_service()) => {
            result.map_err(anyhow::Error::from)
        }
        _ = shutdown_rx => {
            info!("shutdown requested, stopping server");
            Ok(())
        }
    }
}
