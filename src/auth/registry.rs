// Provider Registry
// Declares which identity providers are usable, derived from present
// configuration. Pure function of the process-wide config; an unconfigured
// provider is categorically unavailable, not a runtime error.

use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;

/// Capability set exposed to the flow controller and the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub github: bool,
    pub platform: bool,
    pub demo: bool,
}

#[derive(Clone)]
pub struct ProviderRegistry {
    config: Arc<Config>,
}

impl ProviderRegistry {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Recomputed per call; configuration is process-lifetime-static so
    /// no caching is needed.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            github: non_empty(self.config.github_client_id.as_deref()),
            platform: non_empty(self.config.platform_client_id.as_deref()),
            demo: self.config.demo_mode,
        }
    }
}

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_configured() {
        let registry = ProviderRegistry::new(Arc::new(Config::default()));
        let caps = registry.capabilities();
        assert!(!caps.github);
        assert!(!caps.platform);
        assert!(!caps.demo);
    }

    #[test]
    fn test_github_requires_client_id() {
        let config = Config {
            github_client_id: Some("client-123".to_string()),
            ..Default::default()
        };
        let registry = ProviderRegistry::new(Arc::new(config));
        assert!(registry.capabilities().github);

        // Empty string is the same as absent
        let config = Config {
            github_client_id: Some(String::new()),
            ..Default::default()
        };
        let registry = ProviderRegistry::new(Arc::new(config));
        assert!(!registry.capabilities().github);
    }

    #[test]
    fn test_demo_follows_flag() {
        let config = Config {
            demo_mode: true,
            ..Default::default()
        };
        let registry = ProviderRegistry::new(Arc::new(config));
        assert!(registry.capabilities().demo);
    }

    #[test]
    fn test_platform_presence() {
        let config = Config {
            platform_client_id: Some("platform-app".to_string()),
            ..Default::default()
        };
        let registry = ProviderRegistry::new(Arc::new(config));
        let caps = registry.capabilities();
        assert!(caps.platform);
        assert!(!caps.github);
    }
}
