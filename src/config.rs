use std::net::{IpAddr, Ipv4Addr};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_address: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Base URL of the player-state persistence service, if any
    pub state_api_url: Option<String>,
    /// Analytics settings
    pub analytics: AnalyticsConfig,
}

/// Analytics sink configuration
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    pub game_key: String,
    pub secret_key: String,
    pub base_url: String,
    pub build: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            state_api_url: None,
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            game_key: String::new(),
            secret_key: String::new(),
            base_url: "https://sandbox-api.gameanalytics.com".to_string(),
            build: None,
        }
    }
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("BIND_ADDRESS") {
            if let Ok(parsed) = addr.parse() {
                config.bind_address = parsed;
            } else {
                tracing::warn!("Invalid BIND_ADDRESS '{}', using default", addr);
            }
        }

        if let Ok(port) = std::env::var("PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                if parsed > 0 {
                    config.port = parsed;
                } else {
                    tracing::warn!("PORT must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid PORT '{}', using default", port);
            }
        }

        if let Ok(url) = std::env::var("PLAYER_STATE_URL") {
            if !url.trim().is_empty() {
                config.state_api_url = Some(url.trim_end_matches('/').to_string());
            }
        }

        if let Ok(enabled) = std::env::var("ANALYTICS_ENABLED") {
            config.analytics.enabled = matches!(enabled.as_str(), "1" | "true" | "yes");
        }
        if let Ok(key) = std::env::var("ANALYTICS_GAME_KEY") {
            config.analytics.game_key = key;
        }
        if let Ok(key) = std::env::var("ANALYTICS_SECRET_KEY") {
            config.analytics.secret_key = key;
        }
        if let Ok(url) = std::env::var("ANALYTICS_BASE_URL") {
            if !url.trim().is_empty() {
                config.analytics.base_url = url.trim_end_matches('/').to_string();
            }
        }
        if let Ok(build) = std::env::var("ANALYTICS_BUILD") {
            if !build.trim().is_empty() {
                config.analytics.build = Some(build);
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0".to_string());
        }
        if self.analytics.enabled
            && (self.analytics.game_key.is_empty() || self.analytics.secret_key.is_empty())
        {
            return Err("Analytics enabled without game/secret keys".to_string());
        }
        Ok(())
    }
}

impl AnalyticsConfig {
    /// Events are shipped only when enabled with both keys present.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.game_key.is_empty() && !self.secret_key.is_empty()
    }
}
