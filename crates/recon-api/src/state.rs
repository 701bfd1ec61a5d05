//! # Application State
//!
//! Shared state for the Axum application: the validated gateway config, an
//! explicit processor client handle for the configured channel, the stores
//! and the reconciliation engine. Nothing here is a process-wide global;
//! multi-channel deployments build one state per channel.

use recon_core::{
    MemoryDedupStore, MemoryPaymentStore, Reconciler, SharedDedupStore, SharedPaymentStore,
    SharedProcessorClient,
};
use recon_yookassa::{GatewayConfig, YookassaClient};
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Validated channel configuration
    pub gateway: GatewayConfig,
    /// Processor client handle for this channel
    pub client: SharedProcessorClient,
    /// Payment records (shared with the reconciler)
    pub payments: SharedPaymentStore,
    /// The reconciliation engine both delivery paths converge on
    pub reconciler: Arc<Reconciler>,
}

impl AppState {
    /// Create state from the environment with in-memory stores
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let gateway = GatewayConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load gateway config: {}", e))?;
        let client: SharedProcessorClient = Arc::new(YookassaClient::new(gateway.clone()));

        Ok(Self::assemble(
            config,
            gateway,
            client,
            Arc::new(MemoryPaymentStore::new()),
            Arc::new(MemoryDedupStore::new()),
        ))
    }

    /// Create state from explicit parts (tests, alternate stores)
    pub fn with_parts(
        config: AppConfig,
        gateway: GatewayConfig,
        client: SharedProcessorClient,
        payments: SharedPaymentStore,
        dedup: SharedDedupStore,
    ) -> Self {
        Self::assemble(config, gateway, client, payments, dedup)
    }

    fn assemble(
        config: AppConfig,
        gateway: GatewayConfig,
        client: SharedProcessorClient,
        payments: SharedPaymentStore,
        dedup: SharedDedupStore,
    ) -> Self {
        let reconciler = Arc::new(Reconciler::new(Arc::clone(&payments), dedup));
        Self {
            config,
            gateway,
            client,
            payments,
            reconciler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");

        let config = AppConfig::from_env();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(!config.is_production());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "test".to_string(),
        };

        let addr = config.socket_addr();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
    }
}
