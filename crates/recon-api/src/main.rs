//! # Recon-Gate
//!
//! Payment state reconciliation gateway.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export YOOKASSA_SHOP_ID=123456
//! export YOOKASSA_SECRET_KEY=live_...
//! export YOOKASSA_WEBHOOK_SECRET=whsec_...
//! export GATEWAY_RETURN_URL=https://shop.example/checkout/return
//!
//! # Run the server
//! recon-gate
//! ```

use recon_api::{routes, state::AppState};
use recon_core::ProcessorClient;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Processor: {}", state.client.processor_name());
    info!(
        "Supported currencies: {:?}",
        state.gateway.supported_currencies
    );
    info!("Capture mode: {}", state.gateway.capture_mode.as_str());

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("Recon-Gate starting on http://{}", addr);

    if !is_prod {
        info!("Checkout: POST http://{}/api/v1/checkout", addr);
        info!("Webhook: POST http://{}/webhooks/", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
