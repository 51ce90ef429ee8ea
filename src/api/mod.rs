//! REST API for the submission form.
//!
//! A web front end posts submissions here instead of writing the dataset
//! itself. The translator is loaded lazily on the first request that needs it.
//!
//! # Security
//!
//! - Localhost only by default
//! - No authentication; put a reverse proxy in front for public use
//! - CORS restricted by default
//!
//! # Usage
//!
//! ```toml
//! [api]
//! bind = "127.0.0.1:8080"
//! swagger_ui = true
//! ```
//!
//! ```bash
//! describe-this serve
//! ```

mod handlers;
mod routes;
pub mod state;

pub use routes::create_router;
pub use state::ApiState;

use crate::config::ApiConfig;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Start the API server.
pub async fn serve(state: ApiState, config: &ApiConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid API bind address '{}': {}", config.bind, e))?;

    let router = create_router(state, config);

    info!("Starting REST API server on {}", addr);
    if config.swagger_ui {
        info!("Swagger UI available at http://{}/swagger-ui/", addr);
    }

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, router).await.map_err(|e| {
        error!("API server error: {}", e);
        anyhow::anyhow!("API server error: {}", e)
    })
}
