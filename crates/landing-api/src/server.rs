use std::net::SocketAddr;
use std::sync::Arc;

use landing_core::Settings;
use tokio::signal;
use tracing::info;

use crate::{create_router, ApiError, ApiResult, AppState};

pub struct Server {
    state: AppState,
    addr: SocketAddr,
}

impl Server {
    pub async fn new(settings: Arc<Settings>) -> ApiResult<Self> {
        let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
            .parse()
            .map_err(|e| ApiError::Internal(format!("invalid listen address: {e}")))?;
        let state = AppState::new(settings).await?;
        Ok(Self { state, addr })
    }

    pub async fn run(self) -> ApiResult<()> {
        let router = create_router(self.state);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to bind {}: {e}", self.addr)))?;

        info!("Landing page listening on http://{}", self.addr);
        info!("  GET  /api/account/login - OAuth login");
        info!("  GET  /api/account/info - team details");
        info!("  POST /api/account/checkin - check in for the game");
        info!("  POST /api/vm/start - provision vulnbox");
        info!("  GET  /api/scoreboard/scoreboard.json - current scoreboard");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::Internal(format!("server error: {e}")))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
