use crate::config::Config;
use crate::state::AppState;
use crate::web::create_router;
use anyhow::Context;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// Main application struct containing all necessary components
pub struct App {
    config: Config,
    app_state: AppState,
}

impl App {
    /// Create a new App instance with all necessary components initialized
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let app_state = AppState::new(config.clone()).context("Failed to build app state")?;
        app_state.spawn_idle_sweeper();

        if config.youtube_api_key.is_none() {
            info!("YOUTUBE_API_KEY unset, stats enrichment will run degraded");
        }
        if config.openai_api_key.is_none() {
            info!("OPENAI_API_KEY unset, intent and suggest fall back to static behavior");
        }

        Ok(App { config, app_state })
    }

    /// Serve the API until a shutdown signal arrives.
    pub async fn run(self) -> ExitCode {
        let router = create_router(self.app_state);
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));

        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(address = %addr, error = %e, "Failed to bind listener");
                return ExitCode::FAILURE;
            }
        };
        info!(address = %addr, "server listening");

        let grace = self.config.shutdown_grace();
        let draining = Arc::new(Notify::new());
        let drain_started = draining.clone();

        let serve = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            drain_started.notify_one();
        })
        .into_future();

        // The drain deadline only starts counting once the shutdown signal
        // has actually arrived.
        let drain_deadline = async {
            draining.notified().await;
            tokio::time::sleep(grace).await;
        };

        tokio::select! {
            result = serve => match result {
                Ok(()) => {
                    info!("server shut down cleanly");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(error = %e, "server error");
                    ExitCode::FAILURE
                }
            },
            () = drain_deadline => {
                warn!(grace_secs = grace.as_secs(), "drain grace elapsed, dropping in-flight requests");
                ExitCode::SUCCESS
            }
        }
    }
}

/// Resolves on SIGINT or SIGTERM (the platform sends SIGTERM on deploys).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
