use crate::config::Config;
use crate::state::AppState;
use crate::utils::fmt_duration;
use crate::web::create_router;
use anyhow::Context;
use figment::{Figment, providers::Env};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Main application struct: configuration plus the state handed to handlers
pub struct App {
    config: Config,
    app_state: AppState,
}

impl App {
    /// Load configuration from the environment.
    pub fn load_config() -> Result<Config, anyhow::Error> {
        Figment::new()
            .merge(Env::raw())
            .extract()
            .context("Failed to load config")
    }

    pub fn new(config: Config) -> Self {
        info!(
            base_url = config.portal.base_url.as_str(),
            login_path = config.portal.login_path.as_str(),
            grades_path = config.portal.grades_path.as_str(),
            fallback_term = config.portal.fallback_term.as_str(),
            timeout = fmt_duration(config.portal.timeout),
            "portal configuration loaded"
        );
        let app_state = AppState::new(config.portal.clone());
        App { config, app_state }
    }

    /// Serve until a shutdown signal arrives, then drain in-flight requests
    /// for at most `shutdown_timeout`.
    pub async fn run(self) -> ExitCode {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = match TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))
        {
            Ok(listener) => listener,
            Err(e) => {
                error!(error = ?e, "Could not start web server");
                return ExitCode::FAILURE;
            }
        };
        info!(address = %addr, "web server listening");

        let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
        let server = axum::serve(listener, create_router(self.app_state))
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signalled_tx.send(());
            })
            .into_future();

        let shutdown_timeout = self.config.shutdown_timeout;
        let drain_deadline = async move {
            match signalled_rx.await {
                Ok(()) => tokio::time::sleep(shutdown_timeout).await,
                Err(_) => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = server => match result {
                Ok(()) => {
                    info!("web server stopped");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(error = ?e, "web server failed");
                    ExitCode::FAILURE
                }
            },
            _ = drain_deadline => {
                warn!(
                    timeout = fmt_duration(shutdown_timeout),
                    "graceful shutdown timed out, exiting with requests in flight"
                );
                ExitCode::FAILURE
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = ?e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = ?e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
