use porthole_relying_party::Provider;
use porthole_server::{
    app,
    auth::AppState,
    config::ServerConfig,
    error::StartupError,
};
use rootcause::prelude::Report;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            tracing::error!(error = %report, "server exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Report<StartupError>> {
    // Load configuration from environment
    let config = ServerConfig::from_env().map_err(|e| StartupError::Config {
        reason: e.to_string(),
    })?;
    tracing::info!("Loaded configuration");

    // Resolve the identity provider; serving without it is pointless
    tracing::info!(issuer = config.oidc.issuer_url(), "Discovering OIDC provider...");
    let provider = Provider::resolve(config.oidc)
        .await
        .map_err(|report| StartupError::Provider {
            reason: report.to_string(),
        })?;

    let app_state = Arc::new(AppState::new(Arc::new(provider), config.session));

    // Spawn periodic pending-login cleanup task
    let cleanup_state = app_state.clone();
    let cleanup_interval_secs = app_state.session_config.cleanup_interval_seconds.max(1);
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cleanup_interval_secs));
        loop {
            interval.tick().await;
            let purged = cleanup_state.flow.pending().purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged_logins = purged, "Periodic pending-login cleanup");
            }
        }
    });

    let app = app::router(app_state, &config.landing_page);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| StartupError::Bind {
            addr: config.listen_addr.clone(),
            reason: e.to_string(),
        })?;

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StartupError::Serve {
            reason: e.to_string(),
        })?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
