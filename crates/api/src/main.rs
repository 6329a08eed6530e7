use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use writetalent_comfyui::config::ComfyUIConfig;
use writetalent_llm::{storyteller_from_config, LlmConfig};
use writetalent_n8n::{N8nClient, N8nConfig};
use writetalent_pipeline::delegated::DelegatedDriver;
use writetalent_pipeline::direct::DirectDriver;
use writetalent_pipeline::engines::{ComfyImageEngine, N8nWorkflowEngine};
use writetalent_pipeline::{
    CompletionDriver, DelegatedConfig, DirectConfig, JobDispatcher, JobRegistry, RegistryConfig,
};

use writetalent_api::auth::verification::VerificationStore;
use writetalent_api::background;
use writetalent_api::config::ServerConfig;
use writetalent_api::mail::{MailConfig, VerificationMailer};
use writetalent_api::router::build_app_router;
use writetalent_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "writetalent_api=debug,writetalent_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = writetalent_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    writetalent_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    writetalent_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Generation pipeline ---
    let registry_config = RegistryConfig::from_env();
    let registry = Arc::new(JobRegistry::new(&registry_config));
    let dispatcher = build_dispatcher(Arc::clone(&registry));

    let retention_cancel = tokio_util::sync::CancellationToken::new();
    let retention_handle = registry_config.cleanup_interval.map(|interval| {
        tokio::spawn(background::job_retention::run(
            Arc::clone(&registry),
            interval,
            retention_cancel.clone(),
        ))
    });

    // --- Story generation ---
    let storyteller = storyteller_from_config(&LlmConfig::from_env())
        .expect("Failed to build text-generation client");
    tracing::info!(provider = storyteller.provider(), "Storyteller ready");

    // --- Mail ---
    let mailer = MailConfig::from_env().map(|mail_config| {
        tracing::info!(host = %mail_config.smtp_host, "SMTP delivery enabled");
        Arc::new(VerificationMailer::new(mail_config))
    });
    if mailer.is_none() {
        tracing::warn!("SMTP_HOST not set, verification codes will only be logged");
    }

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        dispatcher,
        storyteller,
        verification_codes: Arc::new(VerificationStore::new()),
        mailer,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    retention_cancel.cancel();
    if let Some(handle) = retention_handle {
        let _ = tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), handle).await;
    }
    tracing::info!(
        in_flight_jobs = registry.len().await,
        "Graceful shutdown complete, in-memory jobs discarded"
    );
}

/// Wire the completion drivers available in this environment.
///
/// The direct driver talks to ComfyUI. The delegated driver exists only
/// when `N8N_BASE_URL` is set, and falls back to the direct driver for
/// image jobs whose batch submission fails.
fn build_dispatcher(registry: Arc<JobRegistry>) -> JobDispatcher {
    let mut dispatcher = JobDispatcher::new(registry);

    let direct: Option<Arc<dyn CompletionDriver>> =
        match ComfyImageEngine::from_config(ComfyUIConfig::from_env()) {
            Ok(engine) => Some(Arc::new(DirectDriver::new(
                Arc::new(engine),
                DirectConfig::from_env(),
            ))),
            Err(e) => {
                tracing::error!(error = %e, "ComfyUI engine unavailable, direct mode disabled");
                None
            }
        };

    if let Some(direct) = &direct {
        dispatcher = dispatcher.with_direct(Arc::clone(direct));
    }

    match N8nConfig::from_env().map(|config| N8nClient::new(&config)) {
        Some(Ok(client)) => {
            let mut delegated = DelegatedDriver::new(
                Arc::new(N8nWorkflowEngine::new(client)),
                DelegatedConfig::from_env(),
            );
            if let Some(direct) = direct {
                delegated = delegated.with_fallback(direct);
            }
            dispatcher = dispatcher.with_delegated(Arc::new(delegated));
            tracing::info!("n8n workflow engine enabled");
        }
        Some(Err(e)) => {
            tracing::error!(error = %e, "n8n client could not be built, delegated mode disabled");
        }
        None => tracing::info!("N8N_BASE_URL not set, delegated mode disabled"),
    }

    dispatcher
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
