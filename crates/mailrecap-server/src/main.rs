use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mailrecap_gmail::GmailProvider;
use mailrecap_llm::SummarizerRegistry;
use mailrecap_persist::{EmailLogStore, MongoStore, UserStore};
use mailrecap_pipeline::{Orchestrator, PromptCompositor};
use mailrecap_server::{
    config::Config,
    routes::{health, notifications},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting mailrecap server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Persistence
    tracing::info!("Connecting to MongoDB");
    let store = MongoStore::connect(&config.mongodb_uri, &config.mongodb.database).await?;
    store.ensure_indexes().await?;
    tracing::info!("MongoDB connected, indexes ensured");

    let users: Arc<dyn UserStore> = Arc::new(store.users());
    let logs: Arc<dyn EmailLogStore> = Arc::new(store.email_logs());

    // AI providers: fail fast on unknown names or missing credentials.
    let registry = SummarizerRegistry::build(&config.ai.providers, &config.provider_settings())?;
    if registry.is_empty() {
        anyhow::bail!("no AI providers configured; set ai.providers in config");
    }
    tracing::info!(providers = ?registry.names(), "Summarizers ready");

    // Mailbox access
    let mail = Arc::new(GmailProvider::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
    )?);

    let compositor = match &config.pipeline.template {
        Some(template) => PromptCompositor::new(template.clone()),
        None => PromptCompositor::default(),
    };

    let orchestrator = Orchestrator::new(
        Arc::clone(&users),
        Arc::clone(&logs),
        mail,
        Arc::new(registry),
        compositor,
        config.pipeline.tracker_capacity,
    );

    let state = Arc::new(AppState::new(config.clone(), orchestrator, logs));

    let app = build_router(state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain event tasks spawned by the notification route before exiting.
    state.events.close();
    if !state.events.is_empty() {
        tracing::info!(in_flight = state.events.len(), "Draining event tasks");
    }
    state.events.wait().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/notifications", post(notifications::receive))
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
