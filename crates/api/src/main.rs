use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use habits_api::background;
use habits_api::config::ServerConfig;
use habits_api::router::build_app_router;
use habits_api::state::AppState;
use habits_db::{HabitStore, MemoryStore, PgStore};
use habits_events::{
    DeliveryPolicy, EmailConfig, EmailDelivery, NotificationDispatcher, NotificationSink,
    PushDelivery,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "habits_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    // --- Persistence ---
    let store: Arc<dyn HabitStore> = match &config.database_url {
        Some(url) => {
            let pool = habits_db::create_pool(url, config.db_max_connections).await?;
            tracing::info!("Database connection pool created");

            habits_db::health_check(&pool).await?;
            tracing::info!("Database health check passed");

            habits_db::run_migrations(&pool).await?;
            tracing::info!("Database migrations applied");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; data will not persist");
            Arc::new(MemoryStore::new())
        }
    };

    // --- Notifications ---
    let mut sinks: Vec<Arc<dyn NotificationSink>> = Vec::new();
    match PushDelivery::from_env() {
        Some(Ok(push)) => sinks.push(Arc::new(push)),
        Some(Err(e)) => anyhow::bail!("Invalid push delivery configuration: {e}"),
        None => tracing::info!("PUSH_WEBHOOK_URL not set, push delivery disabled"),
    }
    match EmailConfig::from_env() {
        Some(email) => sinks.push(Arc::new(EmailDelivery::new(email)?)),
        None => tracing::info!("SMTP_HOST not set, email delivery disabled"),
    }

    let policy = DeliveryPolicy {
        max_attempts: config.notification_max_attempts.max(1),
        ..Default::default()
    };
    let (notifier, dispatch_worker) =
        NotificationDispatcher::new(config.notification_queue_capacity, sinks, policy);

    let dispatch_cancel = CancellationToken::new();
    let dispatch_handle = tokio::spawn(dispatch_worker.run(dispatch_cancel.clone()));

    // --- Background jobs ---
    let sweep_cancel = CancellationToken::new();
    let sweep_handle = tokio::spawn(background::pact_expiry::run(
        Arc::clone(&store),
        notifier.clone(),
        Duration::from_secs(config.pact_sweep_interval_secs.max(1)),
        config.pact_invitation_expiry_days,
        sweep_cancel.clone(),
    ));

    // --- HTTP ---
    let config = Arc::new(config);
    let state = AppState {
        store,
        notifier,
        config: Arc::clone(&config),
    };
    let app = build_app_router(state, &config);

    let addr = SocketAddr::new(config.host.parse()?, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped, shutting down background tasks");

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;

    dispatch_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatch_handle).await;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
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
