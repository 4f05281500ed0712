//! API server entry point.

use std::sync::Arc;

use api::Collaborators;
use api::config::Config;
use enrichment::AggregateSources;
use notification_store::PostgresNotificationStore;
use notifier::{NotifierConfig, SmtpMailer, UnconfiguredFulfillmentProvider};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire the mailer, read models and notification log
    let notifier_config = NotifierConfig::from_env().expect("invalid notifier configuration");
    tracing::info!(
        templates = notifier_config.template_map.len(),
        root = %notifier_config.template_root.display(),
        "notifier configured"
    );

    let mailer = SmtpMailer::from_config(&notifier_config)
        .expect("a working SMTP_TRANSPORT is required to deliver mail");
    match mailer.test_connection().await {
        Ok(true) => tracing::info!("SMTP server reachable"),
        Ok(false) => tracing::warn!("SMTP server did not accept a test connection"),
        Err(err) => tracing::warn!(error = %err, "SMTP server unreachable, sends fail until it is up"),
    }

    let database_url = config
        .database_url
        .as_deref()
        .expect("DATABASE_URL is required for the notification log and read models");
    let pool = sqlx::PgPool::connect(database_url)
        .await
        .expect("failed to connect to PostgreSQL");
    let store = PostgresNotificationStore::new(pool.clone());
    store.run_migrations().await.expect("migrations failed");

    let collaborators = Collaborators {
        sources: AggregateSources::from_postgres(pool),
        mailer: Arc::new(mailer),
        fulfillment: Arc::new(UnconfiguredFulfillmentProvider),
    };
    let state = api::create_state(notifier_config, collaborators, Arc::new(store));

    // 4. Build the application
    let app = api::create_app(Arc::clone(&state), metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 6. Let accepted events finish sending
    let pending = state.tasks.len();
    tracing::info!(pending, "waiting for in-flight notifications");
    match tokio::time::timeout(config.shutdown_timeout, state.tasks.drain()).await {
        Ok(drained) => tracing::info!(drained, "in-flight notifications finished"),
        Err(_) => tracing::warn!(
            timeout_secs = config.shutdown_timeout.as_secs(),
            "gave up waiting for in-flight notifications"
        ),
    }

    tracing::info!("server shut down gracefully");
}
