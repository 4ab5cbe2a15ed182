//! class-notify server entry point.
//!
//! Starts the background monitor and the Axum HTTP server with REST and
//! WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use class_notify::api;
use class_notify::app_state::AppState;
use class_notify::config::MonitorConfig;
use class_notify::domain::EventBus;
use class_notify::notify::{BusNotifier, Notifier, NotifierSet, WebhookNotifier};
use class_notify::persistence::{EventStore, MemoryEventStore, PostgresEventStore};
use class_notify::provider::ProviderRegistry;
use class_notify::service::{Monitor, SubscriptionService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = MonitorConfig::from_env().map_err(|e| anyhow::anyhow!("configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, school = %config.school, "starting class-notify");

    // Build persistence layer
    let store: Arc<dyn EventStore> = if config.persistence_enabled {
        let store = PostgresEventStore::connect(&config)
            .await
            .context("connecting to PostgreSQL")?;
        tracing::info!("using PostgreSQL event store");
        Arc::new(store)
    } else {
        tracing::warn!("persistence disabled, subscriptions are lost on restart");
        Arc::new(MemoryEventStore::new())
    };

    // Resolve the status provider
    let registry = ProviderRegistry::with_builtin(config.fetch_timeout())?;
    let provider = registry.resolve(&config.school)?;

    // Build notifiers
    let event_bus = EventBus::new(config.event_bus_capacity);
    let mut notifiers = NotifierSet::new().with(Arc::new(BusNotifier::new(event_bus.clone())));
    if let Some(url) = &config.notify_webhook_url {
        notifiers = notifiers.with(Arc::new(WebhookNotifier::new(url, config.fetch_timeout())?));
        tracing::info!("webhook notifier enabled");
    }
    let notifier: Arc<dyn Notifier> = Arc::new(notifiers);

    // Start the monitor
    let monitor = Monitor::new(
        Arc::clone(&store),
        Arc::clone(&provider),
        notifier,
        config.monitor_settings(),
    );
    let monitor_task = tokio::spawn(monitor.run());

    // Build service layer and application state
    let subscriptions = Arc::new(SubscriptionService::new(store, provider, event_bus));
    let app = api::build_app(AppState::new(subscriptions, registry.schools()));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor_task.abort();
    tracing::info!("class-notify stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
