//! Shared harness for the HTTP and WebSocket end-to-end tests.

#![allow(clippy::panic, dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use class_notify::api;
use class_notify::app_state::AppState;
use class_notify::domain::{ClassDetails, ClassUri, EventBus, SeatCounts};
use class_notify::error::NotifyError;
use class_notify::notify::{BusNotifier, Notifier};
use class_notify::persistence::{EventStore, MemoryEventStore};
use class_notify::provider::StatusProvider;
use class_notify::service::{Monitor, MonitorSettings, SubscriptionService};

/// Provider serving scripted snapshots keyed by URI.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    pages: Mutex<HashMap<String, ClassDetails>>,
}

impl ScriptedProvider {
    pub fn set(&self, uri: &str, details: ClassDetails) {
        if let Ok(mut pages) = self.pages.lock() {
            pages.insert(uri.to_string(), details);
        }
    }
}

#[async_trait]
impl StatusProvider for ScriptedProvider {
    fn school(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_status(&self, uri: &ClassUri) -> Result<ClassDetails, NotifyError> {
        self.pages
            .lock()
            .ok()
            .and_then(|pages| pages.get(uri.as_str()).cloned())
            .ok_or_else(|| NotifyError::Fetch(format!("no page scripted for {uri}")))
    }
}

/// A running server plus handles on its collaborators.
#[derive(Debug)]
pub struct TestApp {
    pub addr: SocketAddr,
    pub store: Arc<MemoryEventStore>,
    pub provider: Arc<ScriptedProvider>,
    pub monitor: Monitor,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn ws_url(&self, user_id: &str) -> String {
        format!("ws://{}/ws?user_id={user_id}", self.addr)
    }
}

pub fn details(name: &str, seats_used: u32, waitlist_used: u32) -> ClassDetails {
    ClassDetails::from_counts(
        name,
        SeatCounts::new(30, seats_used),
        SeatCounts::new(10, waitlist_used),
    )
}

/// Starts the full router on an ephemeral port with the memory store.
///
/// The monitor is returned unstarted so tests can drive single cycles.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryEventStore::new());
    let provider = Arc::new(ScriptedProvider::default());
    let event_bus = EventBus::new(256);

    let monitor = Monitor::new(
        Arc::clone(&store) as Arc<dyn EventStore>,
        Arc::clone(&provider) as Arc<dyn StatusProvider>,
        Arc::new(BusNotifier::new(event_bus.clone())) as Arc<dyn Notifier>,
        MonitorSettings::default(),
    );
    let subscriptions = Arc::new(SubscriptionService::new(
        Arc::clone(&store) as Arc<dyn EventStore>,
        Arc::clone(&provider) as Arc<dyn StatusProvider>,
        event_bus,
    ));
    let app = api::build_app(AppState::new(subscriptions, vec!["georgia_tech"]));

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestApp {
        addr,
        store,
        provider,
        monitor,
    }
}
