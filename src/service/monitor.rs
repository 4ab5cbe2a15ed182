//! Background monitoring loop.
//!
//! Each cycle streams every active event from the store, re-fetches its
//! status, persists the fresh snapshot, and notifies subscribers when the
//! status changed. Cycles repeat forever with a fixed pause in between.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};

use crate::domain::Event;
use crate::error::NotifyError;
use crate::notify::Notifier;
use crate::persistence::{EventStore, EventStream};
use crate::provider::StatusProvider;

/// Timing and concurrency knobs for the [`Monitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Pause between the end of one cycle and the start of the next.
    pub poll_interval: Duration,
    /// Upper bound on a single status fetch.
    pub fetch_timeout: Duration,
    /// Upper bound on a single store call.
    pub store_timeout: Duration,
    /// Number of events checked concurrently within a cycle.
    pub workers: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(15),
            store_timeout: Duration::from_secs(10),
            workers: 1,
        }
    }
}

/// Outcome counters for one monitoring cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Events taken from the active stream.
    pub checked: usize,
    /// Events whose status changed and whose subscribers were notified.
    pub changed: usize,
    /// Events whose check failed at any step.
    pub failed: usize,
}

impl CycleReport {
    fn record(mut self, outcome: &Result<bool, NotifyError>) -> Self {
        self.checked = self.checked.saturating_add(1);
        match outcome {
            Ok(true) => self.changed = self.changed.saturating_add(1),
            Ok(false) => {}
            Err(_) => self.failed = self.failed.saturating_add(1),
        }
        self
    }
}

/// Polls active classes and notifies subscribers of status changes.
#[derive(Debug, Clone)]
pub struct Monitor {
    store: Arc<dyn EventStore>,
    provider: Arc<dyn StatusProvider>,
    notifier: Arc<dyn Notifier>,
    settings: MonitorSettings,
}

impl Monitor {
    /// Creates a new monitor.
    #[must_use]
    pub fn new(
        store: Arc<dyn EventStore>,
        provider: Arc<dyn StatusProvider>,
        notifier: Arc<dyn Notifier>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            store,
            provider,
            notifier,
            settings,
        }
    }

    /// Returns the monitor's settings.
    #[must_use]
    pub fn settings(&self) -> MonitorSettings {
        self.settings
    }

    /// Runs cycles forever. Never returns.
    ///
    /// A cycle that cannot start is logged and retried after the usual
    /// pause.
    pub async fn run(self) {
        tracing::info!(
            school = self.provider.school(),
            poll_interval_secs = self.settings.poll_interval.as_secs(),
            workers = self.settings.workers,
            "monitor started"
        );
        loop {
            match self.run_cycle().await {
                Ok(report) => tracing::info!(
                    checked = report.checked,
                    changed = report.changed,
                    failed = report.failed,
                    "monitor cycle complete"
                ),
                Err(e) => tracing::error!(error = %e, "monitor cycle aborted"),
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    /// Runs one full pass over all active events.
    ///
    /// Per-event failures are logged and counted in the report; they never
    /// abort the cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the active set cannot be counted or streamed,
    /// and [`NotifyError::Timeout`] if the store stalls before yielding the
    /// next event.
    pub async fn run_cycle(&self) -> Result<CycleReport, NotifyError> {
        let limit = self.settings.store_timeout;
        let active = bounded("count_active", limit, self.store.count_active()).await?;
        let stream = bounded("stream_active", limit, self.store.stream_active(active)).await?;
        tracing::debug!(active, "monitor cycle started");

        // Each pull is bounded; a stall ends the stream with an error.
        let pulls: BoxStream<'static, Result<Result<Event, NotifyError>, NotifyError>> =
            futures_util::stream::unfold(
                Some(stream),
                move |state: Option<EventStream>| async move {
                    let mut stream = state?;
                    match tokio::time::timeout(limit, stream.next()).await {
                        Ok(Some(item)) => Some((Ok(item), Some(stream))),
                        Ok(None) => None,
                        Err(_) => {
                            let stalled = NotifyError::Timeout {
                                operation: "stream_active",
                                limit,
                            };
                            Some((Err(stalled), None))
                        }
                    }
                },
            )
            .boxed();

        pulls
            .map(|pull| async move {
                let item = match pull {
                    Ok(item) => item,
                    Err(stalled) => return Err(stalled),
                };
                let outcome = match item {
                    Ok(event) => self.check_event(event).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = &outcome {
                    tracing::warn!(error = %e, "class check failed");
                }
                Ok(outcome)
            })
            .buffer_unordered(self.settings.workers.max(1))
            .try_fold(CycleReport::default(), |report, outcome| async move {
                Ok(report.record(&outcome))
            })
            .await
    }

    /// Checks a single event: fetch, persist, compare, notify.
    ///
    /// Returns `true` if the status changed and subscribers were notified.
    /// Notification is at-least-once: an update that timed out is treated
    /// as possibly committed.
    async fn check_event(&self, event: Event) -> Result<bool, NotifyError> {
        let uri = &event.uri;
        let details = bounded(
            "fetch_status",
            self.settings.fetch_timeout,
            self.provider.fetch_status(uri),
        )
        .await?;

        // A timed-out update may still have committed, so the change is
        // notified anyway and the check is reported as failed afterwards.
        let persisted = match bounded(
            "update_details",
            self.settings.store_timeout,
            self.store.update_details(uri, &details),
        )
        .await
        {
            Ok(()) => Ok(()),
            Err(e @ NotifyError::Timeout { .. }) => Err(e),
            Err(e) => return Err(e),
        };

        let previous = event.status();
        if previous == details.status {
            tracing::debug!(%uri, status = %previous, "status unchanged");
            return persisted.map(|()| false);
        }

        tracing::info!(
            %uri,
            from = %previous,
            to = %details.status,
            subscribers = event.subscribers.len(),
            "class status changed"
        );
        let updated = event.with_details(details);
        self.notifier.notify(&updated, previous).await?;
        persisted.map(|()| true)
    }
}

async fn bounded<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T, NotifyError>
where
    F: Future<Output = Result<T, NotifyError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| NotifyError::Timeout { operation, limit })?
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ClassDetails, ClassStatus, ClassUri, SeatCounts, UserId};
    use crate::persistence::MemoryEventStore;
    use crate::service::test_support::{RecordingNotifier, ScriptedProvider, StallingStore};

    fn uri(s: &str) -> ClassUri {
        let Ok(uri) = ClassUri::parse(s) else {
            panic!("valid uri");
        };
        uri
    }

    fn user(s: &str) -> UserId {
        let Ok(user) = UserId::parse(s) else {
            panic!("valid user");
        };
        user
    }

    fn details(seats_used: u32, waitlist_used: u32) -> ClassDetails {
        ClassDetails::from_counts(
            "Data Structures",
            SeatCounts::new(30, seats_used),
            SeatCounts::new(10, waitlist_used),
        )
    }

    fn settings() -> MonitorSettings {
        MonitorSettings {
            poll_interval: Duration::from_millis(10),
            fetch_timeout: Duration::from_millis(200),
            store_timeout: Duration::from_secs(1),
            workers: 2,
        }
    }

    async fn seed(store: &MemoryEventStore, s: &str, d: ClassDetails, users: &[&str]) -> ClassUri {
        let key = uri(s);
        let Some((first, rest)) = users.split_first() else {
            panic!("at least one subscriber");
        };
        let Ok(_) = store.create(&key, &d, &user(first)).await else {
            panic!("create failed");
        };
        for other in rest {
            let Ok(()) = store.add_subscriber(&key, &user(other)).await else {
                panic!("add_subscriber failed");
            };
        }
        key
    }

    fn monitor(
        store: &Arc<MemoryEventStore>,
        provider: &Arc<ScriptedProvider>,
        notifier: &Arc<RecordingNotifier>,
    ) -> Monitor {
        Monitor::new(
            Arc::clone(store) as Arc<dyn EventStore>,
            Arc::clone(provider) as Arc<dyn StatusProvider>,
            Arc::clone(notifier) as Arc<dyn Notifier>,
            settings(),
        )
    }

    #[tokio::test]
    async fn status_change_notifies_once_with_new_details() {
        let store = Arc::new(MemoryEventStore::new());
        let provider = Arc::new(ScriptedProvider::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let x = seed(&store, "https://x.edu/X", details(0, 0), &["alice", "bob"]).await;
        provider.set(&x, details(30, 2));

        let Ok(report) = monitor(&store, &provider, &notifier).run_cycle().await else {
            panic!("cycle failed");
        };
        assert_eq!(
            report,
            CycleReport {
                checked: 1,
                changed: 1,
                failed: 0
            }
        );

        let delivered = notifier.delivered();
        assert_eq!(delivered.len(), 1);
        let Some(call) = delivered.first() else {
            panic!("expected a delivery");
        };
        assert_eq!(call.previous, ClassStatus::Opened);
        assert_eq!(call.event.details.status, ClassStatus::Waitlisted);
        assert_eq!(call.event.details.waitlist_remaining, 8);
        assert_eq!(call.event.subscribers.len(), 2);

        let Ok(stored) = store.get_by_uri(&x).await else {
            panic!("event missing");
        };
        assert_eq!(stored.details.status, ClassStatus::Waitlisted);
    }

    #[tokio::test]
    async fn unchanged_status_persists_without_notifying() {
        let store = Arc::new(MemoryEventStore::new());
        let provider = Arc::new(ScriptedProvider::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let x = seed(&store, "https://x.edu/X", details(5, 0), &["alice"]).await;
        provider.set(&x, details(12, 0));

        let Ok(report) = monitor(&store, &provider, &notifier).run_cycle().await else {
            panic!("cycle failed");
        };
        assert_eq!(report.changed, 0);
        assert!(notifier.delivered().is_empty());

        let Ok(stored) = store.get_by_uri(&x).await else {
            panic!("event missing");
        };
        assert_eq!(stored.details.seats_remaining, 18);
    }

    #[tokio::test]
    async fn completed_events_are_not_polled() {
        let store = Arc::new(MemoryEventStore::new());
        let provider = Arc::new(ScriptedProvider::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let done = ClassDetails {
            status: ClassStatus::Completed,
            ..details(30, 10)
        };
        let z = seed(&store, "https://x.edu/Z", done, &["alice"]).await;

        let Ok(report) = monitor(&store, &provider, &notifier).run_cycle().await else {
            panic!("cycle failed");
        };
        assert_eq!(report.checked, 0);
        assert_eq!(provider.calls(&z), 0);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_cycle() {
        let store = Arc::new(MemoryEventStore::new());
        let provider = Arc::new(ScriptedProvider::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let _broken = seed(&store, "https://x.edu/broken", details(0, 0), &["alice"]).await;
        let ok = seed(&store, "https://x.edu/ok", details(0, 0), &["bob"]).await;
        provider.set(&ok, details(30, 10));

        let Ok(report) = monitor(&store, &provider, &notifier).run_cycle().await else {
            panic!("cycle failed");
        };
        assert_eq!(
            report,
            CycleReport {
                checked: 2,
                changed: 1,
                failed: 1
            }
        );
        let delivered = notifier.delivered();
        assert!(delivered.iter().all(|d| d.event.uri == ok));
        assert!(
            delivered
                .iter()
                .all(|d| d.event.details.status == ClassStatus::Full)
        );
    }

    #[tokio::test]
    async fn notifier_failure_keeps_new_snapshot() {
        let store = Arc::new(MemoryEventStore::new());
        let provider = Arc::new(ScriptedProvider::new());
        let notifier = Arc::new(RecordingNotifier::failing());
        let x = seed(&store, "https://x.edu/X", details(0, 0), &["alice"]).await;
        provider.set(&x, details(30, 10));

        let Ok(report) = monitor(&store, &provider, &notifier).run_cycle().await else {
            panic!("cycle failed");
        };
        assert_eq!(report.failed, 1);

        let Ok(stored) = store.get_by_uri(&x).await else {
            panic!("event missing");
        };
        assert_eq!(stored.details.status, ClassStatus::Full);
    }

    #[tokio::test]
    async fn slow_fetch_times_out_and_leaves_snapshot() {
        let store = Arc::new(MemoryEventStore::new());
        let provider = Arc::new(ScriptedProvider::with_delay(Duration::from_secs(2)));
        let notifier = Arc::new(RecordingNotifier::default());
        let x = seed(&store, "https://x.edu/X", details(0, 0), &["alice"]).await;
        provider.set(&x, details(30, 10));

        let Ok(report) = monitor(&store, &provider, &notifier).run_cycle().await else {
            panic!("cycle failed");
        };
        assert_eq!(report.failed, 1);
        assert!(notifier.delivered().is_empty());

        let Ok(stored) = store.get_by_uri(&x).await else {
            panic!("event missing");
        };
        assert_eq!(stored.details.status, ClassStatus::Opened);
    }

    #[tokio::test]
    async fn empty_store_yields_empty_report() {
        let store = Arc::new(MemoryEventStore::new());
        let provider = Arc::new(ScriptedProvider::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let report = monitor(&store, &provider, &notifier).run_cycle().await;
        assert!(matches!(report, Ok(r) if r == CycleReport::default()));
    }

    #[tokio::test]
    async fn bounded_reports_operation_name() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<(), NotifyError>(())
        };
        let result = bounded("count_active", Duration::from_millis(10), slow).await;
        assert!(matches!(
            result,
            Err(NotifyError::Timeout {
                operation: "count_active",
                ..
            })
        ));
    }

    fn stalling_monitor(
        store: &Arc<StallingStore>,
        provider: &Arc<ScriptedProvider>,
        notifier: &Arc<RecordingNotifier>,
    ) -> Monitor {
        Monitor::new(
            Arc::clone(store) as Arc<dyn EventStore>,
            Arc::clone(provider) as Arc<dyn StatusProvider>,
            Arc::clone(notifier) as Arc<dyn Notifier>,
            MonitorSettings {
                store_timeout: Duration::from_millis(50),
                ..settings()
            },
        )
    }

    #[tokio::test]
    async fn hung_scan_ends_cycle_with_timeout() {
        let store = Arc::new(StallingStore::stalled_scan());
        let provider = Arc::new(ScriptedProvider::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = stalling_monitor(&store, &provider, &notifier);

        let Ok(result) = tokio::time::timeout(Duration::from_secs(2), monitor.run_cycle()).await
        else {
            panic!("cycle hung on a stalled scan");
        };
        assert!(matches!(
            result,
            Err(NotifyError::Timeout {
                operation: "stream_active",
                ..
            })
        ));
        assert!(notifier.delivered().is_empty());
    }

    #[tokio::test]
    async fn class_without_subscribers_is_still_checked() {
        let store = Arc::new(MemoryEventStore::new());
        let provider = Arc::new(ScriptedProvider::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let x = seed(&store, "https://x.edu/X", details(0, 0), &["alice"]).await;
        let Ok(()) = store.remove_subscriber(&x, &user("alice")).await else {
            panic!("remove_subscriber failed");
        };
        provider.set(&x, details(30, 10));

        let Ok(report) = monitor(&store, &provider, &notifier).run_cycle().await else {
            panic!("cycle failed");
        };
        assert_eq!(
            report,
            CycleReport {
                checked: 1,
                changed: 1,
                failed: 0
            }
        );

        let delivered = notifier.delivered();
        assert_eq!(delivered.len(), 1);
        let Some(call) = delivered.first() else {
            panic!("expected a delivery");
        };
        assert!(call.event.subscribers.is_empty());
        assert_eq!(call.previous, ClassStatus::Opened);
        assert_eq!(call.event.details.status, ClassStatus::Full);
    }

    #[tokio::test]
    async fn timed_out_update_still_notifies_once() {
        let store = Arc::new(StallingStore::slow_update(Duration::from_millis(200)));
        let provider = Arc::new(ScriptedProvider::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let x = seed(&store.inner, "https://x.edu/X", details(0, 0), &["alice"]).await;
        provider.set(&x, details(30, 10));
        let monitor = stalling_monitor(&store, &provider, &notifier);

        let Ok(first) = monitor.run_cycle().await else {
            panic!("cycle failed");
        };
        assert_eq!(
            first,
            CycleReport {
                checked: 1,
                changed: 0,
                failed: 1
            }
        );
        assert_eq!(notifier.delivered().len(), 1);

        let Ok(stored) = store.get_by_uri(&x).await else {
            panic!("event missing");
        };
        assert_eq!(stored.details.status, ClassStatus::Full);

        // The committed snapshot already matches, so nothing is sent twice.
        let Ok(second) = monitor.run_cycle().await else {
            panic!("cycle failed");
        };
        assert_eq!(second.changed, 0);
        assert_eq!(notifier.delivered().len(), 1);
    }
}
