//! Sync service.
//!
//! Owns the shared [`QuoteBook`], runs reconcile cycles against a
//! [`RemoteSource`], and broadcasts [`SyncEvent`]s for whoever renders
//! notifications.
//!
//! The fetch runs without holding the book lock; only the merge does. Each
//! periodic tick spawns its cycle as a separate task, so stopping the timer
//! never cuts off a fetch that is already in flight.

use chrono::{DateTime, Utc};
use quotebook_engine::{KeyValueStorage, QuoteRecord, ReconcileResult};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, oneshot, Mutex};
use tokio::time::MissedTickBehavior;

use crate::book::QuoteBook;
use crate::config::{Config, ConflictPolicy};
use crate::error::{AppError, Result};
use crate::remote::RemoteSource;

/// Notification shown after a sync that changed the store.
pub const SYNCED_MESSAGE: &str =
    "Quotes synced with server. Server data took precedence on conflicts.";

/// Capacity of the event channel.
const EVENT_CAPACITY: usize = 64;

/// Notifications emitted by the sync service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A cycle changed the store.
    Synced {
        /// Remote records merged in
        applied: usize,
        /// Local records overwritten by the remote
        replaced: usize,
        /// Id conflicts settled
        conflicts: usize,
        /// The re-rendered view
        view: String,
        at: DateTime<Utc>,
    },

    /// A cycle found nothing to change.
    Unchanged { at: DateTime<Utc> },

    /// A cycle was skipped because the remote or storage failed.
    Skipped { reason: String, at: DateTime<Utc> },

    /// Periodic sync started.
    PeriodicStarted { interval_secs: u64 },

    /// Periodic sync stopped.
    PeriodicStopped,
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEvent::Synced { .. } => f.write_str(SYNCED_MESSAGE),
            SyncEvent::Unchanged { .. } => f.write_str("No changes from server."),
            SyncEvent::Skipped { reason, .. } => write!(f, "Sync skipped: {}", reason),
            SyncEvent::PeriodicStarted { interval_secs } => {
                write!(f, "Auto-sync started (every {}s).", interval_secs)
            }
            SyncEvent::PeriodicStopped => f.write_str("Auto-sync stopped."),
        }
    }
}

/// What a single sync cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The store changed
    Applied(ReconcileResult),
    /// Nothing to change
    Unchanged,
    /// The cycle was abandoned without touching the store
    Skipped(String),
}

/// Runs reconcile cycles on demand and on a timer.
pub struct SyncService<S> {
    book: Arc<Mutex<QuoteBook<S>>>,
    remote: Arc<dyn RemoteSource>,
    policy: ConflictPolicy,
    fetch_timeout: Duration,
    events: broadcast::Sender<SyncEvent>,
    periodic: Arc<StdMutex<Option<oneshot::Sender<()>>>>,
}

impl<S> Clone for SyncService<S> {
    fn clone(&self) -> Self {
        Self {
            book: Arc::clone(&self.book),
            remote: Arc::clone(&self.remote),
            policy: self.policy,
            fetch_timeout: self.fetch_timeout,
            events: self.events.clone(),
            periodic: Arc::clone(&self.periodic),
        }
    }
}

impl<S> SyncService<S>
where
    S: KeyValueStorage + Send + 'static,
{
    /// Create a service with the default policy and a 10 second fetch bound.
    pub fn new(book: QuoteBook<S>, remote: Arc<dyn RemoteSource>) -> Self {
        let defaults = Config::default();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            book: Arc::new(Mutex::new(book)),
            remote,
            policy: defaults.conflict_policy,
            fetch_timeout: defaults.fetch_timeout,
            events,
            periodic: Arc::new(StdMutex::new(None)),
        }
    }

    /// Create a service using the policy and timeout from `config`.
    pub fn from_config(book: QuoteBook<S>, remote: Arc<dyn RemoteSource>, config: &Config) -> Self {
        Self::new(book, remote)
            .with_policy(config.conflict_policy)
            .with_fetch_timeout(config.fetch_timeout)
    }

    /// Set how id conflicts are settled.
    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the upper bound on a single fetch.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// The shared book.
    pub fn book(&self) -> &Arc<Mutex<QuoteBook<S>>> {
        &self.book
    }

    /// Subscribe to sync notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Run one reconcile cycle.
    ///
    /// Never fails: remote, timeout, and storage errors are logged and turn
    /// into [`SyncOutcome::Skipped`] with the store untouched.
    pub async fn sync_once(&self) -> SyncOutcome {
        let fetched = match tokio::time::timeout(self.fetch_timeout, self.remote.fetch_quotes()).await
        {
            Ok(Ok(batch)) => batch,
            Ok(Err(e)) => return self.skip(e),
            Err(_) => return self.skip(AppError::Timeout(self.fetch_timeout)),
        };

        let mut book = self.book.lock().await;
        let applied = book.apply_remote(&fetched, self.policy);
        match applied {
            Ok(result) if result.changed => {
                tracing::info!(
                    applied = result.applied_remote,
                    replaced = result.replaced_local.len(),
                    conflicts = result.conflicts.len(),
                    total = book.store().len(),
                    "Quotes synced with server"
                );
                self.emit(SyncEvent::Synced {
                    applied: result.applied_remote,
                    replaced: result.replaced_local.len(),
                    conflicts: result.conflicts.len(),
                    view: book.view().to_string(),
                    at: Utc::now(),
                });
                SyncOutcome::Applied(result)
            }
            Ok(_) => {
                tracing::debug!(fetched = fetched.len(), "Sync found no changes");
                self.emit(SyncEvent::Unchanged { at: Utc::now() });
                SyncOutcome::Unchanged
            }
            Err(e) => {
                drop(book);
                self.skip(e)
            }
        }
    }

    /// Add a quote locally and publish it to the remote in the background.
    ///
    /// The local add stands whatever happens to the publish.
    pub async fn add_quote(&self, text: &str, category: &str) -> Result<QuoteRecord> {
        let record = self.book.lock().await.add_quote(text, category)?;

        let remote = Arc::clone(&self.remote);
        let published = record.clone();
        tokio::spawn(async move {
            match remote.publish(&published).await {
                Ok(()) => tracing::debug!(id = ?published.id, "Quote published"),
                Err(e) => tracing::debug!(id = ?published.id, error = %e, "Quote publish failed"),
            }
        });

        Ok(record)
    }

    /// Start periodic sync.
    ///
    /// Returns false if it was already running. The first cycle runs one
    /// `interval` after the start.
    pub fn start_periodic(&self, interval: Duration) -> bool {
        let mut slot = self.periodic.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        *slot = Some(stop_tx);
        drop(slot);

        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let cycle = service.clone();
                        tokio::spawn(async move {
                            cycle.sync_once().await;
                        });
                    }
                }
            }

            tracing::debug!("Periodic sync task exited");
        });

        tracing::info!(interval_secs = interval.as_secs(), "Periodic sync started");
        self.emit(SyncEvent::PeriodicStarted {
            interval_secs: interval.as_secs(),
        });
        true
    }

    /// Stop periodic sync. Returns false if it was not running.
    pub fn stop_periodic(&self) -> bool {
        let stop = self
            .periodic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match stop {
            Some(stop) => {
                let _ = stop.send(());
                tracing::info!("Periodic sync stopped");
                self.emit(SyncEvent::PeriodicStopped);
                true
            }
            None => false,
        }
    }

    /// Whether periodic sync is running.
    pub fn is_periodic_running(&self) -> bool {
        self.periodic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn skip(&self, error: AppError) -> SyncOutcome {
        tracing::warn!(error = %error, "Sync cycle skipped");
        let reason = error.to_string();
        self.emit(SyncEvent::Skipped {
            reason: reason.clone(),
            at: Utc::now(),
        });
        SyncOutcome::Skipped(reason)
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quotebook_engine::{MemoryStorage, QUOTES_KEY};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quote(text: &str, category: &str) -> QuoteRecord {
        QuoteRecord::new(text, category).unwrap()
    }

    /// Remote that replays scripted responses and counts publishes.
    #[derive(Default)]
    struct ScriptedRemote {
        batches: StdMutex<VecDeque<Result<Vec<QuoteRecord>>>>,
        delay: Option<Duration>,
        published: AtomicUsize,
    }

    impl ScriptedRemote {
        fn with(batches: Vec<Result<Vec<QuoteRecord>>>) -> Self {
            Self {
                batches: StdMutex::new(batches.into()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl RemoteSource for ScriptedRemote {
        async fn fetch_quotes(&self) -> Result<Vec<QuoteRecord>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.batches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn publish(&self, _record: &QuoteRecord) -> Result<()> {
            self.published.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
        }
    }

    fn book_with(records: &[QuoteRecord]) -> QuoteBook<MemoryStorage> {
        let mut storage = MemoryStorage::new();
        storage
            .set(QUOTES_KEY, serde_json::to_string(records).unwrap())
            .unwrap();
        QuoteBook::open(storage)
    }

    #[tokio::test]
    async fn sync_applies_server_wins() {
        let remote = ScriptedRemote::with(vec![Ok(vec![quote("B", "Z")])]);
        let service = SyncService::new(
            book_with(&[quote("A", "X"), quote("B", "Y")]),
            Arc::new(remote),
        );
        let mut events = service.subscribe();

        let outcome = service.sync_once().await;
        assert!(matches!(outcome, SyncOutcome::Applied(ref r) if r.changed));

        let book = service.book().lock().await;
        assert_eq!(book.store().records(), &[quote("B", "Z"), quote("A", "X")]);

        match events.recv().await.unwrap() {
            SyncEvent::Synced {
                applied, replaced, ..
            } => {
                assert_eq!(applied, 1);
                assert_eq!(replaced, 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn second_identical_sync_is_unchanged() {
        let batch = vec![quote("S", "Server")];
        let remote = ScriptedRemote::with(vec![Ok(batch.clone()), Ok(batch)]);
        let service = SyncService::new(book_with(&[quote("A", "X")]), Arc::new(remote));

        assert!(matches!(service.sync_once().await, SyncOutcome::Applied(_)));
        assert_eq!(service.sync_once().await, SyncOutcome::Unchanged);
    }

    #[tokio::test]
    async fn empty_batch_is_unchanged() {
        let service = SyncService::new(
            book_with(&[quote("A", "X")]),
            Arc::new(ScriptedRemote::default()),
        );
        assert_eq!(service.sync_once().await, SyncOutcome::Unchanged);
    }

    #[tokio::test]
    async fn remote_failure_skips_cycle() {
        let remote = ScriptedRemote::with(vec![Err(AppError::Status(
            reqwest::StatusCode::BAD_GATEWAY,
        ))]);
        let service = SyncService::new(book_with(&[quote("A", "X")]), Arc::new(remote));
        let mut events = service.subscribe();

        let outcome = service.sync_once().await;
        assert!(matches!(outcome, SyncOutcome::Skipped(ref reason) if reason.contains("502")));
        assert!(matches!(events.recv().await.unwrap(), SyncEvent::Skipped { .. }));

        let book = service.book().lock().await;
        assert_eq!(book.store().records(), &[quote("A", "X")]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        let remote = ScriptedRemote {
            batches: StdMutex::new(vec![Ok(vec![quote("Late", "Server")])].into()),
            delay: Some(Duration::from_secs(60)),
            ..ScriptedRemote::default()
        };
        let service = SyncService::new(book_with(&[quote("A", "X")]), Arc::new(remote))
            .with_fetch_timeout(Duration::from_secs(1));

        let outcome = service.sync_once().await;
        assert!(matches!(outcome, SyncOutcome::Skipped(ref reason) if reason.contains("timed out")));
        assert_eq!(service.book().lock().await.store().len(), 1);
    }

    #[tokio::test]
    async fn add_quote_survives_publish_failure() {
        let remote = Arc::new(ScriptedRemote::default());
        let service = SyncService::new(book_with(&[]), remote.clone());

        let record = service.add_quote("New", "Fresh").await.unwrap();
        assert_eq!(record.text, "New");

        for _ in 0..100 {
            if remote.published.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(remote.published.load(Ordering::SeqCst), 1);
        assert_eq!(service.book().lock().await.store().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_start_stop() {
        let remote = ScriptedRemote::with(vec![Ok(vec![quote("Tick", "Server")])]);
        let service = SyncService::new(book_with(&[quote("A", "X")]), Arc::new(remote));
        let mut events = service.subscribe();

        assert!(service.start_periodic(Duration::from_secs(15)));
        assert!(!service.start_periodic(Duration::from_secs(15)));
        assert!(service.is_periodic_running());
        assert_eq!(
            events.recv().await.unwrap(),
            SyncEvent::PeriodicStarted { interval_secs: 15 }
        );

        // Paused time auto-advances to the first tick
        assert!(matches!(events.recv().await.unwrap(), SyncEvent::Synced { .. }));
        assert_eq!(service.book().lock().await.store().len(), 2);

        assert!(service.stop_periodic());
        assert!(!service.stop_periodic());
        assert!(!service.is_periodic_running());
        assert_eq!(events.recv().await.unwrap(), SyncEvent::PeriodicStopped);
    }

    #[test]
    fn event_messages() {
        let synced = SyncEvent::Synced {
            applied: 1,
            replaced: 0,
            conflicts: 0,
            view: String::new(),
            at: Utc::now(),
        };
        assert_eq!(synced.to_string(), SYNCED_MESSAGE);
        assert_eq!(
            SyncEvent::PeriodicStarted { interval_secs: 15 }.to_string(),
            "Auto-sync started (every 15s)."
        );

        let json = serde_json::to_value(SyncEvent::PeriodicStopped).unwrap();
        assert_eq!(json, serde_json::json!({"type": "periodic_stopped"}));
    }
}
