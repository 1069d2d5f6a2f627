use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::Backend;
use crate::config::ClientConfig;
use crate::error::AppError;
use crate::models::{FetchMode, Mulasztas, SyncMetadata, SyncStatus, SyncType};
use crate::services::scheduler::SyncScheduler;

/// Data with a fast cached tier and an authoritative live tier.
#[async_trait]
pub trait SyncSource: Send + Sync {
    type Item: Clone + Send + Sync + 'static;

    async fn fetch_cached(&self) -> Result<Vec<Self::Item>, AppError>;
    async fn fetch_live(&self) -> Result<Vec<Self::Item>, AppError>;

    async fn is_registered(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

/// FTV absences served by the backend.
pub struct MulasztasSource {
    backend: Arc<dyn Backend>,
}

impl MulasztasSource {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl SyncSource for MulasztasSource {
    type Item = Mulasztas;

    async fn fetch_cached(&self) -> Result<Vec<Mulasztas>, AppError> {
        self.backend.fetch_mulasztasok(FetchMode::Cached).await
    }

    async fn fetch_live(&self) -> Result<Vec<Mulasztas>, AppError> {
        self.backend.fetch_mulasztasok(FetchMode::Live).await
    }

    async fn is_registered(&self) -> Result<bool, AppError> {
        Ok(self.backend.fetch_registration_status().await?.registered)
    }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub auto_sync: bool,
    pub delay: Duration,
    pub require_registration: bool,
    pub sync_type: SyncType,
}

impl SyncOptions {
    pub fn from_config(config: &ClientConfig, sync_type: SyncType) -> Self {
        Self {
            auto_sync: config.auto_sync,
            delay: config.sync_delay,
            require_registration: config.require_registration,
            sync_type,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            auto_sync: true,
            delay: Duration::from_millis(crate::config::DEFAULT_SYNC_DELAY_MS),
            require_registration: false,
            sync_type: SyncType::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    LoadingCached,
    ReadyCached,
    SyncingLive,
    ReadyLive,
    SyncFailed,
    CachedFailed,
}

/// What observers see. `data` keeps the last good result across failures.
#[derive(Debug, Clone)]
pub struct SyncState<T> {
    pub phase: SyncPhase,
    pub data: Option<Vec<T>>,
    pub is_live: bool,
    pub metadata: SyncMetadata,
    pub error: Option<String>,
    pub not_registered: bool,
}

impl<T> SyncState<T> {
    fn new(sync_type: SyncType) -> Self {
        Self {
            phase: SyncPhase::Idle,
            data: None,
            is_live: false,
            metadata: SyncMetadata::never(sync_type),
            error: None,
            not_registered: false,
        }
    }

    pub fn item_count(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Synced { items: usize },
    Cached { items: usize },
    AlreadySyncing,
    NotRegistered,
    Failed { message: String },
}

struct SyncGuard<'a>(&'a AtomicBool);

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Shows cached data first and replaces it with live data once fetched.
pub struct SyncService<S: SyncSource> {
    source: S,
    options: SyncOptions,
    state: watch::Sender<SyncState<S::Item>>,
    syncing: AtomicBool,
    auto_sync_halted: AtomicBool,
    next_ticket: AtomicU64,
    live_ticket: AtomicU64,
}

impl<S> SyncService<S>
where
    S: SyncSource + 'static,
{
    pub fn new(source: S, options: SyncOptions) -> Arc<Self> {
        let (state, _) = watch::channel(SyncState::new(options.sync_type));
        Arc::new(Self {
            source,
            options,
            state,
            syncing: AtomicBool::new(false),
            auto_sync_halted: AtomicBool::new(false),
            next_ticket: AtomicU64::new(1),
            live_ticket: AtomicU64::new(0),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState<S::Item>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SyncState<S::Item> {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> SyncPhase {
        self.state.borrow().phase
    }

    pub fn data(&self) -> Option<Vec<S::Item>> {
        self.state.borrow().data.clone()
    }

    pub fn metadata(&self) -> SyncMetadata {
        self.state.borrow().metadata.clone()
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst)
    }

    /// Loads the cached tier and schedules the first live sync. A failed
    /// cached load is terminal and returned to the caller.
    pub async fn mount(self: &Arc<Self>) -> Result<Option<JoinHandle<SyncOutcome>>, AppError> {
        self.load_cached().await?;

        if self.options.auto_sync {
            let scheduler = SyncScheduler::new(self.clone(), self.options.delay);
            Ok(Some(scheduler.spawn()))
        } else {
            Ok(None)
        }
    }

    /// Re-reads the cached tier, then runs a live sync when auto-sync is on.
    /// `Cached` reports the item count actually on screen afterwards.
    pub async fn refresh(&self) -> SyncOutcome {
        let items = match self.load_cached().await {
            Ok(items) => items,
            Err(e) => {
                return SyncOutcome::Failed {
                    message: e.to_string(),
                };
            }
        };

        if self.options.auto_sync {
            self.sync_now().await
        } else {
            SyncOutcome::Cached { items }
        }
    }

    /// Runs a live sync unless one is already in flight.
    pub async fn sync_now(&self) -> SyncOutcome {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("{} sync already in progress, skipping", self.options.sync_type.as_str());
            return SyncOutcome::AlreadySyncing;
        }
        let _guard = SyncGuard(&self.syncing);

        self.run_live_sync().await
    }

    /// Entry point for scheduled syncs; stays quiet once the user turned out
    /// not to be registered.
    pub async fn auto_sync(&self) -> SyncOutcome {
        if self.auto_sync_halted.load(Ordering::SeqCst) {
            return SyncOutcome::NotRegistered;
        }
        self.sync_now().await
    }

    async fn load_cached(&self) -> Result<usize, AppError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| {
            if s.data.is_none() {
                s.phase = SyncPhase::LoadingCached;
            }
        });

        match self.source.fetch_cached().await {
            Ok(items) => {
                let count = items.len();
                let mut visible = count;
                let mut dropped = false;
                self.state.send_modify(|s| {
                    // read under the channel lock so a concurrent live write cannot slip in
                    if self.live_ticket.load(Ordering::SeqCst) > ticket {
                        visible = s.item_count();
                        dropped = true;
                        return;
                    }
                    s.data = Some(items);
                    s.is_live = false;
                    s.error = None;
                    if s.phase != SyncPhase::SyncingLive {
                        s.phase = SyncPhase::ReadyCached;
                    }
                });
                if dropped {
                    info!("dropped {} cached items, newer live data already shown", count);
                } else {
                    info!("loaded {} cached items", count);
                }
                Ok(visible)
            }
            Err(e) => {
                error!("cached fetch failed: {}", e);
                let message = e.to_string();
                self.state.send_modify(|s| {
                    s.error = Some(message);
                    if s.data.is_none() {
                        s.phase = SyncPhase::CachedFailed;
                    }
                });
                Err(e)
            }
        }
    }

    async fn run_live_sync(&self) -> SyncOutcome {
        if self.options.require_registration {
            match self.source.is_registered().await {
                Ok(true) => {
                    self.auto_sync_halted.store(false, Ordering::SeqCst);
                }
                Ok(false) => {
                    info!("not registered with FTV, skipping live sync");
                    self.auto_sync_halted.store(true, Ordering::SeqCst);
                    self.state.send_modify(|s| s.not_registered = true);
                    return SyncOutcome::NotRegistered;
                }
                Err(e) => {
                    warn!("registration check failed: {}", e);
                    return self.record_failure(e);
                }
            }
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| s.phase = SyncPhase::SyncingLive);
        info!("starting live {} sync", self.options.sync_type.as_str());

        match self.source.fetch_live().await {
            Ok(items) => {
                let count = items.len();
                self.state.send_modify(|s| {
                    self.live_ticket.fetch_max(ticket, Ordering::SeqCst);
                    s.data = Some(items);
                    s.is_live = true;
                    s.error = None;
                    s.not_registered = false;
                    s.phase = SyncPhase::ReadyLive;
                    s.metadata.record(SyncStatus::Success);
                });
                info!("live sync completed with {} items", count);
                SyncOutcome::Synced { items: count }
            }
            Err(e) => {
                error!("live sync failed: {}", e);
                self.record_failure(e)
            }
        }
    }

    fn record_failure(&self, e: AppError) -> SyncOutcome {
        let message = e.to_string();
        self.state.send_modify(|s| {
            s.error = Some(message.clone());
            s.phase = SyncPhase::SyncFailed;
            s.metadata.record(SyncStatus::Failed);
        });
        SyncOutcome::Failed { message }
    }
}
