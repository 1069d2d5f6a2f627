use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::services::sync_service::{SyncOutcome, SyncService, SyncSource};

/// Runs the first live sync shortly after the cached data is on screen.
pub struct SyncScheduler<S: SyncSource> {
    service: Arc<SyncService<S>>,
    delay: Duration,
}

impl<S> SyncScheduler<S>
where
    S: SyncSource + 'static,
{
    pub fn new(service: Arc<SyncService<S>>, delay: Duration) -> Self {
        Self { service, delay }
    }

    pub fn spawn(self) -> JoinHandle<SyncOutcome> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) -> SyncOutcome {
        debug!("auto-sync scheduled in {:?}", self.delay);
        tokio::time::sleep(self.delay).await;

        let outcome = self.service.auto_sync().await;
        match &outcome {
            SyncOutcome::Synced { items } => info!("auto-sync completed with {} items", items),
            SyncOutcome::Failed { message } => warn!("auto-sync failed: {}", message),
            other => debug!("auto-sync finished: {:?}", other),
        }
        outcome
    }
}
