pub mod config_service;
pub mod scheduler;
pub mod sync_service;

pub use config_service::ConfigService;
pub use scheduler::SyncScheduler;
pub use sync_service::{
    MulasztasSource, SyncOptions, SyncOutcome, SyncPhase, SyncService, SyncSource, SyncState,
};
