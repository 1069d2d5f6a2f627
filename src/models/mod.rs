pub mod igazolas;
pub mod mulasztas;
pub mod notification;
pub mod profile;
pub mod schedule;
pub mod sync;

pub use igazolas::{
    Igazolas, IgazolasFilter, IgazolasStatus, NewIgazolasRequest, ReviewDecision, ReviewRequest,
    UpdateIgazolasRequest,
};
pub use mulasztas::{FetchMode, Mulasztas, MulasztasKind};
pub use notification::{Notification, Severity, Theme};
pub use profile::{Profile, RegistrationStatus, Role};
pub use schedule::{BreakType, Override, ScheduleSnapshot, SchoolBreak, StudentClass};
pub use sync::{SyncMetadata, SyncStatus, SyncType};

/// System configuration as key/value pairs.
pub type SystemConfig = std::collections::BTreeMap<String, serde_json::Value>;
