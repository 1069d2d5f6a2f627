use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    Base,
    User,
    Class,
}

impl SyncType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncType::Base => "base",
            SyncType::User => "user",
            SyncType::Class => "class",
        }
    }
}

impl std::str::FromStr for SyncType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(SyncType::Base),
            "user" => Ok(SyncType::User),
            "class" => Ok(SyncType::Class),
            other => Err(AppError::Validation(format!("unknown sync type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Failed,
    #[default]
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMetadata {
    #[serde(default)]
    pub last_sync_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sync_status: SyncStatus,
    pub sync_type: SyncType,
}

impl SyncMetadata {
    pub fn never(sync_type: SyncType) -> Self {
        Self {
            last_sync_time: None,
            last_sync_status: SyncStatus::Never,
            sync_type,
        }
    }

    pub fn record(&mut self, status: SyncStatus) {
        self.last_sync_time = Some(Utc::now());
        self.last_sync_status = status;
    }
}
