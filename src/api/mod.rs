pub mod dto;
pub mod http;

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{
    FetchMode, Igazolas, IgazolasFilter, Mulasztas, NewIgazolasRequest, Notification, Profile,
    RegistrationStatus, ReviewRequest, ScheduleSnapshot, SyncMetadata, SyncType, SystemConfig,
    UpdateIgazolasRequest,
};

pub use http::ApiHttpClient;

#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_schedule(&self, from: NaiveDate, to: NaiveDate) -> Result<ScheduleSnapshot, AppError>;

    async fn list_igazolasok(&self, filter: &IgazolasFilter) -> Result<Vec<Igazolas>, AppError>;
    async fn get_igazolas(&self, id: i64) -> Result<Igazolas, AppError>;
    async fn create_igazolas(&self, req: &NewIgazolasRequest) -> Result<Igazolas, AppError>;
    async fn update_igazolas(&self, id: i64, req: &UpdateIgazolasRequest) -> Result<Igazolas, AppError>;
    async fn delete_igazolas(&self, id: i64) -> Result<(), AppError>;
    async fn review_igazolas(&self, id: i64, review: &ReviewRequest) -> Result<Igazolas, AppError>;

    async fn fetch_profile(&self) -> Result<Profile, AppError>;
    async fn fetch_registration_status(&self) -> Result<RegistrationStatus, AppError>;

    async fn fetch_sync_metadata(&self, sync_type: SyncType) -> Result<SyncMetadata, AppError>;
    async fn trigger_sync(&self, sync_type: SyncType) -> Result<SyncMetadata, AppError>;
    async fn fetch_mulasztasok(&self, mode: FetchMode) -> Result<Vec<Mulasztas>, AppError>;

    async fn fetch_notifications(&self) -> Result<Vec<Notification>, AppError>;

    async fn fetch_config(&self) -> Result<SystemConfig, AppError>;
    async fn update_config(&self, key: &str, value: &serde_json::Value) -> Result<(), AppError>;
}

/// Called whenever the backend answers 401 or 403.
pub trait AuthErrorHandler: Send + Sync {
    fn on_auth_error(&self, status: u16);
}

/// Shared bearer token, read on every request.
#[derive(Clone, Default, Debug)]
pub struct Credentials {
    token: Arc<RwLock<Option<String>>>,
}

impl Credentials {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token)),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn is_present(&self) -> bool {
        self.token.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

pub struct NoopBackend;

#[async_trait]
impl Backend for NoopBackend {
    async fn fetch_schedule(&self, _from: NaiveDate, _to: NaiveDate) -> Result<ScheduleSnapshot, AppError> {
        Ok(ScheduleSnapshot::default())
    }

    async fn list_igazolasok(&self, _filter: &IgazolasFilter) -> Result<Vec<Igazolas>, AppError> {
        Ok(Vec::new())
    }

    async fn get_igazolas(&self, _id: i64) -> Result<Igazolas, AppError> {
        Err(AppError::NotFound)
    }

    async fn create_igazolas(&self, req: &NewIgazolasRequest) -> Result<Igazolas, AppError> {
        req.validate()?;
        Err(AppError::NotFound)
    }

    async fn update_igazolas(&self, _id: i64, _req: &UpdateIgazolasRequest) -> Result<Igazolas, AppError> {
        Err(AppError::NotFound)
    }

    async fn delete_igazolas(&self, _id: i64) -> Result<(), AppError> {
        Ok(())
    }

    async fn review_igazolas(&self, _id: i64, _review: &ReviewRequest) -> Result<Igazolas, AppError> {
        Err(AppError::NotFound)
    }

    async fn fetch_profile(&self) -> Result<Profile, AppError> {
        Err(AppError::NotFound)
    }

    async fn fetch_registration_status(&self) -> Result<RegistrationStatus, AppError> {
        Ok(RegistrationStatus { registered: true })
    }

    async fn fetch_sync_metadata(&self, sync_type: SyncType) -> Result<SyncMetadata, AppError> {
        Ok(SyncMetadata::never(sync_type))
    }

    async fn trigger_sync(&self, sync_type: SyncType) -> Result<SyncMetadata, AppError> {
        let mut metadata = SyncMetadata::never(sync_type);
        metadata.record(crate::models::SyncStatus::Success);
        Ok(metadata)
    }

    async fn fetch_mulasztasok(&self, _mode: FetchMode) -> Result<Vec<Mulasztas>, AppError> {
        Ok(Vec::new())
    }

    async fn fetch_notifications(&self) -> Result<Vec<Notification>, AppError> {
        Ok(Vec::new())
    }

    async fn fetch_config(&self) -> Result<SystemConfig, AppError> {
        Ok(SystemConfig::new())
    }

    async fn update_config(&self, _key: &str, _value: &serde_json::Value) -> Result<(), AppError> {
        Ok(())
    }
}
