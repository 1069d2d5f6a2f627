use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::dto::{ConfigUpdateRequest, ListBody};
use super::{AuthErrorHandler, Backend, Credentials};
use crate::config::ClientConfig;
use crate::error::{AppError, ErrorResponse};
use crate::models::{
    FetchMode, Igazolas, IgazolasFilter, Mulasztas, NewIgazolasRequest, Notification, Profile,
    RegistrationStatus, ReviewRequest, ScheduleSnapshot, SyncMetadata, SyncType, SystemConfig,
    UpdateIgazolasRequest,
};

pub struct ApiHttpClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
    auth_handler: Option<Arc<dyn AuthErrorHandler>>,
}

impl ApiHttpClient {
    pub fn new(config: &ClientConfig, credentials: Credentials) -> Result<Self, AppError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            credentials,
            auth_handler: None,
        })
    }

    pub fn with_auth_error_handler(mut self, handler: Arc<dyn AuthErrorHandler>) -> Self {
        self.auth_handler = Some(handler);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, AppError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| AppError::Config(format!("Invalid API url for {}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AppError> {
        let request = match self.credentials.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("authentication rejected by backend: {}", status);
            if let Some(handler) = &self.auth_handler {
                handler.on_auth_error(status.as_u16());
            }
            return Err(AppError::Unauthorized {
                status: status.as_u16(),
            });
        }

        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(ErrorResponse::into_detail)
            .unwrap_or(body);
        Err(AppError::Api {
            status: status.as_u16(),
            detail,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
        let body_text = response.text().await?;
        serde_json::from_str::<T>(&body_text).map_err(|e| {
            tracing::error!("Failed to parse backend response: {}", e);
            AppError::Decode(e)
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, AppError> {
        debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        Self::decode(response).await
    }

    async fn get_list<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, AppError> {
        let body: ListBody<T> = self.get_json(url).await?;
        Ok(body.into_items())
    }
}

#[async_trait]
impl Backend for ApiHttpClient {
    async fn fetch_schedule(&self, from: NaiveDate, to: NaiveDate) -> Result<ScheduleSnapshot, AppError> {
        let url = self.url(
            "/api/schedule",
            &[("from_date", from.to_string()), ("to_date", to.to_string())],
        )?;
        self.get_json(url).await
    }

    async fn list_igazolasok(&self, filter: &IgazolasFilter) -> Result<Vec<Igazolas>, AppError> {
        let url = self.url("/api/igazolasok", &filter.query_pairs())?;
        self.get_list(url).await
    }

    async fn get_igazolas(&self, id: i64) -> Result<Igazolas, AppError> {
        let url = self.url(&format!("/api/igazolasok/{}", id), &[])?;
        self.get_json(url).await
    }

    async fn create_igazolas(&self, req: &NewIgazolasRequest) -> Result<Igazolas, AppError> {
        req.validate()?;
        let url = self.url("/api/igazolasok", &[])?;
        let response = self.send(self.client.post(url).json(req)).await?;
        Self::decode(response).await
    }

    async fn update_igazolas(&self, id: i64, req: &UpdateIgazolasRequest) -> Result<Igazolas, AppError> {
        req.validate()?;
        let url = self.url(&format!("/api/igazolasok/{}", id), &[])?;
        let response = self.send(self.client.patch(url).json(req)).await?;
        Self::decode(response).await
    }

    async fn delete_igazolas(&self, id: i64) -> Result<(), AppError> {
        let url = self.url(&format!("/api/igazolasok/{}", id), &[])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn review_igazolas(&self, id: i64, review: &ReviewRequest) -> Result<Igazolas, AppError> {
        review.validate()?;
        let url = self.url(&format!("/api/igazolasok/{}/review", id), &[])?;
        let response = self.send(self.client.post(url).json(review)).await?;
        Self::decode(response).await
    }

    async fn fetch_profile(&self) -> Result<Profile, AppError> {
        let url = self.url("/api/profile", &[])?;
        self.get_json(url).await
    }

    async fn fetch_registration_status(&self) -> Result<RegistrationStatus, AppError> {
        let url = self.url("/api/ftv/registration-status", &[])?;
        self.get_json(url).await
    }

    async fn fetch_sync_metadata(&self, sync_type: SyncType) -> Result<SyncMetadata, AppError> {
        let url = self.url(&format!("/api/ftv/sync-metadata/{}", sync_type.as_str()), &[])?;
        self.get_json(url).await
    }

    async fn trigger_sync(&self, sync_type: SyncType) -> Result<SyncMetadata, AppError> {
        let url = self.url(&format!("/api/ftv/sync/{}", sync_type.as_str()), &[])?;
        let response = self.send(self.client.post(url)).await?;
        Self::decode(response).await
    }

    async fn fetch_mulasztasok(&self, mode: FetchMode) -> Result<Vec<Mulasztas>, AppError> {
        let url = self.url("/api/ftv/mulasztasok", &[("mode", mode.as_str().to_string())])?;
        self.get_list(url).await
    }

    async fn fetch_notifications(&self) -> Result<Vec<Notification>, AppError> {
        let url = self.url("/api/notifications", &[])?;
        self.get_list(url).await
    }

    async fn fetch_config(&self) -> Result<SystemConfig, AppError> {
        let url = self.url("/api/config", &[])?;
        self.get_json(url).await
    }

    async fn update_config(&self, key: &str, value: &serde_json::Value) -> Result<(), AppError> {
        let url = self.url("/api/config", &[])?;
        let request_body = ConfigUpdateRequest {
            key: key.to_string(),
            value: value.clone(),
        };
        self.send(self.client.patch(url).json(&request_body)).await?;
        Ok(())
    }
}
