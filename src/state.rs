use std::sync::Arc;

use crate::api::{ApiHttpClient, Backend, Credentials};
use crate::config::ClientConfig;
use crate::db::LocalStore;
use crate::error::AppError;
use crate::session::LogoutOnAuthError;

/// Everything a command needs, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub credentials: Credentials,
    pub backend: Arc<dyn Backend>,
    pub store: LocalStore,
}

impl AppState {
    pub async fn init(config: ClientConfig) -> Result<Self, AppError> {
        let store = LocalStore::connect(&config.local_db_url).await?;

        let token = match &config.api_token {
            Some(token) => Some(token.clone()),
            None => store.auth_token().await?,
        };
        let credentials = Credentials::new(token);

        let client = ApiHttpClient::new(&config, credentials.clone())?
            .with_auth_error_handler(Arc::new(
                LogoutOnAuthError::new(credentials.clone()).with_store(store.clone()),
            ));

        Ok(Self {
            config,
            credentials,
            backend: Arc::new(client),
            store,
        })
    }
}
