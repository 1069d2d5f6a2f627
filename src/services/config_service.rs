use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::api::Backend;
use crate::error::AppError;
use crate::models::SystemConfig;

/// System configuration with optimistic updates.
///
/// `update` writes locally first and confirms with the backend. When the
/// backend refuses, the whole config is reloaded; if that fails too, the
/// local write is reverted.
pub struct ConfigService {
    backend: Arc<dyn Backend>,
    current: Mutex<SystemConfig>,
}

impl ConfigService {
    pub async fn load(backend: Arc<dyn Backend>) -> Result<Self, AppError> {
        let config = backend.fetch_config().await?;
        Ok(Self {
            backend,
            current: Mutex::new(config),
        })
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.lock().get(key).cloned()
    }

    pub fn snapshot(&self) -> SystemConfig {
        self.lock().clone()
    }

    pub async fn update(&self, key: &str, value: serde_json::Value) -> Result<(), AppError> {
        let previous = self.lock().insert(key.to_string(), value.clone());

        match self.backend.update_config(key, &value).await {
            Ok(()) => {
                info!("config {} updated", key);
                Ok(())
            }
            Err(e) => {
                warn!("config update for {} failed, reloading: {}", key, e);
                match self.backend.fetch_config().await {
                    Ok(fresh) => *self.lock() = fresh,
                    Err(reload_err) => {
                        warn!("config reload failed, reverting {}: {}", key, reload_err);
                        let mut current = self.lock();
                        match previous {
                            Some(old) => current.insert(key.to_string(), old),
                            None => current.remove(key),
                        };
                    }
                }
                Err(e)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SystemConfig> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}
