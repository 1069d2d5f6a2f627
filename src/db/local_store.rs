use std::str::FromStr;

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::{Notification, Theme};

const THEME_KEY: &str = "theme";
const AUTH_TOKEN_KEY: &str = "auth_token";

/// Device-local preferences: theme, auth token and dismissed notifications.
#[derive(Clone)]
pub struct LocalStore {
    db: SqlitePool,
}

impl LocalStore {
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(db).await
    }

    pub async fn in_memory() -> Result<Self, AppError> {
        Self::connect("sqlite::memory:").await
    }

    pub async fn from_pool(db: SqlitePool) -> Result<Self, AppError> {
        sqlx::migrate!("./migrations").run(&db).await?;
        Ok(Self { db })
    }

    async fn preference(&self, key: &str) -> Result<Option<String>, AppError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM preferences WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(value)
    }

    async fn set_preference(&self, key: &str, value: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO preferences (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn theme(&self) -> Result<Theme, AppError> {
        let stored = self.preference(THEME_KEY).await?;
        Ok(match stored.as_deref() {
            Some(raw) => Theme::parse(raw).unwrap_or_else(|| {
                warn!("Ignoring unknown stored theme: {}", raw);
                Theme::default()
            }),
            None => Theme::default(),
        })
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), AppError> {
        self.set_preference(THEME_KEY, theme.as_str()).await
    }

    pub async fn auth_token(&self) -> Result<Option<String>, AppError> {
        self.preference(AUTH_TOKEN_KEY).await
    }

    pub async fn set_auth_token(&self, token: &str) -> Result<(), AppError> {
        self.set_preference(AUTH_TOKEN_KEY, token).await
    }

    pub async fn clear_auth_token(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM preferences WHERE key = ?1")
            .bind(AUTH_TOKEN_KEY)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn dismiss_notification(&self, id: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("INSERT OR IGNORE INTO dismissed_notifications (id, dismissed_at) VALUES (?1, ?2)")
            .bind(id)
            .bind(now)
            .execute(&self.db)
            .await?;
        debug!("dismissed notification {}", id);
        Ok(())
    }

    pub async fn dismissed_notifications(&self) -> Result<Vec<String>, AppError> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM dismissed_notifications ORDER BY dismissed_at, id")
                .fetch_all(&self.db)
                .await?;
        Ok(ids)
    }

    /// Drops every notification the user has already dismissed.
    pub async fn visible_notifications(
        &self,
        notifications: Vec<Notification>,
    ) -> Result<Vec<Notification>, AppError> {
        let dismissed = self.dismissed_notifications().await?;
        Ok(notifications
            .into_iter()
            .filter(|n| !dismissed.contains(&n.id))
            .collect())
    }
}
