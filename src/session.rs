use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{AuthErrorHandler, Backend, Credentials};
use crate::db::LocalStore;
use crate::error::AppError;
use crate::models::{Profile, Role, StudentClass, Theme};

/// Logged-in user state, created on login and torn down on logout.
#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    profile: Profile,
    theme: Theme,
}

impl Session {
    /// Stores the token, then loads the profile with it. A rejected token is
    /// removed from the store again.
    pub async fn login(
        token: &str,
        credentials: Credentials,
        backend: &dyn Backend,
        store: &LocalStore,
    ) -> Result<Arc<Self>, AppError> {
        if token.trim().is_empty() {
            return Err(AppError::Validation("token must not be empty".to_string()));
        }

        credentials.set(token);
        let profile = match backend.fetch_profile().await {
            Ok(profile) => profile,
            Err(e) => {
                credentials.clear();
                if e.is_auth() {
                    store.clear_auth_token().await?;
                }
                return Err(e);
            }
        };

        store.set_auth_token(token).await?;
        let theme = store.theme().await?;
        info!("logged in as {} ({:?})", profile.name, profile.role);

        Ok(Arc::new(Self {
            credentials,
            profile,
            theme,
        }))
    }

    /// Restores a session from the token persisted by an earlier login.
    pub async fn resume(
        credentials: Credentials,
        backend: &dyn Backend,
        store: &LocalStore,
    ) -> Result<Option<Arc<Self>>, AppError> {
        match store.auth_token().await? {
            Some(token) => Self::login(&token, credentials, backend, store).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn logout(&self, store: &LocalStore) -> Result<(), AppError> {
        self.credentials.clear();
        store.clear_auth_token().await?;
        info!("logged out {}", self.profile.name);
        Ok(())
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    pub fn student_class(&self) -> Option<&StudentClass> {
        self.profile.student_class.as_ref()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn can_review(&self) -> bool {
        self.profile.role >= Role::Teacher
    }

    pub fn is_admin(&self) -> bool {
        self.profile.role >= Role::Admin
    }

    /// False once the token was cleared by logout or an auth error.
    pub fn is_active(&self) -> bool {
        self.credentials.is_present()
    }
}

/// Auth error callback that drops the token so the caller falls back to the
/// login flow. With a store attached the persisted token is removed as well.
pub struct LogoutOnAuthError {
    credentials: Credentials,
    store: Option<LocalStore>,
}

impl LogoutOnAuthError {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            store: None,
        }
    }

    pub fn with_store(mut self, store: LocalStore) -> Self {
        self.store = Some(store);
        self
    }
}

impl AuthErrorHandler for LogoutOnAuthError {
    fn on_auth_error(&self, status: u16) {
        if self.credentials.is_present() {
            warn!("backend rejected credentials with {}, logging out", status);
        }
        self.credentials.clear();

        let Some(store) = self.store.clone() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = store.clear_auth_token().await {
                        warn!("failed to clear stored token: {}", e);
                    }
                });
            }
            Err(_) => warn!("no runtime available, stored token kept until logout"),
        }
    }
}
