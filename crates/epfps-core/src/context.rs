//! The state container handed to every consumer of client state.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError, Credentials};
use crate::cache::{AcademicYearContext, ConfigCache, SessionCache};
use crate::config::Settings;
use crate::models::SessionPayload;
use crate::storage::{DetachedStore, FileStore, SharedStore};

/// All client-side caches, sharing one storage medium.
///
/// Clone is cheap; clones observe the same state.
#[derive(Clone)]
pub struct AppContext {
    pub config: ConfigCache,
    pub session: SessionCache,
    pub academic_year: AcademicYearContext,
    store: SharedStore,
}

impl AppContext {
    /// Restore every cache from `store`.
    pub fn open(store: SharedStore) -> Self {
        Self {
            config: ConfigCache::open(store.clone()),
            session: SessionCache::open(store.clone()),
            academic_year: AcademicYearContext::open(store.clone()),
            store,
        }
    }

    /// Open the file store from settings, falling back to memory-only state
    /// when no state directory is usable.
    pub fn from_settings(settings: &Settings) -> Self {
        let store: SharedStore = match settings.state_dir().and_then(|dir| FileStore::open(dir)) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!(error = %e, "Persistent storage unavailable, state will not survive restarts");
                Arc::new(DetachedStore)
            }
        };
        Self::open(store)
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_available()
    }

    /// Sign in and record the user. Profile details are fetched best-effort.
    pub async fn sign_in(&self, api: &ApiClient, credentials: &Credentials) -> Result<SessionPayload> {
        let payload = api.sign_in(credentials).await?;
        self.session.set_user(payload.clone()).await;

        match api
            .with_token(payload.access_token.clone())
            .fetch_user_details()
            .await
        {
            Ok(info) => self.session.set_user_detailed(info).await,
            Err(e) => warn!(error = %e, "Signed in but failed to fetch user details"),
        }

        Ok(payload)
    }

    /// Ask the server whether the stored session is still valid.
    pub async fn verify_session(&self, api: &ApiClient) -> Result<String, ApiError> {
        let token = self
            .session
            .access_token()
            .await
            .ok_or(ApiError::Unauthorized)?;
        api.with_token(token).verify_session().await
    }

    /// Forget the user and the cached reference data.
    pub async fn sign_out(&self) {
        self.session.clear_user().await;
        self.config.reset_config().await;
        info!("Signed out");
    }
}
