use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::{DetailedUserInfo, SessionPayload};
use crate::storage::{Persisted, SharedStore};

/// Storage key of the session document
pub const SESSION_STORAGE_KEY: &str = "user-storage";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub user: Option<SessionPayload>,
    #[serde(default)]
    pub user_detailed: Option<DetailedUserInfo>,
    /// Process-local; never written to storage.
    #[serde(skip)]
    pub is_hydrated: bool,
}

/// Local mirror of the signed-in user.
///
/// A present user only means a sign-in happened on this machine. Whether the
/// session is still valid is decided by the verification endpoint.
#[derive(Clone)]
pub struct SessionCache {
    inner: Arc<RwLock<Persisted<SessionState>>>,
}

impl SessionCache {
    /// Restore the stored session and mark the cache hydrated.
    pub fn open(store: SharedStore) -> Self {
        let mut persisted = Persisted::<SessionState>::open(store, SESSION_STORAGE_KEY);
        persisted.update_local(|s| s.is_hydrated = true);
        debug!(has_user = persisted.get().user.is_some(), "Session cache hydrated");

        Self {
            inner: Arc::new(RwLock::new(persisted)),
        }
    }

    pub async fn set_user(&self, payload: SessionPayload) {
        info!(user_id = %payload.user_id, "Session user set");
        self.inner.write().await.update(|s| s.user = Some(payload));
    }

    /// Drop the user. Detailed info and the hydration flag are left alone.
    pub async fn clear_user(&self) {
        self.inner.write().await.update(|s| s.user = None);
        info!("Session user cleared");
    }

    pub async fn set_user_detailed(&self, info: DetailedUserInfo) {
        self.inner
            .write()
            .await
            .update(|s| s.user_detailed = Some(info));
    }

    pub async fn clear_user_detailed(&self) {
        self.inner.write().await.update(|s| s.user_detailed = None);
    }

    pub async fn set_hydrated(&self, flag: bool) {
        self.inner
            .write()
            .await
            .update_local(|s| s.is_hydrated = flag);
    }

    pub async fn user(&self) -> Option<SessionPayload> {
        self.inner.read().await.get().user.clone()
    }

    pub async fn user_detailed(&self) -> Option<DetailedUserInfo> {
        self.inner.read().await.get().user_detailed.clone()
    }

    pub async fn is_hydrated(&self) -> bool {
        self.inner.read().await.get().is_hydrated
    }

    /// Bearer token of the stored user, if any
    pub async fn access_token(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .get()
            .user
            .as_ref()
            .map(|u| u.access_token.clone())
    }

    pub async fn state(&self) -> SessionState {
        self.inner.read().await.get().clone()
    }
}
