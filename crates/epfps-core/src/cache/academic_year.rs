use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::storage::{Persisted, SharedStore};

/// Storage key of the year-change flag
pub const ACADEMIC_YEAR_STORAGE_KEY: &str = "academic-year-storage";

/// How long the loading overlay stays up after the post-switch reload.
pub const YEAR_CHANGE_RESET_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePhase {
    Idle,
    Changing,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AcademicYearState {
    #[serde(default)]
    is_changing_year: bool,
}

/// Flag raised right before the reload that follows an academic-year switch.
#[derive(Clone)]
pub struct AcademicYearContext {
    inner: Arc<RwLock<Persisted<AcademicYearState>>>,
}

impl AcademicYearContext {
    pub fn open(store: SharedStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Persisted::open(store, ACADEMIC_YEAR_STORAGE_KEY))),
        }
    }

    /// Idle -> Changing. Called by the year-switch action before reloading.
    pub async fn begin_change(&self) {
        let mut state = self.inner.write().await;
        if state.get().is_changing_year {
            debug!("Academic year change already in progress");
            return;
        }
        state.update(|s| s.is_changing_year = true);
        info!("Academic year change started");
    }

    /// Changing -> Idle
    async fn finish_change(&self) {
        self.inner
            .write()
            .await
            .update(|s| s.is_changing_year = false);
        info!("Academic year change finished");
    }

    pub async fn is_changing_year(&self) -> bool {
        self.inner.read().await.get().is_changing_year
    }

    pub async fn phase(&self) -> ChangePhase {
        if self.is_changing_year().await {
            ChangePhase::Changing
        } else {
            ChangePhase::Idle
        }
    }
}

/// Clears the year-change flag shortly after the post-switch reload.
///
/// Mounting while a change is in progress schedules the reset. Dropping the
/// handler before the delay elapses cancels it.
pub struct YearChangeHandler {
    pending: Option<JoinHandle<()>>,
}

impl YearChangeHandler {
    /// Must be called from within a tokio runtime.
    pub async fn mount(context: AcademicYearContext) -> Self {
        if !context.is_changing_year().await {
            return Self { pending: None };
        }

        debug!(delay_ms = YEAR_CHANGE_RESET_DELAY.as_millis() as u64, "Scheduling year-change reset");
        let pending = tokio::spawn(async move {
            tokio::time::sleep(YEAR_CHANGE_RESET_DELAY).await;
            context.finish_change().await;
        });

        Self {
            pending: Some(pending),
        }
    }

    /// Whether a reset is scheduled and has not run yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Wait for the scheduled reset, if any, to complete.
    ///
    /// The task stays owned by the handler while waiting, so cancelling this
    /// future still cancels the reset.
    pub async fn settled(mut self) {
        if let Some(handle) = self.pending.as_mut() {
            if let Err(e) = handle.await {
                debug!(error = %e, "Year-change reset did not complete");
            }
        }
    }
}

impl Drop for YearChangeHandler {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                debug!("Cancelling pending year-change reset");
            }
            handle.abort();
        }
    }
}
