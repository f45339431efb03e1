//! Exclusive lock shared by every sync pass
//!
//! At most one sync operation runs at a time. Acquisition never waits: a
//! second caller gets `SyncInProgress` with the name and age of the running
//! operation. The lock is released when the returned guard is dropped, which
//! covers early returns, errors and panics.
//!
//! ```ignore
//! let _guard = lock.try_acquire("legacy_to_structured")?;
//! // run the pass...
//! // guard dropped here, lock released
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::errors::{SyncError, SyncResult};

#[derive(Debug, Clone, Serialize)]
pub struct ActiveOperation {
    pub operation: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Default)]
struct LockState {
    held: AtomicBool,
    active: Mutex<Option<ActiveOperation>>,
}

impl LockState {
    fn active(&self) -> MutexGuard<'_, Option<ActiveOperation>> {
        // The slot only holds plain data, a poisoned guard is still usable
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Clone, Default)]
pub struct SyncLock {
    state: Arc<LockState>,
}

/// Proof of holding the lock; releases it on drop
#[must_use = "the sync lock is released as soon as the guard is dropped"]
pub struct SyncGuard {
    state: Arc<LockState>,
}

impl SyncLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, operation: &str) -> SyncResult<SyncGuard> {
        if self
            .state
            .held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let (running, elapsed_ms) = match self.state.active().as_ref() {
                Some(current) => (
                    current.operation.clone(),
                    Utc::now()
                        .signed_duration_since(current.started_at)
                        .num_milliseconds(),
                ),
                None => ("unknown".to_string(), 0),
            };
            debug!("Rejected '{}': '{}' is running", operation, running);
            return Err(SyncError::SyncInProgress {
                operation: running,
                elapsed_ms,
            });
        }

        *self.state.active() = Some(ActiveOperation {
            operation: operation.to_string(),
            started_at: Utc::now(),
        });
        info!("Started sync operation '{}'", operation);

        Ok(SyncGuard {
            state: Arc::clone(&self.state),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.state.held.load(Ordering::Acquire)
    }

    pub fn active_operation(&self) -> Option<ActiveOperation> {
        self.state.active().clone()
    }
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        if let Some(op) = self.state.active().take() {
            let duration = Utc::now().signed_duration_since(op.started_at);
            info!(
                "Finished sync operation '{}' (took {}ms)",
                op.operation,
                duration.num_milliseconds()
            );
        }
        self.state.held.store(false, Ordering::Release);
    }
}
