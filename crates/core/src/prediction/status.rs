//! Per-user job status table.
//!
//! One entry per username holding the currently live token and whether the
//! job behind it has signalled completion. Registering a new job overwrites
//! the entry, which makes every older token stale.
//!
//! Writers that must not interleave with a re-registration (clearing a
//! user's results, pushing results under a token) hold the user's
//! [`UserGuard`] for the whole check-and-write.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::types::Timestamp;

/// Status of the most recently registered job for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub token: String,
    pub complete: bool,
    pub registered_at: Timestamp,
}

/// Exclusive hold on one user's job state, released on drop.
pub type UserGuard = OwnedMutexGuard<()>;

/// Process-wide table of job statuses keyed by username.
///
/// Thread-safe via interior `RwLock`; wrap in `Arc` and share it across
/// handlers and supervisors. Entries are only removed by
/// [`evict_older_than`](Self::evict_older_than).
#[derive(Debug, Default)]
pub struct JobStatusTable {
    entries: RwLock<HashMap<String, JobStatus>>,
    last_token: AtomicI64,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl JobStatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive hold on `user`'s job state.
    ///
    /// Token reads stay lock-free; the guard only serializes writers against
    /// each other.
    pub async fn lock_user(&self, user: &str) -> UserGuard {
        let lock = {
            let mut locks = self.user_locks.lock().await;
            Arc::clone(locks.entry(user.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Mint a fresh token for `user` and store it as incomplete.
    ///
    /// Any previous entry for the user is overwritten.
    pub async fn register(&self, user: &str) -> String {
        let token = self.next_token();
        let status = JobStatus {
            token: token.clone(),
            complete: false,
            registered_at: Utc::now(),
        };
        if let Some(previous) = self.entries.write().await.insert(user.to_string(), status) {
            tracing::debug!(user, stale_token = %previous.token, "Superseded previous prediction job");
        }
        token
    }

    /// Mark the job complete if `token` is still the live token for `user`.
    ///
    /// Returns `false` (and changes nothing) for stale or unknown tokens.
    pub async fn mark_complete(&self, user: &str, token: &str) -> bool {
        match self.entries.write().await.get_mut(user) {
            Some(status) if status.token == token => {
                status.complete = true;
                true
            }
            _ => false,
        }
    }

    /// Whether `token` is the live token for `user`.
    pub async fn is_current(&self, user: &str, token: &str) -> bool {
        self.entries
            .read()
            .await
            .get(user)
            .is_some_and(|status| status.token == token)
    }

    /// Completion flag for `user`; `false` when no job was registered.
    pub async fn is_complete(&self, user: &str) -> bool {
        self.entries
            .read()
            .await
            .get(user)
            .is_some_and(|status| status.complete)
    }

    /// Copy of the entry for `user`, read under a single lock.
    pub async fn snapshot(&self, user: &str) -> Option<JobStatus> {
        self.entries.read().await.get(user).cloned()
    }

    /// Drop every entry registered before `cutoff`. Returns how many went.
    pub async fn evict_older_than(&self, cutoff: Timestamp) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, status| status.registered_at >= cutoff);
        let evicted = before - entries.len();

        // Drop locks of users without an entry that nobody is holding.
        self.user_locks
            .lock()
            .await
            .retain(|user, lock| entries.contains_key(user) || Arc::strong_count(lock) > 1);

        evicted
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Millisecond wall-clock token, strictly increasing within the table.
    fn next_token(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_token
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
                Some(now.max(prev + 1))
            })
            .unwrap_or(now);
        now.max(previous + 1).to_string()
    }
}
