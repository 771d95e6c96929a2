use async_trait::async_trait;
use dashmap::DashMap;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::security::fingerprint::fingerprints_equal;

/// Persistence seam for the single active refresh-token lineage per subject.
///
/// One record per subject, holding the fingerprint of the last-issued refresh
/// token (or nothing). Records are overwritten, never appended.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Unconditionally overwrite the subject's stored fingerprint.
    async fn set_current_fingerprint(
        &self,
        subject: Uuid,
        fingerprint: &str,
    ) -> Result<(), AppError>;

    async fn get_current_fingerprint(&self, subject: Uuid) -> Result<Option<String>, AppError>;

    /// Atomic compare-and-swap: replace the stored fingerprint with `next`
    /// only if it currently equals `expected`. Returns whether the swap
    /// happened. Exactly one of any set of concurrent callers presenting the
    /// same `expected` value can win.
    async fn replace_fingerprint_if_current(
        &self,
        subject: Uuid,
        expected: &str,
        next: &str,
    ) -> Result<bool, AppError>;

    /// Drop the subject's fingerprint. Idempotent.
    async fn clear(&self, subject: Uuid) -> Result<(), AppError>;
}

/// Thread-safe in-process session store.
///
/// Suitable for single-node deployments and for the test suite. The map is
/// keyed by subject id; `replace_fingerprint_if_current` performs its
/// compare-and-swap while holding the entry's shard write lock, which
/// serializes concurrent rotations per subject.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<DashMap<Uuid, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn set_current_fingerprint(
        &self,
        subject: Uuid,
        fingerprint: &str,
    ) -> Result<(), AppError> {
        self.sessions.insert(subject, fingerprint.to_string());
        info!(
            "session_fingerprint_set: subject={}",
            subject
        );
        Ok(())
    }

    async fn get_current_fingerprint(&self, subject: Uuid) -> Result<Option<String>, AppError> {
        Ok(self.sessions.get(&subject).map(|entry| entry.value().clone()))
    }

    async fn replace_fingerprint_if_current(
        &self,
        subject: Uuid,
        expected: &str,
        next: &str,
    ) -> Result<bool, AppError> {
        // get_mut holds the shard write lock for the duration of the closure,
        // making the compare and the swap one atomic step per subject.
        match self.sessions.get_mut(&subject) {
            Some(mut entry) if fingerprints_equal(entry.value(), expected) => {
                *entry = next.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear(&self, subject: Uuid) -> Result<(), AppError> {
        self.sessions.remove(&subject);
        info!("session_cleared: subject={}", subject);
        Ok(())
    }
}
