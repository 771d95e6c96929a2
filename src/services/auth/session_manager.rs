use log::{info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::TokenClass;
use crate::security::fingerprint::fingerprint_token;
use crate::services::auth::session_store::SessionStore;
use crate::services::auth::tokens::{self, TokenError};

/// Access/refresh credential pair returned by login and refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates the refresh-token lineage per subject: issuance at login,
/// rotation-on-use with reuse detection, and invalidation on logout or
/// password change.
///
/// The session store is the single source of truth; the verify-then-rotate
/// sequence is serialized per subject by the store's compare-and-swap, so
/// exactly one of any set of concurrent refresh calls presenting the same
/// token can rotate the fingerprint.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    store_timeout: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// Bound a store call by the configured deadline. Elapsed deadlines are
    /// surfaced as the retryable infrastructure kind, distinct from the
    /// authentication error kinds.
    async fn bounded<T, F>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        tokio::time::timeout(self.store_timeout, fut)
            .await
            .map_err(|_| {
                AppError::InfrastructureTimeout("Session store call exceeded its deadline".to_string())
            })?
    }

    /// Issue a fresh access/refresh pair for an authenticated subject and
    /// store the refresh token's fingerprint, replacing any prior one. A new
    /// login therefore invalidates every previously issued refresh token for
    /// the subject (single active session).
    pub async fn login(&self, subject: Uuid) -> Result<TokenPair, AppError> {
        let access_token = tokens::mint(subject, TokenClass::Access)?;
        let refresh_token = tokens::mint(subject, TokenClass::Refresh)?;

        let fingerprint = fingerprint_token(&refresh_token);
        self.bounded(self.store.set_current_fingerprint(subject, &fingerprint))
            .await?;

        info!("session_started: subject={}", subject);
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Rotate a refresh token exactly once.
    ///
    /// The presented token must verify as a refresh credential and its
    /// fingerprint must still be the stored one; the rotation itself is a
    /// compare-and-swap from the presented fingerprint to the next one, so a
    /// concurrent loser observes the mismatch and fails. A mismatch also
    /// covers replay of an already-rotated token, which is treated as a
    /// theft signal: the session is cleared before the error is returned, so
    /// every outstanding refresh token for the subject dies with it.
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AppError> {
        let verified = tokens::verify(presented, TokenClass::Refresh).map_err(|err| match err {
            TokenError::Unavailable => {
                AppError::Configuration("Token keys not initialized".to_string())
            }
            other => AppError::InvalidToken(other.to_string()),
        })?;
        let subject = verified.subject;

        let presented_fingerprint = fingerprint_token(presented);

        let access_token = tokens::mint(subject, TokenClass::Access)?;
        let refresh_token = tokens::mint(subject, TokenClass::Refresh)?;
        let next_fingerprint = fingerprint_token(&refresh_token);

        let rotated = self
            .bounded(self.store.replace_fingerprint_if_current(
                subject,
                &presented_fingerprint,
                &next_fingerprint,
            ))
            .await?;

        if !rotated {
            warn!(
                "refresh_token_reuse_detected: subject={}, clearing session",
                subject
            );
            // Precautionary invalidation: an attacker may hold a stolen copy
            // of the current token. Failure to clear must not mask the
            // rejection.
            if let Err(e) = self.bounded(self.store.clear(subject)).await {
                warn!("session_clear_failed: subject={}, error={}", subject, e);
            }
            return Err(AppError::SessionRevoked(format!(
                "Presented refresh token is not the current one for subject {}",
                subject
            )));
        }

        info!("session_rotated: subject={}", subject);
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Clear the subject's session. Idempotent.
    pub async fn logout(&self, subject: Uuid) -> Result<(), AppError> {
        self.bounded(self.store.clear(subject)).await?;
        info!("session_ended: subject={}", subject);
        Ok(())
    }

    /// Force re-login on all devices after a password change.
    pub async fn invalidate_on_password_change(&self, subject: Uuid) -> Result<(), AppError> {
        self.bounded(self.store.clear(subject)).await?;
        info!("session_invalidated_on_password_change: subject={}", subject);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::session_store::InMemorySessionStore;
    use crate::services::auth::tokens::init_test_keys;
    use async_trait::async_trait;

    fn manager() -> (SessionManager, Arc<InMemorySessionStore>) {
        init_test_keys();
        let store = Arc::new(InMemorySessionStore::new());
        (
            SessionManager::new(store.clone(), Duration::from_secs(3)),
            store,
        )
    }

    #[tokio::test]
    async fn test_refresh_succeeds_exactly_once() {
        let (manager, _) = manager();
        let subject = Uuid::new_v4();

        let pair = manager.login(subject).await.unwrap();

        let rotated = manager.refresh(&pair.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, pair.refresh_token);

        // The rotated-away token is permanently dead, even though unexpired.
        let err = manager.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::SessionRevoked(_)));
    }

    #[tokio::test]
    async fn test_refresh_after_logout_fails() {
        let (manager, _) = manager();
        let subject = Uuid::new_v4();

        let pair = manager.login(subject).await.unwrap();
        manager.logout(subject).await.unwrap();

        let err = manager.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::SessionRevoked(_)));
    }

    #[tokio::test]
    async fn test_refresh_after_password_change_fails() {
        let (manager, _) = manager();
        let subject = Uuid::new_v4();

        let pair = manager.login(subject).await.unwrap();
        manager.invalidate_on_password_change(subject).await.unwrap();

        let err = manager.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::SessionRevoked(_)));
    }

    #[tokio::test]
    async fn test_garbage_refresh_token_is_invalid_token() {
        let (manager, _) = manager();

        let err = manager.refresh("garbage").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_access_token_cannot_be_used_to_refresh() {
        let (manager, _) = manager();
        let subject = Uuid::new_v4();

        let pair = manager.login(subject).await.unwrap();

        let err = manager.refresh(&pair.access_token).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_new_login_invalidates_previous_refresh_token() {
        let (manager, _) = manager();
        let subject = Uuid::new_v4();

        let first = manager.login(subject).await.unwrap();
        let second = manager.login(subject).await.unwrap();

        let err = manager.refresh(&first.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::SessionRevoked(_)));

        manager.refresh(&second.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_end_to_end_rotation_chain() {
        let (manager, _) = manager();
        let subject = Uuid::new_v4();

        // login -> {access, refresh}
        let pair = manager.login(subject).await.unwrap();

        // refresh(refresh) -> {access2, refresh2}, refresh2 != refresh
        let pair2 = manager.refresh(&pair.refresh_token).await.unwrap();
        assert_ne!(pair2.refresh_token, pair.refresh_token);

        // refresh(refresh) again -> SessionRevoked; the reuse also cleared
        // the session as a precaution...
        let err = manager.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::SessionRevoked(_)));

        // ...so even the current token is now dead and the subject must
        // re-login.
        let err = manager.refresh(&pair2.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::SessionRevoked(_)));

        // A fresh login starts a new lineage that rotates normally.
        let pair3 = manager.login(subject).await.unwrap();
        let pair4 = manager.refresh(&pair3.refresh_token).await.unwrap();
        assert_ne!(pair4.refresh_token, pair3.refresh_token);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_has_exactly_one_winner() {
        let (manager, store) = manager();
        let subject = Uuid::new_v4();

        let pair = manager.login(subject).await.unwrap();

        let a = {
            let manager = manager.clone();
            let token = pair.refresh_token.clone();
            tokio::spawn(async move { manager.refresh(&token).await })
        };
        let b = {
            let manager = manager.clone();
            let token = pair.refresh_token.clone();
            tokio::spawn(async move { manager.refresh(&token).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let winners: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
        assert_eq!(winners.len(), 1, "exactly one concurrent refresh must win");

        for r in &results {
            if let Err(e) = r {
                assert!(matches!(e, AppError::SessionRevoked(_)));
            }
        }

        // The loser's reuse detection clears the session, so the store must
        // be empty or consistent with the winner; either way it must not
        // contain the rotated-away fingerprint.
        let stored = store.get_current_fingerprint(subject).await.unwrap();
        let presented_fp = fingerprint_token(&pair.refresh_token);
        assert_ne!(stored.as_deref(), Some(presented_fp.as_str()));
    }

    /// Store stub whose calls never complete in time.
    struct StalledStore;

    #[async_trait]
    impl SessionStore for StalledStore {
        async fn set_current_fingerprint(&self, _: Uuid, _: &str) -> Result<(), AppError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }

        async fn get_current_fingerprint(&self, _: Uuid) -> Result<Option<String>, AppError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn replace_fingerprint_if_current(
            &self,
            _: Uuid,
            _: &str,
            _: &str,
        ) -> Result<bool, AppError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(false)
        }

        async fn clear(&self, _: Uuid) -> Result<(), AppError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stalled_store_surfaces_as_infrastructure_timeout() {
        init_test_keys();
        let manager = SessionManager::new(Arc::new(StalledStore), Duration::from_millis(20));

        let err = manager.login(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::InfrastructureTimeout(_)));
        assert!(err.is_retryable());
    }
}
