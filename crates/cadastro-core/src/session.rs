//! Session invalidation registry
//!
//! Two strategies decide whether a signed token is still acceptable:
//!
//! - [`RevocationList`]: logged-out tokens are kept in memory until their
//!   own expiry passes.
//! - [`StampedSessions`]: the last issued token is stamped on the account;
//!   a token nobody carries is invalid. A new login supersedes the previous
//!   token, and so does logout.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::SessionStrategy;
use crate::store::CredentialStore;
use crate::Result;

/// Current UNIX time in seconds
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Tracks which tokens must no longer be accepted
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Called after a token has been signed for `user_id`
    async fn record_issued(&self, user_id: i64, token: &str, expires_at: u64) -> Result<()>;

    /// Make `token` unacceptable from now on
    async fn invalidate(&self, token: &str, expires_at: u64) -> Result<()>;

    async fn is_invalidated(&self, token: &str) -> Result<bool>;

    fn strategy(&self) -> SessionStrategy;
}

// ============================================================================
// Revocation list
// ============================================================================

/// In-memory set of revoked tokens, each kept until its expiry
#[derive(Debug, Default)]
pub struct RevocationList {
    revoked: RwLock<HashMap<String, u64>>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries whose token has already expired; returns how many went
    pub async fn purge_expired(&self) -> usize {
        let mut revoked = self.revoked.write().await;
        Self::purge_locked(&mut revoked, unix_now())
    }

    pub async fn len(&self) -> usize {
        self.revoked.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.revoked.read().await.is_empty()
    }

    /// Tokens are still accepted by signature checks during their `exp`
    /// second, so an entry lives until `now` is strictly past it.
    fn purge_locked(revoked: &mut HashMap<String, u64>, now: u64) -> usize {
        let before = revoked.len();
        revoked.retain(|_, expires_at| *expires_at >= now);
        before - revoked.len()
    }
}

#[async_trait]
impl SessionRegistry for RevocationList {
    async fn record_issued(&self, _user_id: i64, _token: &str, _expires_at: u64) -> Result<()> {
        Ok(())
    }

    async fn invalidate(&self, token: &str, expires_at: u64) -> Result<()> {
        let mut revoked = self.revoked.write().await;
        let purged = Self::purge_locked(&mut revoked, unix_now());
        if purged > 0 {
            debug!(purged, "Purged expired revocation entries");
        }
        revoked.insert(token.to_string(), expires_at);
        Ok(())
    }

    async fn is_invalidated(&self, token: &str) -> Result<bool> {
        Ok(self.revoked.read().await.contains_key(token))
    }

    fn strategy(&self) -> SessionStrategy {
        SessionStrategy::RevocationList
    }
}

// ============================================================================
// Stamped sessions
// ============================================================================

/// Validity derived from the token stamped on the credential record
pub struct StampedSessions {
    credentials: Arc<dyn CredentialStore>,
}

impl StampedSessions {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl SessionRegistry for StampedSessions {
    async fn record_issued(&self, user_id: i64, token: &str, _expires_at: u64) -> Result<()> {
        self.credentials.stamp_token(user_id, token).await
    }

    async fn invalidate(&self, token: &str, _expires_at: u64) -> Result<()> {
        let cleared = self.credentials.clear_token(token).await?;
        if !cleared {
            debug!("Invalidated token was not stamped on any account");
        }
        Ok(())
    }

    async fn is_invalidated(&self, token: &str) -> Result<bool> {
        Ok(!self.credentials.token_exists(token).await?)
    }

    fn strategy(&self) -> SessionStrategy {
        SessionStrategy::Stamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCredentialStore;

    #[tokio::test]
    async fn test_revocation_list_invalidate() {
        let registry = RevocationList::new();
        let expires_at = unix_now() + 3600;

        assert!(!registry.is_invalidated("tok").await.unwrap());
        registry.invalidate("tok", expires_at).await.unwrap();
        assert!(registry.is_invalidated("tok").await.unwrap());
        assert!(!registry.is_invalidated("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_revocation_list_purges_expired() {
        let registry = RevocationList::new();
        let now = unix_now();

        registry.invalidate("old", now.saturating_sub(10)).await.unwrap();
        registry.invalidate("live", now + 3600).await.unwrap();

        // "old" was already expired when "live" was inserted
        assert_eq!(registry.len().await, 1);
        assert!(!registry.is_invalidated("old").await.unwrap());
        assert!(registry.is_invalidated("live").await.unwrap());

        registry.invalidate("stale", now.saturating_sub(1)).await.unwrap();
        assert_eq!(registry.purge_expired().await, 1);
        assert_eq!(registry.len().await, 1);
    }

    #[test]
    fn test_purge_keeps_entry_during_expiry_second() {
        let now = 1_700_000_000;
        let mut revoked = HashMap::from([
            ("last-second".to_string(), now),
            ("gone".to_string(), now - 1),
        ]);

        assert_eq!(RevocationList::purge_locked(&mut revoked, now), 1);
        assert!(revoked.contains_key("last-second"));

        assert_eq!(RevocationList::purge_locked(&mut revoked, now + 1), 1);
        assert!(revoked.is_empty());
    }

    #[tokio::test]
    async fn test_stamped_sessions_single_session() {
        let credentials = Arc::new(MemoryCredentialStore::new());
        let user = credentials.create("admin", "hash").await.unwrap();
        let registry = StampedSessions::new(credentials.clone());

        // never issued
        assert!(registry.is_invalidated("first").await.unwrap());

        registry.record_issued(user.id, "first", 0).await.unwrap();
        assert!(!registry.is_invalidated("first").await.unwrap());

        // a second login supersedes the first token
        registry.record_issued(user.id, "second", 0).await.unwrap();
        assert!(registry.is_invalidated("first").await.unwrap());
        assert!(!registry.is_invalidated("second").await.unwrap());

        registry.invalidate("second", 0).await.unwrap();
        assert!(registry.is_invalidated("second").await.unwrap());
        assert_eq!(registry.strategy(), SessionStrategy::Stamped);
    }
}
