//! Per-user critical sections.
//!
//! Each user id maps to its own async mutex. Holding a user's guard means no
//! other economy command for that user is between its ledger reads and writes.
//! Commands for different users never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-user mutexes
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `user_id`, released when the guard drops.
    pub async fn lock(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let user_lock = {
            let mut locks = self.locks.lock().await;
            // Entries nobody else holds are dropped so the map does not grow forever
            locks.retain(|id, lock| id == user_id || Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(user_id.to_string()).or_default())
        };
        user_lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_user_is_exclusive() {
        let locks = UserLocks::new();
        let guard = locks.lock("u1").await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.lock("u1")).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.lock("u1")).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_different_users_do_not_block() {
        let locks = UserLocks::new();
        let _guard = locks.lock("u1").await;
        let other = tokio::time::timeout(Duration::from_millis(50), locks.lock("u2")).await;
        assert!(other.is_ok());
    }
}
