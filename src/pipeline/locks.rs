//! Per-namespace build/query exclusion
//!
//! An entry exists only while a build holds or waits for it; queries and
//! status checks look entries up without creating them.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// One `RwLock` per namespace: builds take the write half, queries the read half
#[derive(Debug, Default)]
pub struct NamespaceLocks {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl NamespaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the lock for a namespace; pair with `release`
    pub async fn acquire(&self, namespace: &str) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Look up a namespace's lock without creating one
    pub async fn peek(&self, namespace: &str) -> Option<Arc<RwLock<()>>> {
        self.locks.lock().await.get(namespace).cloned()
    }

    /// Hand back a lock from `acquire`, dropping the entry once nobody else holds it
    pub async fn release(&self, namespace: &str, lock: Arc<RwLock<()>>) {
        let mut locks = self.locks.lock().await;
        drop(lock);
        if locks
            .get(namespace)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(namespace);
        }
    }

    /// Number of namespaces with a live entry
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_namespace_shares_lock() {
        let locks = NamespaceLocks::new();
        let a = locks.acquire("Astro").await;
        let b = locks.acquire("Astro").await;
        assert!(Arc::ptr_eq(&a, &b));

        let _write = a.write().await;
        assert!(b.try_read().is_err());

        let peeked = locks.peek("Astro").await.unwrap();
        assert!(peeked.try_read().is_err());
    }

    #[tokio::test]
    async fn test_namespaces_are_independent() {
        let locks = NamespaceLocks::new();
        let astro = locks.acquire("Astro").await;
        let ghost = locks.acquire("Ghost").await;

        let _write = astro.write().await;
        assert!(ghost.try_read().is_ok());
    }

    #[tokio::test]
    async fn test_peek_does_not_create_entries() {
        let locks = NamespaceLocks::new();
        for i in 0..100 {
            assert!(locks.peek(&format!("Ghost{}", i)).await.is_none());
        }
        assert!(locks.is_empty().await);
    }

    #[tokio::test]
    async fn test_release_drops_unused_entry() {
        let locks = NamespaceLocks::new();
        let first = locks.acquire("Astro").await;
        let second = locks.acquire("Astro").await;

        // Another holder keeps the entry alive
        locks.release("Astro", first).await;
        assert_eq!(locks.len().await, 1);

        locks.release("Astro", second).await;
        assert!(locks.is_empty().await);
        assert!(locks.peek("Astro").await.is_none());
    }
}
