//! Per-user conversation context.
//!
//! The context is the short-lived memory of the last candidate list a user
//! was shown, so a follow-up "position 2" can be resolved. Each user key
//! owns exactly one context; `set` replaces the list wholesale (indices are
//! the list positions, 1-based, stable until the next `set`), and contexts
//! expire after an inactivity window. The store also parks a pending
//! annotation action between turns: a note awaiting its text, or a
//! disambiguation awaiting an ordinal choice.
//!
//! All reads hand out snapshots cloned under the lock, so a resolver never
//! observes a context mid-overwrite.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use records::RecordType;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Default inactivity window before a context expires.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Default maximum number of user keys to track before LRU eviction.
const DEFAULT_MAX_USERS: usize = 10_000;

/// One displayed candidate: position is its 1-based index in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Catalog identifier (card key or URL).
    pub wine_id: String,
    /// Short label shown to the user (name, producer, year).
    pub label: String,
}

/// An annotation action spanning more than one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    /// What the user wants to attach.
    pub record_type: RecordType,
    /// Note text captured early, applied once the wine is chosen.
    pub note_content: Option<String>,
    /// Wines already chosen, awaiting note text.
    pub selected: Vec<ContextEntry>,
}

#[derive(Debug)]
struct UserContext {
    entries: Vec<ContextEntry>,
    pending: Option<PendingAction>,
    touched: Instant,
}

/// Keyed store of per-user contexts with TTL expiry and LRU eviction.
///
/// One lock guards the whole map: writers replace a user's list in a single
/// critical section, readers clone a snapshot out — single-writer-at-a-time
/// per key falls out of that.
#[derive(Debug)]
pub struct ContextStore {
    inner: RwLock<IndexMap<String, UserContext>>,
    ttl: Duration,
    max_users: usize,
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ContextStore {
    /// Create a store with the given inactivity window.
    pub fn new(ttl: Duration) -> Self {
        Self::with_limits(ttl, DEFAULT_MAX_USERS)
    }

    /// Create a store with custom limits.
    pub fn with_limits(ttl: Duration, max_users: usize) -> Self {
        Self {
            inner: RwLock::new(IndexMap::new()),
            ttl,
            max_users: max_users.max(1),
        }
    }

    /// Snapshot of the current candidate list, if one is live.
    ///
    /// Marks the user as recently used; an expired context is dropped here.
    pub async fn get(&self, user_key: &str) -> Option<Vec<ContextEntry>> {
        let mut inner = self.inner.write().await;
        let context = Self::touch(&mut inner, user_key, self.ttl)?;
        if context.entries.is_empty() {
            None
        } else {
            Some(context.entries.clone())
        }
    }

    /// Replace the candidate list wholesale for a user.
    pub async fn set(&self, user_key: &str, entries: Vec<ContextEntry>) {
        let mut inner = self.inner.write().await;
        let pending = Self::touch(&mut inner, user_key, self.ttl).and_then(|c| c.pending.take());
        inner.insert(
            user_key.to_string(),
            UserContext {
                entries,
                pending,
                touched: Instant::now(),
            },
        );
        while inner.len() > self.max_users {
            inner.shift_remove_index(0);
        }
    }

    /// Drop a user's context entirely.
    pub async fn clear(&self, user_key: &str) {
        let mut inner = self.inner.write().await;
        inner.shift_remove(user_key);
    }

    /// Snapshot of the pending action, if any.
    pub async fn pending(&self, user_key: &str) -> Option<PendingAction> {
        let mut inner = self.inner.write().await;
        Self::touch(&mut inner, user_key, self.ttl)?.pending.clone()
    }

    /// Park a pending action for the user, keeping the candidate list.
    pub async fn set_pending(&self, user_key: &str, action: PendingAction) {
        let mut inner = self.inner.write().await;
        match Self::touch(&mut inner, user_key, self.ttl) {
            Some(context) => context.pending = Some(action),
            None => {
                inner.insert(
                    user_key.to_string(),
                    UserContext {
                        entries: Vec::new(),
                        pending: Some(action),
                        touched: Instant::now(),
                    },
                );
                while inner.len() > self.max_users {
                    inner.shift_remove_index(0);
                }
            }
        }
    }

    /// Remove and return the pending action.
    pub async fn take_pending(&self, user_key: &str) -> Option<PendingAction> {
        let mut inner = self.inner.write().await;
        Self::touch(&mut inner, user_key, self.ttl)?.pending.take()
    }

    /// Number of live user contexts (tests and /health).
    pub async fn user_count(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Refresh LRU order for a key, dropping it if expired.
    fn touch<'a>(
        inner: &'a mut IndexMap<String, UserContext>,
        user_key: &str,
        ttl: Duration,
    ) -> Option<&'a mut UserContext> {
        let mut context = inner.shift_remove(user_key)?;
        if context.touched.elapsed() >= ttl {
            return None;
        }
        context.touched = Instant::now();
        inner.insert(user_key.to_string(), context);
        inner.last_mut().map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(labels: &[&str]) -> Vec<ContextEntry> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| ContextEntry {
                wine_id: format!("w{}", i + 1),
                label: (*label).to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_set_replaces_wholesale() {
        let store = ContextStore::default();
        store.set("u1", entries(&["A", "B", "C"])).await;
        store.set("u1", entries(&["D"])).await;

        let list = store.get("u1").await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].label, "D");
    }

    #[tokio::test]
    async fn test_contexts_are_per_user() {
        let store = ContextStore::default();
        store.set("u1", entries(&["A"])).await;
        store.set("u2", entries(&["B"])).await;

        assert_eq!(store.get("u1").await.unwrap()[0].label, "A");
        assert_eq!(store.get("u2").await.unwrap()[0].label, "B");
    }

    #[tokio::test]
    async fn test_clear_and_empty_get() {
        let store = ContextStore::default();
        assert!(store.get("u1").await.is_none());

        store.set("u1", entries(&["A"])).await;
        store.clear("u1").await;
        assert!(store.get("u1").await.is_none());
    }

    #[tokio::test]
    async fn test_expiry_drops_context() {
        let store = ContextStore::new(Duration::from_millis(10));
        store.set("u1", entries(&["A"])).await;
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(store.get("u1").await.is_none());
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let store = ContextStore::with_limits(DEFAULT_TTL, 2);
        store.set("u1", entries(&["A"])).await;
        store.set("u2", entries(&["B"])).await;
        store.set("u3", entries(&["C"])).await;

        assert!(store.get("u1").await.is_none());
        assert!(store.get("u2").await.is_some());
        assert!(store.get("u3").await.is_some());
    }

    #[tokio::test]
    async fn test_pending_survives_context_replacement() {
        let store = ContextStore::default();
        store.set("u1", entries(&["A", "B"])).await;
        store
            .set_pending(
                "u1",
                PendingAction {
                    record_type: RecordType::Note,
                    note_content: None,
                    selected: entries(&["A"]),
                },
            )
            .await;

        // A disambiguation re-seeds the list; the pending action stays.
        store.set("u1", entries(&["A", "B", "C"])).await;
        let pending = store.take_pending("u1").await.unwrap();
        assert_eq!(pending.record_type, RecordType::Note);
        assert!(store.take_pending("u1").await.is_none());
    }
}
