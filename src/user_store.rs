//! User lookup abstraction.
//!
//! The persistence layer lives outside this crate; it plugs in through
//! [`UserLookup`]. [`InMemoryUserStore`] backs tests and local tooling.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::Principal;

/// Read-only access to the shared user store.
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// Find a principal by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>>;

    /// Find a principal by id
    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>>;
}

/// Normalized form used for email lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Thread-safe in-memory user store.
pub struct InMemoryUserStore {
    /// Map from principal id to record
    users: DashMap<String, Principal>,
    /// Map from normalized email to principal id
    emails: DashMap<String, String>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
        }
    }

    /// Insert or replace a principal. The email index follows the latest
    /// insert for an address.
    pub fn insert(&self, principal: Principal) {
        let previous_email = self.users.get(&principal.id).map(|p| p.email.clone());
        if let Some(email) = previous_email {
            self.unindex_email(&email, &principal.id);
        }
        self.emails
            .insert(normalize_email(&principal.email), principal.id.clone());
        self.users.insert(principal.id.clone(), principal);
    }

    pub fn remove(&self, id: &str) -> Option<Principal> {
        let (_, principal) = self.users.remove(id)?;
        self.unindex_email(&principal.email, id);
        Some(principal)
    }

    /// Drop the index entry only while it still points at `id`.
    fn unindex_email(&self, email: &str, id: &str) {
        self.emails
            .remove_if(&normalize_email(email), |_, owner| owner == id);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserLookup for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>> {
        let Some(id) = self
            .emails
            .get(&normalize_email(email))
            .map(|entry| entry.value().clone())
        else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>> {
        Ok(self.users.get(id).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_by_email_and_id() {
        let store = InMemoryUserStore::new();
        store.insert(Principal::new("u1", "Alice@Example.com"));

        let by_email = store.find_by_email(" alice@example.COM ").await.unwrap();
        assert_eq!(by_email.unwrap().id, "u1");

        let by_id = store.find_by_id("u1").await.unwrap();
        assert_eq!(by_id.unwrap().email, "Alice@Example.com");

        assert!(store.find_by_email("bob@example.com").await.unwrap().is_none());
        assert!(store.find_by_id("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_updates_email_index() {
        let store = InMemoryUserStore::new();
        store.insert(Principal::new("u1", "old@example.com"));
        store.insert(Principal::new("u1", "new@example.com").with_admin(true));

        assert_eq!(store.len(), 1);
        assert!(store.find_by_email("old@example.com").await.unwrap().is_none());
        let user = store.find_by_email("new@example.com").await.unwrap().unwrap();
        assert!(user.is_admin);
    }

    #[tokio::test]
    async fn test_shared_email_survives_removal_of_previous_owner() {
        let store = InMemoryUserStore::new();
        store.insert(Principal::new("u1", "x@b.com"));
        store.insert(Principal::new("u2", "X@b.com"));

        assert!(store.remove("u1").is_some());
        let user = store.find_by_email("x@b.com").await.unwrap();
        assert_eq!(user.unwrap().id, "u2");

        // moving u1 to another address leaves u2's entry alone
        store.insert(Principal::new("u1", "y@b.com"));
        store.insert(Principal::new("u1", "z@b.com"));
        assert_eq!(store.find_by_email("x@b.com").await.unwrap().unwrap().id, "u2");
        assert!(store.find_by_email("y@b.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryUserStore::new();
        store.insert(Principal::new("u1", "a@b.com"));

        assert!(store.remove("u1").is_some());
        assert!(store.is_empty());
        assert!(store.find_by_email("a@b.com").await.unwrap().is_none());
        assert!(store.remove("u1").is_none());
    }
}
