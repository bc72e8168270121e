//! Onboarding progress tracking
//!
//! New users are asked to catalog a handful of items before the wardrobe
//! views unlock. Sessions live in process memory only; they are bounded by
//! a TTL sweep rather than persisted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::OnboardingSettings;
use crate::error::{Result, WardrobeError};
use crate::types::{ItemId, SessionId};

/// Items needed before onboarding can finish
pub const DEFAULT_TARGET_ITEMS: u32 = 5;

/// Progress of one user's guided first run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingSession {
    pub id: SessionId,
    pub user_id: String,
    pub target_items: u32,
    pub total_items: u32,
    pub item_ids: Vec<ItemId>,
    /// True once `total_items >= target_items`
    pub can_proceed: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl OnboardingSession {
    pub fn new(user_id: impl Into<String>, target_items: u32) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            user_id: user_id.into(),
            target_items: target_items.max(1),
            total_items: 0,
            item_ids: Vec::new(),
            can_proceed: false,
            created_at: now,
            last_activity: now,
        }
    }

    /// Count `count` more cataloged items. Returns the new total.
    pub fn add_items(&mut self, count: u32, item_ids: &[ItemId]) -> u32 {
        self.total_items = self.total_items.saturating_add(count);
        for id in item_ids {
            if !self.item_ids.contains(id) {
                self.item_ids.push(*id);
            }
        }
        self.can_proceed = self.total_items >= self.target_items;
        self.last_activity = Utc::now();
        self.total_items
    }

    /// Fraction of the target reached, capped at 1.0
    pub fn progress(&self) -> f32 {
        (self.total_items as f32 / self.target_items as f32).min(1.0)
    }

    pub fn remaining(&self) -> u32 {
        self.target_items.saturating_sub(self.total_items)
    }

    fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_activity >= ttl
    }
}

/// Process-wide map of onboarding sessions
#[derive(Clone)]
pub struct OnboardingRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, OnboardingSession>>>,
    default_target: u32,
    ttl: Duration,
}

impl OnboardingRegistry {
    pub fn new(settings: &OnboardingSettings) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            default_target: settings.target_items,
            ttl: Duration::seconds(settings.session_ttl_secs.min(i64::MAX as u64) as i64),
        }
    }

    pub async fn create(&self, user_id: &str, target_items: Option<u32>) -> Result<OnboardingSession> {
        if user_id.trim().is_empty() {
            return Err(WardrobeError::Validation("user_id is required".to_string()));
        }
        let session = OnboardingSession::new(user_id, target_items.unwrap_or(self.default_target));
        debug!(
            "Created onboarding session {} for {} (target {})",
            session.id, session.user_id, session.target_items
        );
        self.sessions.write().await.insert(session.id, session.clone());
        Ok(session)
    }

    pub async fn get(&self, id: &SessionId) -> Option<OnboardingSession> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Add items to a session under the write lock
    pub async fn add_items(
        &self,
        id: &SessionId,
        count: u32,
        item_ids: &[ItemId],
    ) -> Result<OnboardingSession> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| WardrobeError::NotFound(format!("onboarding session {}", id)))?;

        let was_ready = session.can_proceed;
        session.add_items(count, item_ids);
        if session.can_proceed && !was_ready {
            info!(
                "Onboarding session {} reached its target of {} items",
                session.id, session.target_items
            );
        }
        Ok(session.clone())
    }

    pub async fn remove(&self, id: &SessionId) -> Option<OnboardingSession> {
        self.sessions.write().await.remove(id)
    }

    /// Drop sessions idle for longer than the TTL. Returns how many went.
    pub async fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.ttl, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {} idle onboarding sessions", evicted);
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Run `evict_expired` every `interval` until the task is aborted
    pub fn spawn_eviction(&self, interval: std::time::Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                registry.evict_expired().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(ttl_secs: u64) -> OnboardingSettings {
        OnboardingSettings {
            target_items: DEFAULT_TARGET_ITEMS,
            session_ttl_secs: ttl_secs,
            eviction_interval_secs: 60,
        }
    }

    #[test]
    fn test_adding_five_items_flips_can_proceed() {
        let mut session = OnboardingSession::new("user-1", 5);
        assert!(!session.can_proceed);

        session.add_items(4, &[]);
        assert!(!session.can_proceed);
        assert_eq!(session.remaining(), 1);

        session.add_items(1, &[]);
        assert!(session.can_proceed);
        assert_eq!(session.total_items, 5);
        assert_eq!(session.progress(), 1.0);
    }

    #[test]
    fn test_single_batch_of_five() {
        let mut session = OnboardingSession::new("user-1", 5);
        let ids: Vec<ItemId> = (0..5).map(|_| ItemId::new()).collect();
        assert_eq!(session.add_items(5, &ids), 5);
        assert!(session.can_proceed);
        assert_eq!(session.item_ids.len(), 5);
    }

    #[test]
    fn test_progress_is_capped() {
        let mut session = OnboardingSession::new("user-1", 2);
        session.add_items(1, &[]);
        assert!((session.progress() - 0.5).abs() < 1e-6);
        session.add_items(7, &[]);
        assert_eq!(session.progress(), 1.0);
        assert_eq!(session.remaining(), 0);
    }

    #[tokio::test]
    async fn test_registry_add_and_missing_session() {
        let registry = OnboardingRegistry::new(&settings(3600));
        let session = registry.create("user-1", None).await.unwrap();
        assert_eq!(session.target_items, DEFAULT_TARGET_ITEMS);

        let updated = registry.add_items(&session.id, 2, &[]).await.unwrap();
        assert_eq!(updated.total_items, 2);

        let missing = registry.add_items(&SessionId::new(), 1, &[]).await;
        assert!(matches!(missing, Err(WardrobeError::NotFound(_))));
        assert!(registry.create(" ", None).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_all_counted() {
        let registry = OnboardingRegistry::new(&settings(3600));
        let session = registry.create("user-1", Some(5)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let registry = registry.clone();
            let id = session.id;
            handles.push(tokio::spawn(async move {
                registry.add_items(&id, 1, &[ItemId::new()]).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let session = registry.get(&session.id).await.unwrap();
        assert_eq!(session.total_items, 20);
        assert_eq!(session.item_ids.len(), 20);
        assert!(session.can_proceed);
    }

    #[tokio::test]
    async fn test_evict_expired() {
        let registry = OnboardingRegistry::new(&settings(0));
        registry.create("user-1", None).await.unwrap();
        registry.create("user-2", None).await.unwrap();
        assert_eq!(registry.len().await, 2);

        assert_eq!(registry.evict_expired().await, 2);
        assert!(registry.is_empty().await);

        let keep = OnboardingRegistry::new(&settings(3600));
        keep.create("user-1", None).await.unwrap();
        assert_eq!(keep.evict_expired().await, 0);
    }
}
