//! In-process storage backend

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{DetectionStart, WardrobeStore, MAX_LIST_LIMIT};
use crate::config::StorageKind;
use crate::error::{Result, WardrobeError};
use crate::types::{DetectionSession, ItemId, SessionId, WardrobeItem};

/// Maps behind async locks; contents are lost on restart
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<ItemId, WardrobeItem>>,
    sessions: RwLock<HashMap<SessionId, DetectionSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn transition<F>(&self, id: SessionId, apply: F) -> Result<DetectionSession>
    where
        F: FnOnce(&mut DetectionSession) -> Result<()>,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| WardrobeError::NotFound(format!("detection session {}", id)))?;
        apply(session)?;
        Ok(session.clone())
    }
}

#[async_trait]
impl WardrobeStore for MemoryStore {
    async fn save_item(&self, item: &WardrobeItem) -> Result<WardrobeItem> {
        self.items.write().await.insert(item.id, item.clone());
        Ok(item.clone())
    }

    async fn get_item(&self, id: ItemId) -> Result<WardrobeItem> {
        self.items
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| WardrobeError::NotFound(format!("item {}", id)))
    }

    async fn list_items(&self, user_id: &str, limit: usize) -> Result<Vec<WardrobeItem>> {
        let items = self.items.read().await;
        let mut matching: Vec<WardrobeItem> = items
            .values()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit.min(MAX_LIST_LIMIT));
        Ok(matching)
    }

    async fn list_session_items(&self, session_id: SessionId) -> Result<Vec<WardrobeItem>> {
        let items = self.items.read().await;
        let mut matching: Vec<WardrobeItem> = items
            .values()
            .filter(|item| item.detection_session_id == Some(session_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matching)
    }

    async fn delete_item(&self, id: ItemId) -> Result<()> {
        self.items
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| WardrobeError::NotFound(format!("item {}", id)))
    }

    async fn begin_detection(&self, user_id: &str, image_hash: &str) -> Result<DetectionStart> {
        // Lookup and insert under one write lock
        let mut sessions = self.sessions.write().await;

        let existing = sessions
            .values()
            .filter(|s| s.user_id == user_id && s.image_hash == image_hash && s.blocks_duplicate())
            .max_by_key(|s| s.created_at)
            .cloned();
        if let Some(session) = existing {
            debug!("Duplicate upload for session {}", session.id);
            return Ok(DetectionStart::Duplicate(session));
        }

        let session = DetectionSession::start(user_id, image_hash);
        sessions.insert(session.id, session.clone());
        Ok(DetectionStart::New(session))
    }

    async fn complete_detection(
        &self,
        id: SessionId,
        item_count: usize,
        overall_confidence: Option<f32>,
    ) -> Result<DetectionSession> {
        self.transition(id, |s| s.complete(item_count, overall_confidence))
            .await
    }

    async fn fail_detection(&self, id: SessionId, error: &str) -> Result<DetectionSession> {
        self.transition(id, |s| s.fail(error)).await
    }

    async fn get_detection(&self, id: SessionId) -> Result<DetectionSession> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| WardrobeError::NotFound(format!("detection session {}", id)))
    }

    fn backend(&self) -> StorageKind {
        StorageKind::Memory
    }
}
