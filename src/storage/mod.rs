//! Storage layer for the wardrobe catalog
//!
//! Provides an abstraction over where items and detection sessions live,
//! with an in-process backend for development and tests and a Supabase
//! (PostgREST) backend for deployments.

pub mod memory;
pub mod supabase;

use std::sync::Arc;

use crate::config::{StorageKind, WardrobeConfig};
use crate::error::Result;
use crate::types::{DetectionSession, ItemId, SessionId, WardrobeItem};
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

/// Largest page `list_items` will return
pub const MAX_LIST_LIMIT: usize = 200;

/// Outcome of registering an upload for detection
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionStart {
    /// No live session for this image; a new one is now processing
    New(DetectionSession),
    /// The same user already uploaded this image
    Duplicate(DetectionSession),
}

impl DetectionStart {
    pub fn session(&self) -> &DetectionSession {
        match self {
            DetectionStart::New(session) | DetectionStart::Duplicate(session) => session,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, DetectionStart::Duplicate(_))
    }
}

/// Storage backend trait defining all required operations
#[async_trait]
pub trait WardrobeStore: Send + Sync {
    /// Insert or replace an item
    async fn save_item(&self, item: &WardrobeItem) -> Result<WardrobeItem>;

    /// Retrieve an item by ID
    async fn get_item(&self, id: ItemId) -> Result<WardrobeItem>;

    /// Newest items first, at most `limit`
    async fn list_items(&self, user_id: &str, limit: usize) -> Result<Vec<WardrobeItem>>;

    /// Items produced by one detection session
    async fn list_session_items(&self, session_id: SessionId) -> Result<Vec<WardrobeItem>>;

    async fn delete_item(&self, id: ItemId) -> Result<()>;

    /// Start a detection session unless the user already has a processing
    /// or completed one for `image_hash`
    async fn begin_detection(&self, user_id: &str, image_hash: &str) -> Result<DetectionStart>;

    async fn complete_detection(
        &self,
        id: SessionId,
        item_count: usize,
        overall_confidence: Option<f32>,
    ) -> Result<DetectionSession>;

    async fn fail_detection(&self, id: SessionId, error: &str) -> Result<DetectionSession>;

    async fn get_detection(&self, id: SessionId) -> Result<DetectionSession>;

    fn backend(&self) -> StorageKind;
}

/// Build the configured storage backend
pub fn store_from_config(config: &WardrobeConfig) -> Result<Arc<dyn WardrobeStore>> {
    let store: Arc<dyn WardrobeStore> = match config.settings.storage.backend {
        StorageKind::Memory => Arc::new(MemoryStore::new()),
        StorageKind::Supabase => Arc::new(SupabaseStore::from_config(config)?),
    };
    Ok(store)
}
