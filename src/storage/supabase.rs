//! Supabase storage backend
//!
//! Talks to PostgREST directly: one table for items, one for detection
//! sessions. Rows are the serde form of [`WardrobeItem`] and
//! [`DetectionSession`].
//!
//! The sessions table is expected to carry a unique index on
//! `(user_id, image_hash)`. A partial index (`WHERE status <> 'failed'`)
//! is preferred; with a plain index, failed rows for the image are deleted
//! before a retry is inserted.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{DetectionStart, WardrobeStore, MAX_LIST_LIMIT};
use crate::config::{StorageKind, WardrobeConfig};
use crate::error::{Result, WardrobeError};
use crate::types::{DetectionSession, DetectionStatus, ItemId, SessionId, WardrobeItem};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// PostgREST error body
#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

impl PostgrestError {
    fn describe(&self, status: StatusCode) -> String {
        let mut out = format!(
            "PostgREST {} ({}): {}",
            status,
            self.code.as_deref().unwrap_or("no code"),
            self.message.as_deref().unwrap_or("no message")
        );
        if let Some(details) = &self.details {
            out.push_str(&format!("; details: {}", details));
        }
        if let Some(hint) = &self.hint {
            out.push_str(&format!("; hint: {}", hint));
        }
        out
    }
}

/// Columns changed by a session transition
#[derive(Debug, Serialize)]
struct SessionPatch<'a> {
    status: DetectionStatus,
    item_count: usize,
    overall_confidence: Option<f32>,
    error: Option<&'a str>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl<'a> From<&'a DetectionSession> for SessionPatch<'a> {
    fn from(session: &'a DetectionSession) -> Self {
        Self {
            status: session.status,
            item_count: session.item_count,
            overall_confidence: session.overall_confidence,
            error: session.error.as_deref(),
            updated_at: session.updated_at,
        }
    }
}

/// Outcome of a session insert
enum SessionInsert {
    Created(DetectionSession),
    /// Unique key taken; carries the PostgREST body
    Conflict(String),
}

pub struct SupabaseStore {
    client: Client,
    base_url: String,
    key: SecretString,
    items_table: String,
    sessions_table: String,
}

impl SupabaseStore {
    pub fn new(
        base_url: &str,
        key: SecretString,
        items_table: &str,
        sessions_table: &str,
    ) -> Result<Self> {
        Url::parse(base_url)
            .map_err(|e| WardrobeError::Validation(format!("invalid Supabase URL {}: {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| WardrobeError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            key,
            items_table: items_table.to_string(),
            sessions_table: sessions_table.to_string(),
        })
    }

    /// Build from `SUPABASE_URL` and the service or anon key
    pub fn from_config(config: &WardrobeConfig) -> Result<Self> {
        let credentials = &config.credentials;
        let (Some(url), Some(key)) = (&credentials.supabase_url, &credentials.supabase_key) else {
            return Err(WardrobeError::Config(::config::ConfigError::Message(
                "Supabase storage needs SUPABASE_URL and SUPABASE_SERVICE_KEY or SUPABASE_ANON_KEY"
                    .to_string(),
            )));
        };
        let storage = &config.settings.storage;
        Self::new(url, key.clone(), &storage.items_table, &storage.sessions_table)
    }

    fn table_url(&self, table: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, table))
            .map_err(|e| WardrobeError::Database(format!("bad table URL: {}", e)))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let key = self.key.expose_secret();
        self.client
            .request(method, url)
            .header("apikey", key)
            .header("Authorization", format!("Bearer {}", key))
            .header("Content-Type", "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| WardrobeError::Network(format!("Supabase request failed: {}", e)))
    }

    async fn rows<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        let response = check(self.send(request).await?).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| WardrobeError::Database(format!("unexpected PostgREST body: {}", e)))
    }

    async fn find_live_session(&self, user_id: &str, image_hash: &str) -> Result<Option<DetectionSession>> {
        let url = self.table_url(
            &self.sessions_table,
            &[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("image_hash", format!("eq.{}", image_hash)),
                ("status", "in.(processing,completed)".to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", "1".to_string()),
            ],
        )?;
        let sessions: Vec<DetectionSession> = self.rows(self.request(Method::GET, url)).await?;
        Ok(sessions.into_iter().next())
    }

    async fn insert_session(&self, session: &DetectionSession) -> Result<SessionInsert> {
        let url = self.table_url(&self.sessions_table, &[])?;
        let request = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(session);
        let response = self.send(request).await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(SessionInsert::Conflict(response.text().await.unwrap_or_default()));
        }

        let created: Vec<DetectionSession> = check(response)
            .await?
            .json()
            .await
            .map_err(|e| WardrobeError::Database(format!("unexpected PostgREST body: {}", e)))?;
        Ok(SessionInsert::Created(
            created.into_iter().next().unwrap_or_else(|| session.clone()),
        ))
    }

    /// Remove failed sessions for an image. Returns how many were removed.
    async fn delete_failed_sessions(&self, user_id: &str, image_hash: &str) -> Result<usize> {
        let url = self.table_url(
            &self.sessions_table,
            &[
                ("user_id", format!("eq.{}", user_id)),
                ("image_hash", format!("eq.{}", image_hash)),
                ("status", "eq.failed".to_string()),
            ],
        )?;
        let request = self
            .request(Method::DELETE, url)
            .header("Prefer", "return=representation");
        let deleted: Vec<serde_json::Value> = self.rows(request).await?;
        debug!("Cleared {} failed session(s) for {}", deleted.len(), user_id);
        Ok(deleted.len())
    }

    /// Persist a locally validated transition, guarded on `processing`
    async fn patch_session(&self, session: &DetectionSession) -> Result<DetectionSession> {
        let url = self.table_url(
            &self.sessions_table,
            &[
                ("id", format!("eq.{}", session.id)),
                ("status", "eq.processing".to_string()),
            ],
        )?;
        let request = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&SessionPatch::from(session));
        let updated: Vec<DetectionSession> = self.rows(request).await?;
        updated.into_iter().next().ok_or_else(|| {
            WardrobeError::InvalidOperation(format!(
                "detection session {} is no longer processing",
                session.id
            ))
        })
    }
}

/// Turn a non-success response into a `Database` error
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(postgrest_error(status, &body))
}

fn postgrest_error(status: StatusCode, body: &str) -> WardrobeError {
    let message = match serde_json::from_str::<PostgrestError>(body) {
        Ok(err) => err.describe(status),
        Err(_) => format!("PostgREST {}: {}", status, body),
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => WardrobeError::Authentication(message),
        _ => WardrobeError::Database(message),
    }
}

#[async_trait]
impl WardrobeStore for SupabaseStore {
    async fn save_item(&self, item: &WardrobeItem) -> Result<WardrobeItem> {
        let url = self.table_url(&self.items_table, &[("on_conflict", "id".to_string())])?;
        let request = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation,resolution=merge-duplicates")
            .json(item);
        let saved: Vec<WardrobeItem> = self.rows(request).await?;
        Ok(saved.into_iter().next().unwrap_or_else(|| item.clone()))
    }

    async fn get_item(&self, id: ItemId) -> Result<WardrobeItem> {
        let url = self.table_url(
            &self.items_table,
            &[("select", "*".to_string()), ("id", format!("eq.{}", id))],
        )?;
        let items: Vec<WardrobeItem> = self.rows(self.request(Method::GET, url)).await?;
        items
            .into_iter()
            .next()
            .ok_or_else(|| WardrobeError::NotFound(format!("item {}", id)))
    }

    async fn list_items(&self, user_id: &str, limit: usize) -> Result<Vec<WardrobeItem>> {
        let url = self.table_url(
            &self.items_table,
            &[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.min(MAX_LIST_LIMIT).to_string()),
            ],
        )?;
        self.rows(self.request(Method::GET, url)).await
    }

    async fn list_session_items(&self, session_id: SessionId) -> Result<Vec<WardrobeItem>> {
        let url = self.table_url(
            &self.items_table,
            &[
                ("select", "*".to_string()),
                ("detection_session_id", format!("eq.{}", session_id)),
                ("order", "created_at.asc".to_string()),
            ],
        )?;
        self.rows(self.request(Method::GET, url)).await
    }

    async fn delete_item(&self, id: ItemId) -> Result<()> {
        let url = self.table_url(&self.items_table, &[("id", format!("eq.{}", id))])?;
        let request = self
            .request(Method::DELETE, url)
            .header("Prefer", "return=representation");
        let deleted: Vec<serde_json::Value> = self.rows(request).await?;
        if deleted.is_empty() {
            return Err(WardrobeError::NotFound(format!("item {}", id)));
        }
        Ok(())
    }

    async fn begin_detection(&self, user_id: &str, image_hash: &str) -> Result<DetectionStart> {
        if let Some(existing) = self.find_live_session(user_id, image_hash).await? {
            debug!("Duplicate upload for session {}", existing.id);
            return Ok(DetectionStart::Duplicate(existing));
        }

        let session = DetectionSession::start(user_id, image_hash);
        let body = match self.insert_session(&session).await? {
            SessionInsert::Created(created) => return Ok(DetectionStart::New(created)),
            SessionInsert::Conflict(body) => body,
        };

        // The unique index on (user_id, image_hash) settles races
        warn!("Concurrent upload of the same image for {}", user_id);
        if let Some(existing) = self.find_live_session(user_id, image_hash).await? {
            return Ok(DetectionStart::Duplicate(existing));
        }

        // Only failed attempts hold the key; clear them and insert once more
        if self.delete_failed_sessions(user_id, image_hash).await? == 0 {
            return Err(postgrest_error(StatusCode::CONFLICT, &body));
        }
        match self.insert_session(&session).await? {
            SessionInsert::Created(created) => Ok(DetectionStart::New(created)),
            SessionInsert::Conflict(body) => match self.find_live_session(user_id, image_hash).await? {
                Some(existing) => Ok(DetectionStart::Duplicate(existing)),
                None => Err(postgrest_error(StatusCode::CONFLICT, &body)),
            },
        }
    }

    async fn complete_detection(
        &self,
        id: SessionId,
        item_count: usize,
        overall_confidence: Option<f32>,
    ) -> Result<DetectionSession> {
        let mut session = self.get_detection(id).await?;
        session.complete(item_count, overall_confidence)?;
        self.patch_session(&session).await
    }

    async fn fail_detection(&self, id: SessionId, error: &str) -> Result<DetectionSession> {
        let mut session = self.get_detection(id).await?;
        session.fail(error)?;
        self.patch_session(&session).await
    }

    async fn get_detection(&self, id: SessionId) -> Result<DetectionSession> {
        let url = self.table_url(
            &self.sessions_table,
            &[("select", "*".to_string()), ("id", format!("eq.{}", id))],
        )?;
        let sessions: Vec<DetectionSession> = self.rows(self.request(Method::GET, url)).await?;
        sessions
            .into_iter()
            .next()
            .ok_or_else(|| WardrobeError::NotFound(format!("detection session {}", id)))
    }

    fn backend(&self) -> StorageKind {
        StorageKind::Supabase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgrest_error_body_is_described() {
        let body = r#"{"code":"23505","message":"duplicate key value","details":"Key (id) exists.","hint":null}"#;
        let err = postgrest_error(StatusCode::BAD_REQUEST, body);
        let WardrobeError::Database(message) = err else {
            panic!("expected database error");
        };
        assert!(message.contains("23505"));
        assert!(message.contains("duplicate key value"));
        assert!(message.contains("Key (id) exists."));
    }

    #[test]
    fn test_auth_failures_map_to_authentication() {
        assert!(matches!(
            postgrest_error(StatusCode::UNAUTHORIZED, "{}"),
            WardrobeError::Authentication(_)
        ));
    }

    #[test]
    fn test_table_url_encodes_filters() {
        let store = SupabaseStore::new(
            "https://project.supabase.co/",
            SecretString::from("key".to_string()),
            "wardrobe_items",
            "multi_item_detection_sessions",
        )
        .unwrap();
        let url = store
            .table_url("wardrobe_items", &[("user_id", "eq.a b".to_string())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://project.supabase.co/rest/v1/wardrobe_items?user_id=eq.a+b"
        );
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let config = WardrobeConfig::default();
        assert!(matches!(
            SupabaseStore::from_config(&config),
            Err(WardrobeError::Config(_))
        ));
    }
}
