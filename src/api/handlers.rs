//! Route handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::ApiError;
use super::extract::{ApiJson, ApiQuery};
use super::state::AppState;
use crate::error::WardrobeError;
use crate::intake::{AnalysisOutput, AnalyzeRequest, InputType, UploadRequest, UploadResponse};
use crate::onboarding::OnboardingSession;
use crate::types::{DetectionSession, ItemId, SessionId, WardrobeItem};

type ApiResult<T> = Result<T, ApiError>;

const DEFAULT_LIST_LIMIT: usize = 50;

pub async fn analyze_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> ApiResult<Json<AnalysisOutput>> {
    debug!("Analyze request ({:?})", request.analysis_type);
    Ok(Json(state.intake().analyze_only(request).await?))
}

pub async fn upload_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UploadRequest>,
) -> ApiResult<Json<UploadResponse>> {
    Ok(Json(state.intake().upload(request).await?))
}

pub async fn multi_item_upload_handler(
    State(state): State<AppState>,
    ApiJson(mut request): ApiJson<UploadRequest>,
) -> ApiResult<Json<UploadResponse>> {
    request.input_type = InputType::MultiItem;
    Ok(Json(state.intake().upload(request).await?))
}

#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemList {
    pub items: Vec<WardrobeItem>,
    pub count: usize,
}

pub async fn list_items_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListItemsQuery>,
) -> ApiResult<Json<ItemList>> {
    if query.user_id.trim().is_empty() {
        return Err(WardrobeError::Validation("user_id is required".to_string()).into());
    }
    let items = state
        .store()
        .list_items(&query.user_id, query.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .await?;
    Ok(Json(ItemList {
        count: items.len(),
        items,
    }))
}

pub async fn get_item_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<WardrobeItem>> {
    let id = ItemId::from_string(&id)?;
    Ok(Json(state.store().get_item(id).await?))
}

pub async fn delete_item_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = ItemId::from_string(&id)?;
    state.store().delete_item(id).await?;
    info!("Deleted item {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DetectionSession>> {
    let id = SessionId::from_string(&id)?;
    Ok(Json(state.store().get_detection(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateOnboardingRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub target_items: Option<u32>,
}

pub async fn create_onboarding_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateOnboardingRequest>,
) -> ApiResult<(StatusCode, Json<OnboardingSession>)> {
    let session = state
        .onboarding()
        .create(&request.user_id, request.target_items)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_onboarding_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OnboardingSession>> {
    let id = SessionId::from_string(&id)?;
    state
        .onboarding()
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| WardrobeError::NotFound(format!("onboarding session {}", id)).into())
}

/// Manual progress report, for items cataloged outside an upload
#[derive(Debug, Default, Deserialize)]
pub struct AddOnboardingItemsRequest {
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub item_ids: Vec<ItemId>,
}

pub async fn add_onboarding_items_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AddOnboardingItemsRequest>,
) -> ApiResult<Json<OnboardingSession>> {
    let id = SessionId::from_string(&id)?;
    let count = request.count.unwrap_or(request.item_ids.len() as u32);
    if count == 0 {
        return Err(WardrobeError::Validation(
            "count or item_ids is required".to_string(),
        )
        .into());
    }
    Ok(Json(state.onboarding().add_items(&id, count, &request.item_ids).await?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider: String,
    pub model: String,
    pub store: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: state.provider().to_string(),
        model: state.model_name().to_string(),
        store: state.store_backend().to_string(),
    })
}
