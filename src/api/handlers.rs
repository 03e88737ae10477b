//! API Handlers
//!
//! HTTP request handlers for each flag service endpoint.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::cache::EvaluationCache;
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::models::{
    CreateFlagRequest, EvaluateQuery, Evaluation, Flag, FlagListResponse, HealthResponse,
    ListFlagsQuery, MessageResponse, OverrideListResponse, PageQuery, SetOverrideRequest,
    StatsResponse, ToggleFlagRequest, UpdateFlagRequest, UserOverride,
};
use crate::service::{EvaluationService, FlagService};

// Extractors are taken as `Result<_, Rejection>` so malformed input is turned
// into a FlagError and rendered with the usual `{"detail": ...}` body.

/// Application state shared across all handlers.
///
/// The evaluation cache is created once here and shared by `Arc` with both
/// services; there is no process-wide instance.
#[derive(Debug, Clone)]
pub struct AppState {
    pub flags: FlagService,
    pub evaluator: EvaluationService,
    pub cache: Arc<EvaluationCache>,
}

impl AppState {
    /// Creates a new AppState over an open database and a cache.
    pub fn new(db: Database, cache: EvaluationCache) -> Self {
        let cache = Arc::new(cache);
        Self {
            flags: FlagService::new(db.clone(), cache.clone()),
            evaluator: EvaluationService::new(db, cache.clone()),
            cache,
        }
    }

    /// Opens the configured database and sizes the cache from the Config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = Database::open(&config.database_path)?;
        Ok(Self::new(db, EvaluationCache::from_config(config)))
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /flags/evaluate?flag_name=..&user_id=..
pub async fn evaluate_handler(
    State(state): State<AppState>,
    query: Result<Query<EvaluateQuery>, QueryRejection>,
) -> Result<Json<Evaluation>> {
    let Query(query) = query?;
    let evaluation = state
        .evaluator
        .evaluate(&query.flag_name, &query.user_id)
        .await?;
    Ok(Json(evaluation))
}

/// Handler for POST /flags
pub async fn create_flag_handler(
    State(state): State<AppState>,
    body: Result<Json<CreateFlagRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Flag>)> {
    let Json(req) = body?;
    let flag = state.flags.create(req).await?;
    Ok((StatusCode::CREATED, Json(flag)))
}

/// Handler for GET /flags
pub async fn list_flags_handler(
    State(state): State<AppState>,
    query: Result<Query<ListFlagsQuery>, QueryRejection>,
) -> Result<Json<FlagListResponse>> {
    let Query(query) = query?;
    Ok(Json(state.flags.list(&query).await?))
}

/// Handler for GET /flags/:flag_id
pub async fn get_flag_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Flag>> {
    let Path(flag_id) = path?;
    Ok(Json(state.flags.get(flag_id).await?))
}

/// Handler for PATCH /flags/:flag_id
pub async fn update_flag_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateFlagRequest>, JsonRejection>,
) -> Result<Json<Flag>> {
    let Path(flag_id) = path?;
    let Json(req) = body?;
    Ok(Json(state.flags.update(flag_id, req).await?))
}

/// Handler for PATCH /flags/:flag_id/toggle
pub async fn toggle_flag_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ToggleFlagRequest>, JsonRejection>,
) -> Result<Json<Flag>> {
    let Path(flag_id) = path?;
    let Json(req) = body?;
    Ok(Json(state.flags.toggle(flag_id, req.is_enabled).await?))
}

/// Handler for DELETE /flags/:flag_id
pub async fn delete_flag_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>> {
    let Path(flag_id) = path?;
    let flag = state.flags.delete(flag_id).await?;
    Ok(Json(MessageResponse::new(format!(
        "Feature flag '{}' deleted successfully",
        flag.name
    ))))
}

/// Handler for PUT /flags/:flag_id/users/:user_id
///
/// 201 when the override is created, 200 when an existing one is replaced.
pub async fn set_override_handler(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, String)>, PathRejection>,
    body: Result<Json<SetOverrideRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserOverride>)> {
    let Path((flag_id, user_id)) = path?;
    let Json(req) = body?;
    let (user_override, created) = state
        .flags
        .set_override(flag_id, &user_id, req.is_enabled)
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(user_override)))
}

/// Handler for DELETE /flags/:flag_id/users/:user_id
pub async fn delete_override_handler(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, String)>, PathRejection>,
) -> Result<StatusCode> {
    let Path((flag_id, user_id)) = path?;
    state.flags.delete_override(flag_id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /flags/:flag_id/users
pub async fn list_overrides_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    page: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<OverrideListResponse>> {
    let Path(flag_id) = path?;
    let Query(page) = page?;
    Ok(Json(state.flags.list_overrides(flag_id, &page).await?))
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats();
    Json(StatsResponse::new(
        stats,
        state.cache.capacity(),
        state.cache.ttl().as_secs(),
    ))
}
