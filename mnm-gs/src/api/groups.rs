//! Group operation handlers
//!
//! POST /group/create, /group/join/:group_id, /group/submit/:group_id/:user_id,
//! /group/compute/:group_id, /group/close/:group_id;
//! GET /group/status/:group_id, /group/result/:group_id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use mnm_common::{GroupStatus, PreferenceSet, RestaurantView};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /group/create response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGroupResponse {
    pub group_id: String,
}

/// POST /group/join response
#[derive(Debug, Serialize, Deserialize)]
pub struct JoinGroupResponse {
    pub user_id: String,
}

/// Acknowledgement for operations without a payload
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    fn new(status: &str) -> Json<Self> {
        Json(Self {
            status: status.to_string(),
        })
    }
}

/// GET /group/result response
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultResponse {
    pub restaurants: Vec<RestaurantView>,
}

pub async fn create_group(State(state): State<AppState>) -> ApiResult<Json<CreateGroupResponse>> {
    let group_id = state.sessions.create_group().await?;
    Ok(Json(CreateGroupResponse { group_id }))
}

pub async fn join_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> ApiResult<Json<JoinGroupResponse>> {
    let user_id = state.sessions.add_user(&group_id).await?;
    Ok(Json(JoinGroupResponse { user_id }))
}

pub async fn submit_preferences(
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(String, String)>,
    payload: Result<Json<PreferenceSet>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Json(preferences) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    state
        .sessions
        .submit_preferences(&group_id, &user_id, preferences)
        .await?;
    Ok(StatusResponse::new("submitted"))
}

pub async fn group_status(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> ApiResult<Json<GroupStatus>> {
    Ok(Json(state.sessions.group_status(&group_id).await?))
}

pub async fn compute(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    state.sessions.compute(&group_id).await?;
    Ok(StatusResponse::new("computed"))
}

pub async fn get_result(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> ApiResult<Json<ResultResponse>> {
    let restaurants = state.sessions.get_result(&group_id).await?;
    Ok(Json(ResultResponse { restaurants }))
}

pub async fn close_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    state.sessions.close_group(&group_id).await?;
    Ok(StatusResponse::new("closing"))
}

/// Build group operation routes
pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/group/create", post(create_group))
        .route("/group/join/:group_id", post(join_group))
        .route("/group/submit/:group_id/:user_id", post(submit_preferences))
        .route("/group/status/:group_id", get(group_status))
        .route("/group/compute/:group_id", post(compute))
        .route("/group/result/:group_id", get(get_result))
        .route("/group/close/:group_id", post(close_group))
}
