use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::action_response;
use super::error::ApiResult;
use crate::auth::Claims;
use crate::domain::site::PUBLISHER;
use crate::infrastructure::AppState;
use crate::services::ActionRequest;
use crate::services::publisher_service::{self, PublisherForm};

pub async fn changelist(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    claims.require(&PUBLISHER, "view")?;
    let list =
        publisher_service::changelist(&state, &params, &claims.model_perms(&PUBLISHER)).await?;
    Ok(Json(list).into_response())
}

pub async fn add(
    State(state): State<AppState>,
    claims: Claims,
    Json(form): Json<PublisherForm>,
) -> ApiResult<Response> {
    claims.require(&PUBLISHER, "add")?;
    let publisher = publisher_service::add_publisher(&state, form).await?;
    Ok((StatusCode::CREATED, Json(publisher)).into_response())
}

pub async fn detail(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(&PUBLISHER, "view")?;
    Ok(Json(publisher_service::get_publisher(&state, id).await?).into_response())
}

pub async fn change(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(form): Json<PublisherForm>,
) -> ApiResult<Response> {
    claims.require(&PUBLISHER, "change")?;
    Ok(Json(publisher_service::change_publisher(&state, id, form).await?).into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(&PUBLISHER, "delete")?;
    publisher_service::delete_publisher(&state, id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn action(
    State(state): State<AppState>,
    claims: Claims,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Response> {
    claims.require(&PUBLISHER, "view")?;
    let outcome =
        publisher_service::run_action(&state, &claims.model_perms(&PUBLISHER), request).await?;
    Ok(action_response(outcome))
}
