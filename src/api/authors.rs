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
use crate::domain::site::AUTHOR;
use crate::infrastructure::AppState;
use crate::services::ActionRequest;
use crate::services::author_service::{self, AuthorForm};

pub async fn changelist(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    claims.require(&AUTHOR, "view")?;
    let list = author_service::changelist(&state, &params, &claims.model_perms(&AUTHOR)).await?;
    Ok(Json(list).into_response())
}

pub async fn add(
    State(state): State<AppState>,
    claims: Claims,
    Json(form): Json<AuthorForm>,
) -> ApiResult<Response> {
    claims.require(&AUTHOR, "add")?;
    let author = author_service::add_author(&state, form).await?;
    Ok((StatusCode::CREATED, Json(author)).into_response())
}

pub async fn detail(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(&AUTHOR, "view")?;
    Ok(Json(author_service::get_author(&state, id).await?).into_response())
}

pub async fn change(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(form): Json<AuthorForm>,
) -> ApiResult<Response> {
    claims.require(&AUTHOR, "change")?;
    Ok(Json(author_service::change_author(&state, id, form).await?).into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(&AUTHOR, "delete")?;
    author_service::delete_author(&state, id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn action(
    State(state): State<AppState>,
    claims: Claims,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Response> {
    claims.require(&AUTHOR, "view")?;
    let outcome =
        author_service::run_action(&state, &claims.model_perms(&AUTHOR), request).await?;
    Ok(action_response(outcome))
}
