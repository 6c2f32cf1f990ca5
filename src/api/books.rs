//! Book changelists: all books, on sale, upcoming. The variant is attached
//! to each route as an extension.

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::action_response;
use super::error::ApiResult;
use crate::auth::Claims;
use crate::domain::BookInput;
use crate::domain::changelist::BookVariant;
use crate::infrastructure::AppState;
use crate::services::{ActionRequest, book_service};

pub async fn changelist(
    State(state): State<AppState>,
    Extension(variant): Extension<BookVariant>,
    claims: Claims,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    let model = variant.model_admin();
    claims.require(model, "view")?;
    let perms = claims.model_perms(model);
    let list = book_service::changelist(&state, variant, &params, &perms).await?;
    Ok(Json(list).into_response())
}

pub async fn add(
    State(state): State<AppState>,
    Extension(variant): Extension<BookVariant>,
    claims: Claims,
    Json(input): Json<BookInput>,
) -> ApiResult<Response> {
    claims.require(variant.model_admin(), "add")?;
    let book = book_service::add_book(&state, input, Some(claims.uid)).await?;
    Ok((StatusCode::CREATED, Json(book)).into_response())
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(variant): Extension<BookVariant>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(variant.model_admin(), "view")?;
    let book = book_service::get_book(&state, variant, id).await?;
    Ok(Json(book).into_response())
}

pub async fn change(
    State(state): State<AppState>,
    Extension(variant): Extension<BookVariant>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(input): Json<BookInput>,
) -> ApiResult<Response> {
    claims.require(variant.model_admin(), "change")?;
    let book = book_service::change_book(&state, variant, id, input).await?;
    Ok(Json(book).into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(variant): Extension<BookVariant>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(variant.model_admin(), "delete")?;
    book_service::delete_book(&state, variant, id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn action(
    State(state): State<AppState>,
    Extension(variant): Extension<BookVariant>,
    claims: Claims,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Response> {
    let model = variant.model_admin();
    claims.require(model, "view")?;
    let perms = claims.model_perms(model);
    let outcome = book_service::run_action(&state, variant, &perms, request).await?;
    Ok(action_response(outcome))
}
