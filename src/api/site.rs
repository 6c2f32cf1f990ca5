//! Admin index and the info page.

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use super::error::ApiResult;
use crate::auth::Claims;
use crate::domain::site::{INDEX_TITLE, SITE_HEADER, build_app_list};
use crate::infrastructure::AppState;
use crate::services::book_service;

pub async fn index(claims: Claims) -> impl IntoResponse {
    let app_list = build_app_list(|model| claims.model_perms(model));
    Json(json!({
        "site_header": SITE_HEADER,
        "title": INDEX_TITLE,
        "user": claims.sub,
        "app_list": app_list,
    }))
}

/// Books registered today.
pub async fn info(State(state): State<AppState>, claims: Claims) -> ApiResult<impl IntoResponse> {
    let books = book_service::created_today(&state).await?;
    tracing::debug!("{} requested info: {} book(s) today", claims.sub, books.len());
    Ok(Json(json!({
        "site_header": SITE_HEADER,
        "books_created_today": books,
    })))
}
