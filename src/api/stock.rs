use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;

use super::action_response;
use super::error::ApiResult;
use crate::auth::Claims;
use crate::domain::site::BOOK_STOCK;
use crate::services::ActionRequest;
use crate::services::stock_service::{self, StockForm};

pub async fn changelist(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    claims.require(&BOOK_STOCK, "view")?;
    let list = stock_service::changelist(&db, &params, &claims.model_perms(&BOOK_STOCK)).await?;
    Ok(Json(list).into_response())
}

pub async fn add(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(form): Json<StockForm>,
) -> ApiResult<Response> {
    claims.require(&BOOK_STOCK, "add")?;
    let stock = stock_service::add_stock(&db, form).await?;
    Ok((StatusCode::CREATED, Json(stock)).into_response())
}

pub async fn detail(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(&BOOK_STOCK, "view")?;
    Ok(Json(stock_service::get_stock(&db, id).await?).into_response())
}

pub async fn change(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(form): Json<StockForm>,
) -> ApiResult<Response> {
    claims.require(&BOOK_STOCK, "change")?;
    Ok(Json(stock_service::change_stock(&db, id, form).await?).into_response())
}

pub async fn delete(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(&BOOK_STOCK, "delete")?;
    stock_service::delete_stock(&db, id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn action(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Response> {
    claims.require(&BOOK_STOCK, "view")?;
    let outcome = stock_service::run_action(&db, &claims.model_perms(&BOOK_STOCK), request).await?;
    Ok(action_response(outcome))
}
