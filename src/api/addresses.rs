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
use crate::domain::site::ADDRESS;
use crate::services::ActionRequest;
use crate::services::address_service::{self, POSTAL_CODE_PARAM};

/// `GET /address/?postalCode=0600000`, used by the address form to fill in
/// prefecture, city and section. Public, like the page that calls it.
pub async fn lookup(
    State(db): State<DatabaseConnection>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    let hits =
        address_service::lookup(&db, params.get(POSTAL_CODE_PARAM).map(String::as_str)).await?;
    Ok(Json(hits).into_response())
}

pub async fn changelist(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    claims.require(&ADDRESS, "view")?;
    let list = address_service::changelist(&db, &params, &claims.model_perms(&ADDRESS)).await?;
    Ok(Json(list).into_response())
}

pub async fn detail(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(&ADDRESS, "view")?;
    Ok(Json(address_service::get_address(&db, id).await?).into_response())
}

pub async fn delete(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(&ADDRESS, "delete")?;
    address_service::delete_address(&db, id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn action(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Response> {
    claims.require(&ADDRESS, "view")?;
    let outcome = address_service::run_action(&db, &claims.model_perms(&ADDRESS), request).await?;
    Ok(action_response(outcome))
}
