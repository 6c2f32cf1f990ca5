use axum::{Json, extract::State, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use super::error::ApiResult;
use crate::services::employee_service;

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

pub async fn login(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    tracing::info!("Login attempt for user: {}", payload.username);
    let response = employee_service::login(&db, &payload.username, &payload.password).await?;
    Ok(Json(response))
}
