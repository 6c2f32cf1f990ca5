//! Departments (with inline employees) and employees.

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
use crate::domain::site::{DEPARTMENT, EMPLOYEE};
use crate::services::ActionRequest;
use crate::services::employee_service::{self, DepartmentForm, NewEmployee};

pub async fn department_changelist(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    claims.require(&DEPARTMENT, "view")?;
    let list =
        employee_service::department_changelist(&db, &params, &claims.model_perms(&DEPARTMENT))
            .await?;
    Ok(Json(list).into_response())
}

pub async fn add_department(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(form): Json<DepartmentForm>,
) -> ApiResult<Response> {
    claims.require(&DEPARTMENT, "add")?;
    if !form.employees.is_empty() {
        claims.require(&EMPLOYEE, "add")?;
    }
    let department = employee_service::add_department(&db, form).await?;
    Ok((StatusCode::CREATED, Json(department)).into_response())
}

pub async fn department_detail(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(&DEPARTMENT, "view")?;
    Ok(Json(employee_service::get_department(&db, id).await?).into_response())
}

pub async fn change_department(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(form): Json<DepartmentForm>,
) -> ApiResult<Response> {
    claims.require(&DEPARTMENT, "change")?;
    if !form.employees.is_empty() {
        claims.require(&EMPLOYEE, "add")?;
    }
    Ok(Json(employee_service::change_department(&db, id, form).await?).into_response())
}

pub async fn delete_department(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(&DEPARTMENT, "delete")?;
    employee_service::delete_department(&db, id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn department_action(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Response> {
    claims.require(&DEPARTMENT, "view")?;
    let outcome =
        employee_service::run_department_action(&db, &claims.model_perms(&DEPARTMENT), request)
            .await?;
    Ok(action_response(outcome))
}

pub async fn employee_changelist(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    claims.require(&EMPLOYEE, "view")?;
    let list =
        employee_service::employee_changelist(&db, &params, &claims.model_perms(&EMPLOYEE))
            .await?;
    Ok(Json(list).into_response())
}

pub async fn add_employee(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(new): Json<NewEmployee>,
) -> ApiResult<Response> {
    claims.require(&EMPLOYEE, "add")?;
    // Only a superuser may hand out superuser status.
    if new.is_superuser && !claims.superuser {
        return Err(crate::domain::DomainError::PermissionDenied.into());
    }
    let user = employee_service::create_employee(&db, new).await?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub async fn employee_detail(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(&EMPLOYEE, "view")?;
    Ok(Json(employee_service::get_employee(&db, id).await?).into_response())
}

pub async fn delete_employee(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    claims.require(&EMPLOYEE, "delete")?;
    employee_service::delete_employee(&db, id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn employee_action(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Response> {
    claims.require(&EMPLOYEE, "view")?;
    let outcome =
        employee_service::run_employee_action(&db, &claims.model_perms(&EMPLOYEE), request)
            .await?;
    Ok(action_response(outcome))
}
