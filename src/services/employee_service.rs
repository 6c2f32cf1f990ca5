//! Employee Service - admin users, login and departments with their
//! inline employees.
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use std::collections::{HashMap, HashSet};

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use super::export::EmployeeRecord;
use super::{
    ActionDef, ActionOutcome, ActionRequest, CSV_ACTION, Changelist, DELETE_ACTION,
    available_actions, export_csv, resolve_action,
};
use crate::domain::changelist::{DEFAULT_PER_PAGE, SEARCH_PARAM, page_number};
use crate::domain::site::{self, ModelPerms};
use crate::domain::validation::check_required_text;
use crate::domain::{DomainError, FieldErrors, order_by_ids};
use crate::infrastructure::auth::{create_jwt, hash_password, verify_password};
use crate::infrastructure::contains_literal;
use crate::models::{department, employee};

/// Password given to employees created from the department form.
pub const INITIAL_PASSWORD: &str = "pass12345";

pub const EMPLOYEE_ACTIONS: [ActionDef; 2] = [CSV_ACTION, DELETE_ACTION];
pub const DEPARTMENT_ACTIONS: [ActionDef; 2] = [CSV_ACTION, DELETE_ACTION];

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub is_superuser: bool,
}

/// Exchange credentials for a bearer token. Only active staff may log in.
pub async fn login(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<LoginResponse, DomainError> {
    let Some(user) = employee::Entity::find()
        .filter(employee::Column::Username.eq(username))
        .one(db)
        .await?
    else {
        tracing::warn!("Login failed: unknown user {}", username);
        return Err(DomainError::Unauthorized);
    };

    let valid = verify_password(password, &user.password_hash).map_err(DomainError::Internal)?;
    if !valid || !user.is_active || !user.is_staff {
        tracing::warn!("Login failed for {}", username);
        return Err(DomainError::Unauthorized);
    }

    let token = create_jwt(&user).map_err(DomainError::Internal)?;
    tracing::info!("{} logged in", user.username);
    Ok(LoginResponse {
        token,
        username: user.username,
        is_superuser: user.is_superuser,
    })
}

/// Account fields for programmatic creation (seeding, tests).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEmployee {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub department_id: Option<i32>,
}

async fn insert_employee<C: ConnectionTrait>(
    conn: &C,
    new: NewEmployee,
) -> Result<employee::Model, DomainError> {
    let password_hash = hash_password(&new.password).map_err(DomainError::Internal)?;
    let permissions =
        serde_json::to_string(&new.permissions).map_err(|e| DomainError::Internal(e.to_string()))?;

    let model = employee::ActiveModel {
        username: Set(new.username),
        password_hash: Set(password_hash),
        first_name: Set(new.first_name),
        last_name: Set(new.last_name),
        email: Set(new.email),
        is_staff: Set(new.is_staff),
        is_superuser: Set(new.is_superuser),
        is_active: Set(true),
        permissions: Set(permissions),
        department_id: Set(new.department_id),
        date_joined: Set(chrono::Local::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(model)
}

pub async fn create_employee(
    db: &DatabaseConnection,
    new: NewEmployee,
) -> Result<employee::Model, DomainError> {
    let mut errors = FieldErrors::new();
    check_required_text(&mut errors, "username", &new.username);
    if new.password.is_empty() {
        errors.add("password", "This field is required.");
    }
    errors.into_result()?;
    check_usernames_free(db, std::slice::from_ref(&new.username)).await?;

    let user = insert_employee(db, new).await?;
    tracing::info!("Employee {} created", user.username);
    Ok(user)
}

async fn check_usernames_free(
    db: &DatabaseConnection,
    usernames: &[String],
) -> Result<(), DomainError> {
    let taken = employee::Entity::find()
        .filter(employee::Column::Username.is_in(usernames.to_vec()))
        .all(db)
        .await?;
    if taken.is_empty() {
        return Ok(());
    }
    let mut errors = FieldErrors::new();
    for user in taken {
        errors.add(
            "username",
            format!("A user with username {:?} already exists.", user.username),
        );
    }
    Err(DomainError::Validation(errors))
}

async fn department_names(
    db: &DatabaseConnection,
    employees: &[employee::Model],
) -> Result<HashMap<i32, String>, DomainError> {
    let ids: Vec<i32> = employees.iter().filter_map(|e| e.department_id).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(department::Entity::find()
        .filter(department::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect())
}

async fn to_records(
    db: &DatabaseConnection,
    employees: Vec<employee::Model>,
) -> Result<Vec<EmployeeRecord>, DomainError> {
    let names = department_names(db, &employees).await?;
    Ok(employees
        .into_iter()
        .map(|employee| EmployeeRecord {
            department_name: employee.department_id.and_then(|id| names.get(&id).cloned()),
            employee,
        })
        .collect())
}

pub async fn employee_changelist(
    db: &DatabaseConnection,
    params: &HashMap<String, String>,
    perms: &ModelPerms,
) -> Result<Changelist<EmployeeRecord>, DomainError> {
    let page = page_number(params, DEFAULT_PER_PAGE)?;
    let full_result_count = employee::Entity::find().count(db).await?;

    let mut query = employee::Entity::find();
    if let Some(q) = params.get(SEARCH_PARAM) {
        for term in q.split_whitespace() {
            query = query.filter(
                sea_orm::Condition::any()
                    .add(contains_literal(employee::Column::Username, term))
                    .add(contains_literal(employee::Column::FirstName, term))
                    .add(contains_literal(employee::Column::LastName, term))
                    .add(contains_literal(employee::Column::Email, term)),
            );
        }
    }
    let employees = query
        .order_by_asc(employee::Column::Username)
        .all(db)
        .await?;

    Ok(Changelist::paged(
        &site::EMPLOYEE,
        to_records(db, employees).await?,
        full_result_count,
        page,
        DEFAULT_PER_PAGE,
        available_actions(&EMPLOYEE_ACTIONS, perms),
    ))
}

pub async fn get_employee(db: &DatabaseConnection, id: i32) -> Result<EmployeeRecord, DomainError> {
    let employee = employee::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)?;
    to_records(db, vec![employee])
        .await?
        .pop()
        .ok_or(DomainError::NotFound)
}

pub async fn delete_employee(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    delete_employees(db, &[id]).await.and_then(|count| {
        if count == 0 {
            Err(DomainError::NotFound)
        } else {
            Ok(())
        }
    })
}

async fn delete_employees(db: &DatabaseConnection, ids: &[i32]) -> Result<u64, DomainError> {
    let txn = db.begin().await?;
    // Books keep their row; only the creator link is cleared.
    crate::models::book::Entity::update_many()
        .col_expr(
            crate::models::book::Column::CreatedById,
            Expr::value(Option::<i32>::None),
        )
        .filter(crate::models::book::Column::CreatedById.is_in(ids.to_vec()))
        .exec(&txn)
        .await?;
    let result = employee::Entity::delete_many()
        .filter(employee::Column::Id.is_in(ids.to_vec()))
        .exec(&txn)
        .await?;
    txn.commit().await?;
    Ok(result.rows_affected)
}

pub async fn run_employee_action(
    db: &DatabaseConnection,
    perms: &ModelPerms,
    request: ActionRequest,
) -> Result<ActionOutcome, DomainError> {
    let def = resolve_action(&EMPLOYEE_ACTIONS, &request.action)?;
    if !def.requires.granted(perms) {
        return Err(DomainError::PermissionDenied);
    }

    let found = employee::Entity::find()
        .filter(employee::Column::Id.is_in(request.ids.clone()))
        .all(db)
        .await?;
    let selected = order_by_ids(&request.ids, found, |e| e.id);

    if def.name == super::DOWNLOAD_AS_CSV {
        let records = to_records(db, selected).await?;
        return Ok(ActionOutcome::Csv(export_csv(&site::EMPLOYEE, &records)?));
    }

    let ids: Vec<i32> = selected.iter().map(|e| e.id).collect();
    let count = delete_employees(db, &ids).await?;
    Ok(ActionOutcome::Deleted { count })
}

/// Employee row of the department form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InlineEmployee {
    pub username: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentForm {
    pub name: String,
    /// New employees to create in this department
    #[serde(default)]
    pub employees: Vec<InlineEmployee>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentDetail {
    #[serde(flatten)]
    pub department: department::Model,
    pub employees: Vec<employee::Model>,
}

/// Field checks of the department form and its inline rows. Inline errors
/// are keyed `employees-<index>-<field>`.
fn clean_department(form: &mut DepartmentForm) -> Result<(), DomainError> {
    let mut errors = FieldErrors::new();
    form.name = form.name.trim().to_string();
    check_required_text(&mut errors, "name", &form.name);

    let mut seen = HashSet::new();
    for (i, row) in form.employees.iter_mut().enumerate() {
        row.username = row.username.trim().to_string();
        let key = format!("employees-{}-username", i);
        check_required_text(&mut errors, &key, &row.username);
        if !row.username.is_empty() && !seen.insert(row.username.clone()) {
            errors.add(&key, "Please correct the duplicate data for username.");
        }
    }
    errors.into_result()
}

async fn insert_inline<C: ConnectionTrait>(
    conn: &C,
    department_id: i32,
    rows: Vec<InlineEmployee>,
) -> Result<(), DomainError> {
    for row in rows {
        let user = insert_employee(
            conn,
            NewEmployee {
                username: row.username,
                password: INITIAL_PASSWORD.to_string(),
                first_name: row.first_name,
                last_name: row.last_name,
                department_id: Some(department_id),
                ..Default::default()
            },
        )
        .await?;
        tracing::debug!("Inline employee {} added to department {}", user.username, department_id);
    }
    Ok(())
}

/// Create a department together with its inline employees, all or nothing.
pub async fn add_department(
    db: &DatabaseConnection,
    mut form: DepartmentForm,
) -> Result<DepartmentDetail, DomainError> {
    clean_department(&mut form)?;
    let usernames: Vec<String> = form.employees.iter().map(|e| e.username.clone()).collect();
    check_usernames_free(db, &usernames).await?;

    let txn = db.begin().await?;
    let dept = department::ActiveModel {
        name: Set(form.name),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    insert_inline(&txn, dept.id, form.employees).await?;
    txn.commit().await?;

    tracing::info!("Department {} created with {} employee(s)", dept.name, usernames.len());
    get_department(db, dept.id).await
}

/// Rename a department and add any new inline employees.
pub async fn change_department(
    db: &DatabaseConnection,
    id: i32,
    mut form: DepartmentForm,
) -> Result<DepartmentDetail, DomainError> {
    let existing = department::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)?;
    clean_department(&mut form)?;
    let usernames: Vec<String> = form.employees.iter().map(|e| e.username.clone()).collect();
    check_usernames_free(db, &usernames).await?;

    let txn = db.begin().await?;
    let mut active: department::ActiveModel = existing.into();
    active.name = Set(form.name);
    active.update(&txn).await?;
    insert_inline(&txn, id, form.employees).await?;
    txn.commit().await?;

    get_department(db, id).await
}

pub async fn get_department(
    db: &DatabaseConnection,
    id: i32,
) -> Result<DepartmentDetail, DomainError> {
    let department = department::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)?;
    let employees = employee::Entity::find()
        .filter(employee::Column::DepartmentId.eq(id))
        .order_by_asc(employee::Column::Id)
        .all(db)
        .await?;
    Ok(DepartmentDetail {
        department,
        employees,
    })
}

pub async fn department_changelist(
    db: &DatabaseConnection,
    params: &HashMap<String, String>,
    perms: &ModelPerms,
) -> Result<Changelist<department::Model>, DomainError> {
    let page = page_number(params, DEFAULT_PER_PAGE)?;
    let rows = department::Entity::find()
        .order_by_asc(department::Column::Id)
        .all(db)
        .await?;
    let total = rows.len() as u64;
    Ok(Changelist::paged(
        &site::DEPARTMENT,
        rows,
        total,
        page,
        DEFAULT_PER_PAGE,
        available_actions(&DEPARTMENT_ACTIONS, perms),
    ))
}

async fn delete_departments(db: &DatabaseConnection, ids: &[i32]) -> Result<u64, DomainError> {
    let txn = db.begin().await?;
    employee::Entity::update_many()
        .col_expr(employee::Column::DepartmentId, Expr::value(Option::<i32>::None))
        .filter(employee::Column::DepartmentId.is_in(ids.to_vec()))
        .exec(&txn)
        .await?;
    let result = department::Entity::delete_many()
        .filter(department::Column::Id.is_in(ids.to_vec()))
        .exec(&txn)
        .await?;
    txn.commit().await?;
    Ok(result.rows_affected)
}

pub async fn delete_department(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    if delete_departments(db, &[id]).await? == 0 {
        return Err(DomainError::NotFound);
    }
    Ok(())
}

pub async fn run_department_action(
    db: &DatabaseConnection,
    perms: &ModelPerms,
    request: ActionRequest,
) -> Result<ActionOutcome, DomainError> {
    let def = resolve_action(&DEPARTMENT_ACTIONS, &request.action)?;
    if !def.requires.granted(perms) {
        return Err(DomainError::PermissionDenied);
    }

    let found = department::Entity::find()
        .filter(department::Column::Id.is_in(request.ids.clone()))
        .all(db)
        .await?;
    let selected = order_by_ids(&request.ids, found, |d| d.id);

    if def.name == super::DOWNLOAD_AS_CSV {
        return Ok(ActionOutcome::Csv(export_csv(&site::DEPARTMENT, &selected)?));
    }

    let ids: Vec<i32> = selected.iter().map(|d| d.id).collect();
    let count = delete_departments(db, &ids).await?;
    Ok(ActionOutcome::Deleted { count })
}
