pub mod accounts;
pub mod addresses;
pub mod auth;
pub mod authors;
pub mod books;
pub mod error;
pub mod health;
pub mod publishers;
pub mod site;
pub mod stock;

use axum::{
    Extension, Json, Router,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::domain::changelist::BookVariant;
use crate::infrastructure::AppState;
use crate::services::{ActionOutcome, CSV_CONTENT_TYPE};

/// Render the result of a bulk action.
pub fn action_response(outcome: ActionOutcome) -> Response {
    match outcome {
        ActionOutcome::Csv(export) => {
            let disposition = HeaderValue::from_str(&export.content_disposition())
                .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static(CSV_CONTENT_TYPE)),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                export.body,
            )
                .into_response()
        }
        ActionOutcome::Updated { count, message } => {
            Json(json!({ "updated": count, "message": message })).into_response()
        }
        ActionOutcome::Deleted { count } => Json(json!({ "deleted": count })).into_response(),
    }
}

/// Changelist, add, change, delete and action routes of one book variant.
fn book_routes(router: Router<AppState>, variant: BookVariant) -> Router<AppState> {
    let base = variant.model_admin().changelist_url();
    router
        .route(
            &base,
            get(books::changelist)
                .post(books::add)
                .layer(Extension(variant)),
        )
        .route(
            &format!("{}:id/change/", base),
            get(books::detail)
                .post(books::change)
                .layer(Extension(variant)),
        )
        .route(
            &format!("{}:id/delete/", base),
            post(books::delete).layer(Extension(variant)),
        )
        .route(
            &format!("{}actions/", base),
            post(books::action).layer(Extension(variant)),
        )
}

pub fn api_router() -> Router<AppState> {
    let router = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Site
        .route("/admin/", get(site::index))
        .route("/admin/info/", get(site::info))
        .route("/admin/login/", post(auth::login))
        // Address lookup for the address form
        .route("/address/", get(addresses::lookup))
        // Authors
        .route(
            "/admin/shop/author/",
            get(authors::changelist).post(authors::add),
        )
        .route(
            "/admin/shop/author/:id/change/",
            get(authors::detail).post(authors::change),
        )
        .route("/admin/shop/author/:id/delete/", post(authors::delete))
        .route("/admin/shop/author/actions/", post(authors::action))
        // Publishers
        .route(
            "/admin/shop/publisher/",
            get(publishers::changelist).post(publishers::add),
        )
        .route(
            "/admin/shop/publisher/:id/change/",
            get(publishers::detail).post(publishers::change),
        )
        .route(
            "/admin/shop/publisher/:id/delete/",
            post(publishers::delete),
        )
        .route("/admin/shop/publisher/actions/", post(publishers::action))
        // Stock
        .route(
            "/admin/shop/bookstock/",
            get(stock::changelist).post(stock::add),
        )
        .route(
            "/admin/shop/bookstock/:id/change/",
            get(stock::detail).post(stock::change),
        )
        .route("/admin/shop/bookstock/:id/delete/", post(stock::delete))
        .route("/admin/shop/bookstock/actions/", post(stock::action))
        // Addresses
        .route("/admin/addresses/address/", get(addresses::changelist))
        .route(
            "/admin/addresses/address/:id/change/",
            get(addresses::detail),
        )
        .route(
            "/admin/addresses/address/:id/delete/",
            post(addresses::delete),
        )
        .route("/admin/addresses/address/actions/", post(addresses::action))
        // Departments
        .route(
            "/admin/accounts/department/",
            get(accounts::department_changelist).post(accounts::add_department),
        )
        .route(
            "/admin/accounts/department/:id/change/",
            get(accounts::department_detail).post(accounts::change_department),
        )
        .route(
            "/admin/accounts/department/:id/delete/",
            post(accounts::delete_department),
        )
        .route(
            "/admin/accounts/department/actions/",
            post(accounts::department_action),
        )
        // Employees
        .route(
            "/admin/accounts/employee/",
            get(accounts::employee_changelist).post(accounts::add_employee),
        )
        .route(
            "/admin/accounts/employee/:id/change/",
            get(accounts::employee_detail),
        )
        .route(
            "/admin/accounts/employee/:id/delete/",
            post(accounts::delete_employee),
        )
        .route(
            "/admin/accounts/employee/actions/",
            post(accounts::employee_action),
        );

    [
        BookVariant::All,
        BookVariant::Published,
        BookVariant::Unpublished,
    ]
    .into_iter()
    .fold(router, book_routes)
}
