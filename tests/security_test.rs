use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

use bookshop::auth::{create_jwt, decode_jwt, hash_password, verify_password};
use bookshop::db;
use bookshop::server::build_router;
use bookshop::services::employee_service::{self, NewEmployee};

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

async fn employee(db: &DatabaseConnection, username: &str, staff: bool, perms: &[&str]) -> String {
    let user = employee_service::create_employee(
        db,
        NewEmployee {
            username: username.to_string(),
            password: "pass12345".to_string(),
            is_staff: staff,
            permissions: perms.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to create employee");
    create_jwt(&user).unwrap()
}

async fn call(
    db: &DatabaseConnection,
    method: &str,
    uri: &str,
    token: Option<&str>,
    payload: Value,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let body = if method == "GET" {
        Body::empty()
    } else {
        Body::from(payload.to_string())
    };

    let response = build_router(db.clone(), &[])
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_password_hashing() {
    let password = "super_secret_password";
    let hash = hash_password(password).expect("Failed to hash password");

    assert_ne!(password, hash);
    assert!(verify_password(password, &hash).unwrap());
    assert!(!verify_password("wrong_password", &hash).unwrap());
}

#[tokio::test]
async fn test_jwt_carries_permissions() {
    let db = setup_test_db().await;
    let token = employee(&db, "clerk", true, &["view_book", "change_publisher"]).await;

    let claims = decode_jwt(&token).expect("Failed to verify JWT");
    assert_eq!(claims.sub, "clerk");
    assert!(claims.staff);
    assert!(!claims.superuser);
    assert!(claims.has_perm("view_book"));
    assert!(!claims.has_perm("delete_book"));
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let db = setup_test_db().await;
    let (status, _) = call(&db, "GET", "/admin/shop/book/", None, Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&db, "GET", "/admin/", Some("not-a-token"), Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_staff_cannot_use_admin() {
    let db = setup_test_db().await;
    let token = employee(&db, "outsider", false, &["view_book"]).await;

    let (status, _) = call(&db, "GET", "/admin/shop/book/", Some(&token), Value::Null).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &db,
        "POST",
        "/admin/login/",
        None,
        json!({ "username": "outsider", "password": "pass12345" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_view_only_staff() {
    let db = setup_test_db().await;
    let token = employee(&db, "clerk", true, &["view_book"]).await;

    let (status, list) = call(&db, "GET", "/admin/shop/book/", Some(&token), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = list["actions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["download_as_csv"]);

    let (status, _) = call(
        &db,
        "POST",
        "/admin/shop/book/",
        Some(&token),
        json!({ "title": "Not allowed" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &db,
        "POST",
        "/admin/shop/book/actions/",
        Some(&token),
        json!({ "action": "publish_today", "ids": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&db, "GET", "/admin/shop/author/", Some(&token), Value::Null).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_index_only_lists_permitted_models() {
    let db = setup_test_db().await;
    let token = employee(&db, "clerk", true, &["view_book", "change_publisher"]).await;

    let (status, body) = call(&db, "GET", "/admin/", Some(&token), Value::Null).await;
    assert_eq!(status, StatusCode::OK);

    let apps = body["app_list"].as_array().unwrap();
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0]["app_label"], "shop");
    let models: Vec<&str> = apps[0]["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["object_name"].as_str().unwrap())
        .collect();
    assert_eq!(models, vec!["Book", "Publisher"]);
    assert_eq!(apps[0]["models"][1]["perms"]["view"], true);
    assert_eq!(apps[0]["models"][1]["perms"]["delete"], false);
}

#[tokio::test]
async fn test_only_superuser_creates_superuser() {
    let db = setup_test_db().await;
    let token = employee(&db, "manager", true, &["add_employee", "view_employee"]).await;

    let (status, _) = call(
        &db,
        "POST",
        "/admin/accounts/employee/",
        Some(&token),
        json!({ "username": "root2", "password": "pass12345", "is_superuser": true }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &db,
        "POST",
        "/admin/accounts/employee/",
        Some(&token),
        json!({ "username": "newbie", "password": "pass12345" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
