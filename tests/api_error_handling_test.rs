use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

use bookshop::auth::create_jwt;
use bookshop::db;
use bookshop::import;
use bookshop::models::address;
use bookshop::server::build_router;
use bookshop::services::employee_service::{self, NewEmployee};

const HOKKAIDO: &str = "01101,060  ,0600000,ﾎｯｶｲﾄﾞｳ,ｻｯﾎﾟﾛｼﾁｭｳｵｳｸ,,北海道,札幌市中央区,,0,0,0,0,0,0\n\
01101,064  ,0640941,ﾎｯｶｲﾄﾞｳ,ｻｯﾎﾟﾛｼﾁｭｳｵｳｸ,ｱｻﾋｶﾞｵｶ,北海道,札幌市中央区,旭ケ丘,0,0,1,0,0,0\n";

async fn setup() -> (DatabaseConnection, String) {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let admin = employee_service::create_employee(
        &db,
        NewEmployee {
            username: "admin".to_string(),
            password: "admin".to_string(),
            is_staff: true,
            is_superuser: true,
            ..Default::default()
        },
    )
    .await
    .expect("Failed to create admin");
    let token = create_jwt(&admin).unwrap();
    (db, token)
}

async fn request(
    db: &DatabaseConnection,
    method: &str,
    uri: &str,
    token: Option<&str>,
    payload: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let body = match payload {
        Some(p) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(p.to_string())
        }
        None => Body::empty(),
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
async fn test_get_book_not_found() {
    let (db, token) = setup().await;
    let (status, body) = request(&db, "GET", "/admin/shop/book/999/change/", Some(&token), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Resource not found");
}

#[tokio::test]
async fn test_create_book_invalid_input() {
    let (db, token) = setup().await;

    let (status, body) = request(
        &db,
        "POST",
        "/admin/shop/book/",
        Some(&token),
        Some(json!({
            "title": "Java入門",
            "price": 1000,
            "size": "a3",
            "publisher": 42,
            "authors": [7],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = &body["errors"];
    assert!(errors["title"].is_array());
    assert!(errors["size"].is_array());
    assert!(errors["publisher"].is_array());
    assert!(errors["authors"].is_array());

    let (status, body) = request(
        &db,
        "POST",
        "/admin/shop/book/",
        Some(&token),
        Some(json!({ "title": "とても薄い本", "price": 3001 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["__all__"].is_array());
}

#[tokio::test]
async fn test_create_and_change_book() {
    let (db, token) = setup().await;

    let (status, author) = request(
        &db,
        "POST",
        "/admin/shop/author/",
        Some(&token),
        Some(json!({ "name": "Steve Klabnik" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, book) = request(
        &db,
        "POST",
        "/admin/shop/book/",
        Some(&token),
        Some(json!({
            "title": "  The Rust Programming Language ",
            "price": 3000,
            "size": "b5",
            "authors": [author["id"], author["id"]],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["title"], "The Rust Programming Language");
    assert_eq!(book["authors"].as_array().unwrap().len(), 1);
    assert_eq!(book["created_by"], "admin");

    let id = book["id"].as_i64().unwrap();
    let (status, changed) = request(
        &db,
        "POST",
        &format!("/admin/shop/book/{}/change/", id),
        Some(&token),
        Some(json!({ "title": "The Book", "price": 2500 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(changed["price"], 2500);
    assert!(changed["authors"].as_array().unwrap().is_empty());

    let (status, _) = request(
        &db,
        "POST",
        &format!("/admin/shop/book/{}/delete/", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
        &db,
        "POST",
        &format!("/admin/shop/book/{}/delete/", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_page_number() {
    let (db, token) = setup().await;
    let (status, _) = request(&db, "GET", "/admin/shop/book/?p=abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_huge_page_number_is_rejected() {
    let (db, token) = setup().await;
    for uri in [
        "/admin/shop/book/",
        "/admin/shop/unpublishedbook/",
        "/admin/shop/author/",
        "/admin/shop/publisher/",
        "/admin/shop/bookstock/",
        "/admin/addresses/address/",
        "/admin/accounts/employee/",
        "/admin/accounts/department/",
    ] {
        let (status, body) = request(
            &db,
            "GET",
            &format!("{}?p=18446744073709551615", uri),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].as_str().unwrap().contains("out of range"));
    }

    // Large but representable pages are simply empty
    let (status, body) = request(&db, "GET", "/admin/shop/author/?p=1000000", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["rows"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_takes_wildcards_literally() {
    let (db, token) = setup().await;
    for name in ["100% Rust", "Plain"] {
        let (status, _) = request(
            &db,
            "POST",
            "/admin/shop/author/",
            Some(&token),
            Some(json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, _) = request(
        &db,
        "POST",
        "/admin/shop/book/",
        Some(&token),
        Some(json!({ "title": "snake_case" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = request(&db, "GET", "/admin/shop/author/?q=%25", Some(&token), None).await;
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);

    let (_, body) = request(&db, "GET", "/admin/shop/author/?q=_", Some(&token), None).await;
    assert!(body["rows"].as_array().unwrap().is_empty());

    let (_, body) = request(&db, "GET", "/admin/shop/book/?q=e_c", Some(&token), None).await;
    assert_eq!(body["result_count"], 1);

    let (_, body) = request(&db, "GET", "/admin/shop/book/?q=_x", Some(&token), None).await;
    assert_eq!(body["result_count"], 0);
}

#[tokio::test]
async fn test_stock_is_one_per_book() {
    let (db, token) = setup().await;

    let (_, book) = request(
        &db,
        "POST",
        "/admin/shop/book/",
        Some(&token),
        Some(json!({ "title": "Stocked" })),
    )
    .await;

    let (status, _) = request(
        &db,
        "POST",
        "/admin/shop/bookstock/",
        Some(&token),
        Some(json!({ "book": book["id"], "quantity": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(
        &db,
        "POST",
        "/admin/shop/bookstock/",
        Some(&token),
        Some(json!({ "book": book["id"], "quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["book"].is_array());
}

#[tokio::test]
async fn test_address_lookup() {
    let (db, token) = setup().await;
    let summary = import::import_bytes(&db, HOKKAIDO.as_bytes(), "utf-8")
        .await
        .unwrap();
    assert_eq!(summary.inserted, 2);

    // Public endpoint
    let (status, body) = request(&db, "GET", "/address/?postalCode=0640941", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{ "prefecture": "北海道", "city": "札幌市中央区", "section": "旭ケ丘" }])
    );

    let (_, body) = request(&db, "GET", "/address/?postalCode=9999999", None, None).await;
    assert_eq!(body, json!([]));

    let (_, body) = request(&db, "GET", "/address/", None, None).await;
    assert_eq!(body, json!([]));

    let (status, body) = request(
        &db,
        "GET",
        "/admin/addresses/address/?has_chome__exact=1",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result_count"], 1);

    let (status, _) = request(
        &db,
        "GET",
        "/admin/addresses/address/?has_chome__exact=yes",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_aborts_on_bad_row() {
    let (db, _) = setup().await;
    let text = format!("{}01101,060  ,0600001,broken\n", HOKKAIDO);

    let result = import::import_bytes(&db, text.as_bytes(), "utf-8").await;
    assert!(result.is_err());
    assert_eq!(address::Entity::find().count(&db).await.unwrap(), 0);

    let result = import::import_bytes(&db, HOKKAIDO.as_bytes(), "klingon").await;
    assert!(result.is_err());
}
