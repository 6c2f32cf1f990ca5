use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Local, NaiveDate};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

use bookshop::auth::{create_jwt, verify_password};
use bookshop::db;
use bookshop::domain::{BookInput, PublisherInput};
use bookshop::infrastructure::AppState;
use bookshop::models::{book, employee};
use bookshop::server::build_router;
use bookshop::services::employee_service::{self, NewEmployee};

struct TestApp {
    db: DatabaseConnection,
    state: AppState,
    admin_token: String,
}

impl TestApp {
    fn router(&self) -> Router {
        build_router(self.db.clone(), &[])
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
        let response = self.router().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        (status, body, headers)
    }

    async fn get_json(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, body, _) = self.send(req).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn post_json(&self, uri: &str, token: &str, payload: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let (status, body, _) = self.send(req).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn book(&self, title: &str, price: Option<i64>, publish_date: Option<NaiveDate>) -> i32 {
        self.state
            .book_repo
            .create(
                BookInput {
                    title: title.to_string(),
                    price,
                    publish_date,
                    ..Default::default()
                },
                None,
            )
            .await
            .expect("Failed to create book")
            .id
    }
}

async fn setup() -> TestApp {
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

    TestApp {
        state: AppState::new(db.clone()),
        admin_token: create_jwt(&admin).unwrap(),
        db,
    }
}

fn titles(list: &Value) -> Vec<String> {
    list["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body, _) = app.send(req).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_price_range_filter() {
    let app = setup().await;
    app.book("cheap", Some(500), None).await;
    app.book("thousand", Some(1000), None).await;
    app.book("fifteen hundred", Some(1500), None).await;
    app.book("two thousand", Some(2000), None).await;
    app.book("no price", None, None).await;

    let (status, list) = app
        .get_json("/admin/shop/book/?price_range=1000,2000", &app.admin_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&list), vec!["thousand", "fifteen hundred"]);
    assert_eq!(list["result_count"], 2);
    assert_eq!(list["full_result_count"], 5);

    let (_, list) = app
        .get_json("/admin/shop/book/?price_range=,1000", &app.admin_token)
        .await;
    assert_eq!(titles(&list), vec!["cheap"]);

    let (_, list) = app
        .get_json("/admin/shop/book/?price_range=2000,", &app.admin_token)
        .await;
    assert_eq!(titles(&list), vec!["two thousand"]);

    // No filter keeps the unpriced book
    let (_, list) = app.get_json("/admin/shop/book/", &app.admin_token).await;
    assert_eq!(list["result_count"], 5);
    let no_price = list["rows"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["title"] == "no price")
        .unwrap();
    assert_eq!(no_price["price"], "-");

    let selected: Vec<&Value> = list["filters"]["price_range"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["selected"] == true)
        .collect();
    assert!(selected.is_empty());
}

#[tokio::test]
async fn test_invalid_price_range_is_rejected() {
    let app = setup().await;
    app.book("any", Some(1000), None).await;

    let (status, body) = app
        .get_json("/admin/shop/book/?price_range=abc,2000", &app.admin_token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("lookup"));
}

#[tokio::test]
async fn test_book_variants_split_on_today() {
    let app = setup().await;
    let today = Local::now().date_naive();
    app.book("old", Some(1000), Some(today - Duration::days(3))).await;
    app.book("today", Some(1000), Some(today)).await;
    app.book("later", Some(1000), Some(today + Duration::days(3))).await;
    let undated = app.book("undated", Some(1000), None).await;

    let (_, list) = app
        .get_json("/admin/shop/publishedbook/", &app.admin_token)
        .await;
    assert_eq!(titles(&list), vec!["old", "today"]);

    let (_, list) = app
        .get_json("/admin/shop/unpublishedbook/", &app.admin_token)
        .await;
    assert_eq!(titles(&list), vec!["later", "undated"]);

    // An upcoming book does not exist under the on-sale admin
    let (status, _) = app
        .get_json(
            &format!("/admin/shop/publishedbook/{}/change/", undated),
            &app.admin_token,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_as_csv() {
    let app = setup().await;
    let first = app.book("first", Some(1000), None).await;
    let second = app.book("second", None, None).await;

    let req = Request::builder()
        .method("POST")
        .uri("/admin/shop/book/actions/")
        .header("Authorization", format!("Bearer {}", app.admin_token))
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({ "action": "download_as_csv", "ids": [second, first] }).to_string(),
        ))
        .unwrap();
    let (status, body, headers) = app.send(req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=shop.book.csv"
    );

    let text = String::from_utf8(body).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "id,title,image,publisher,price,size,description,publish_date,created_by,created_at"
    );
    assert_eq!(lines.len(), 3);
    // Selection order, empty cells for missing values
    assert!(lines[1].starts_with(&format!("{},second,,,,,,,,", second)));
    assert!(lines[2].starts_with(&format!("{},first,,,1000,,,,,", first)));
}

#[tokio::test]
async fn test_publish_today_only_touches_selection() {
    let app = setup().await;
    let today = Local::now().date_naive();
    let later = today + Duration::days(10);
    let selected = app.book("selected", None, Some(later)).await;
    let untouched = app.book("untouched", None, Some(later)).await;

    let (status, body) = app
        .post_json(
            "/admin/shop/book/actions/",
            &app.admin_token,
            json!({ "action": "publish_today", "ids": [selected] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let selected = book::Entity::find_by_id(selected)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(selected.publish_date, Some(today));

    let untouched = book::Entity::find_by_id(untouched)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.publish_date, Some(later));
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let app = setup().await;
    let id = app.book("any", None, None).await;

    let (status, body) = app
        .post_json(
            "/admin/shop/book/actions/",
            &app.admin_token,
            json!({ "action": "burn_everything", "ids": [id] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["action"].is_array());
}

#[tokio::test]
async fn test_publisher_composite_fields() {
    let app = setup().await;

    let (status, body) = app
        .post_json(
            "/admin/shop/publisher/",
            &app.admin_token,
            json!({
                "name": "技術評論社",
                "postal_code": ["162", "0846"],
                "prefecture": "東京都",
                "address_1": "新宿区市谷左内町21-13",
                "phone_number": ["03", "3513", "6150"],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["postal_code"], "162-0846");
    assert_eq!(body["phone_number"], "03-3513-6150");
    assert_eq!(body["postal_code_parts"], json!(["162", "0846"]));

    let (status, body) = app
        .post_json(
            "/admin/shop/publisher/",
            &app.admin_token,
            json!({
                "name": "Bad",
                "postal_code": ["16", "0846"],
                "prefecture": "東京都",
                "phone_number": ["", "", ""],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["postal_code"].is_array());
}

#[tokio::test]
async fn test_publisher_with_books_is_protected() {
    let app = setup().await;
    let publisher = app
        .state
        .publisher_repo
        .create(PublisherInput {
            name: "Busy".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    app.state
        .book_repo
        .create(
            BookInput {
                title: "Referencing".to_string(),
                publisher: Some(publisher.id),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    let (status, body) = app
        .post_json(
            &format!("/admin/shop/publisher/{}/delete/", publisher.id),
            &app.admin_token,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().starts_with("Cannot delete"));
}

#[tokio::test]
async fn test_admin_index_ordering() {
    let app = setup().await;
    let (status, body) = app.get_json("/admin/", &app.admin_token).await;
    assert_eq!(status, StatusCode::OK);

    let apps = body["app_list"].as_array().unwrap();
    let labels: Vec<&str> = apps.iter().map(|a| a["app_label"].as_str().unwrap()).collect();
    assert_eq!(labels, vec!["accounts", "shop", "addresses"]);

    let accounts: Vec<&str> = apps[0]["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["object_name"].as_str().unwrap())
        .collect();
    assert_eq!(accounts, vec!["Employee", "Department"]);

    let shop: Vec<&str> = apps[1]["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["object_name"].as_str().unwrap())
        .collect();
    assert_eq!(&shop[..3], &["Book", "Author", "Publisher"]);
}

#[tokio::test]
async fn test_info_lists_books_created_today() {
    let app = setup().await;
    app.book("fresh", None, None).await;

    let (status, body) = app.get_json("/admin/info/", &app.admin_token).await;
    assert_eq!(status, StatusCode::OK);
    let books = body["books_created_today"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "fresh");
}

#[tokio::test]
async fn test_department_inline_employees() {
    let app = setup().await;

    let (status, body) = app
        .post_json(
            "/admin/accounts/department/",
            &app.admin_token,
            json!({
                "name": "Sales",
                "employees": [
                    { "username": "taro", "last_name": "山田", "first_name": "太郎" },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Sales");
    assert_eq!(body["employees"].as_array().unwrap().len(), 1);

    let taro = employee::Entity::find()
        .all(&app.db)
        .await
        .unwrap()
        .into_iter()
        .find(|e| e.username == "taro")
        .unwrap();
    assert!(!taro.is_staff);
    assert!(verify_password(employee_service::INITIAL_PASSWORD, &taro.password_hash).unwrap());

    // Duplicate inline usernames never reach the database
    let before = employee::Entity::find().count(&app.db).await.unwrap();
    let (status, body) = app
        .post_json(
            "/admin/accounts/department/",
            &app.admin_token,
            json!({
                "name": "Support",
                "employees": [{ "username": "hanako" }, { "username": "hanako" }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["employees-1-username"].is_array());
    assert_eq!(employee::Entity::find().count(&app.db).await.unwrap(), before);
}

#[tokio::test]
async fn test_login_returns_token() {
    let app = setup().await;

    let (status, body) = app
        .post_json(
            "/admin/login/",
            "",
            json!({ "username": "admin", "password": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    let token = body["token"].as_str().unwrap();

    let (status, _) = app.get_json("/admin/", token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post_json(
            "/admin/login/",
            "",
            json!({ "username": "admin", "password": "wrong" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
