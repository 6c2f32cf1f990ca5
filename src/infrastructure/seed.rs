use chrono::{Duration, Local};
use sea_orm::*;

use crate::domain::{BookInput, DomainError, PublisherInput};
use crate::infrastructure::AppState;
use crate::models::employee;
use crate::services::employee_service::{self, NewEmployee};

/// Demo data: a superuser, a view-only clerk, authors, a publisher and a
/// handful of books on both sides of today. Skipped if `admin` exists.
pub async fn seed_demo_data(state: &AppState) -> Result<(), DomainError> {
    let db = state.db();

    let existing = employee::Entity::find()
        .filter(employee::Column::Username.eq("admin"))
        .one(db)
        .await?;
    if existing.is_some() {
        tracing::info!("Demo data already present, skipping");
        return Ok(());
    }

    // 1. Users
    let admin = employee_service::create_employee(
        db,
        NewEmployee {
            username: "admin".to_owned(),
            password: "admin".to_owned(),
            is_staff: true,
            is_superuser: true,
            ..Default::default()
        },
    )
    .await?;

    employee_service::create_employee(
        db,
        NewEmployee {
            username: "clerk".to_owned(),
            password: "clerk".to_owned(),
            is_staff: true,
            permissions: vec!["view_book".to_owned(), "view_publisher".to_owned()],
            ..Default::default()
        },
    )
    .await?;

    // 2. Authors
    let mut author_ids = Vec::new();
    for name in ["山田太郎", "鈴木花子", "Steve Klabnik"] {
        author_ids.push(state.author_repo.create(name.to_owned()).await?.id);
    }

    // 3. Publisher
    let publisher = state
        .publisher_repo
        .create(PublisherInput {
            name: "技術評論社".to_owned(),
            postal_code: Some("162-0846".to_owned()),
            prefecture: Some("東京都".to_owned()),
            address_1: Some("新宿区市谷左内町21-13".to_owned()),
            address_2: None,
            phone_number: Some("03-3513-6150".to_owned()),
        })
        .await?;

    // 4. Books
    let today = Local::now().date_naive();
    let books = [
        ("Django Admin 入門", Some(1000), Some("a4"), Some(today - Duration::days(30))),
        ("The Rust Programming Language", Some(2000), Some("b5"), Some(today)),
        ("とても薄い本", Some(500), None, Some(today + Duration::days(14))),
        ("未定の本", None, None, None),
    ];

    for (i, (title, price, size, publish_date)) in books.into_iter().enumerate() {
        state
            .book_repo
            .create(
                BookInput {
                    title: title.to_owned(),
                    publisher: Some(publisher.id),
                    authors: vec![author_ids[i % author_ids.len()]],
                    price,
                    size: size.map(str::to_owned),
                    publish_date,
                    ..Default::default()
                },
                Some(admin.id),
            )
            .await?;
    }

    Ok(())
}
