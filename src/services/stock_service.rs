//! Stock Service - one stock row per book.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use super::export::StockRecord;
use super::{
    ActionDef, ActionOutcome, ActionRequest, CSV_ACTION, Changelist, DELETE_ACTION,
    available_actions, export_csv, resolve_action,
};
use crate::domain::changelist::{DEFAULT_PER_PAGE, page_number};
use crate::domain::site::{self, ModelPerms};
use crate::domain::{DomainError, order_by_ids};
use crate::models::{book, book_stock};

pub const STOCK_ACTIONS: [ActionDef; 2] = [CSV_ACTION, DELETE_ACTION];

#[derive(Debug, Clone, Deserialize)]
pub struct StockForm {
    pub book: i32,
    #[serde(default)]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockRow {
    pub id: i32,
    pub book: i32,
    /// Display string of the stock row
    pub title: String,
    pub quantity: i32,
}

impl From<StockRecord> for StockRow {
    fn from(r: StockRecord) -> Self {
        Self {
            id: r.id,
            book: r.book_id,
            title: r.book_title,
            quantity: r.quantity,
        }
    }
}

async fn records(
    db: &DatabaseConnection,
    ids: Option<&[i32]>,
) -> Result<Vec<StockRecord>, DomainError> {
    let mut query = book_stock::Entity::find().find_also_related(book::Entity);
    if let Some(ids) = ids {
        query = query.filter(book_stock::Column::Id.is_in(ids.to_vec()));
    }
    let rows = query
        .order_by_asc(book_stock::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|(stock, book)| StockRecord {
            id: stock.id,
            book_id: stock.book_id,
            book_title: book.map(|b| b.title).unwrap_or_default(),
            quantity: stock.quantity,
        })
        .collect();
    Ok(rows)
}

pub async fn changelist(
    db: &DatabaseConnection,
    params: &HashMap<String, String>,
    perms: &ModelPerms,
) -> Result<Changelist<StockRow>, DomainError> {
    let page = page_number(params, DEFAULT_PER_PAGE)?;
    let rows: Vec<StockRow> = records(db, None).await?.into_iter().map(StockRow::from).collect();
    let total = rows.len() as u64;
    Ok(Changelist::paged(
        &site::BOOK_STOCK,
        rows,
        total,
        page,
        DEFAULT_PER_PAGE,
        available_actions(&STOCK_ACTIONS, perms),
    ))
}

pub async fn get_stock(db: &DatabaseConnection, id: i32) -> Result<StockRow, DomainError> {
    records(db, Some(std::slice::from_ref(&id)))
        .await?
        .into_iter()
        .next()
        .map(StockRow::from)
        .ok_or(DomainError::NotFound)
}

/// The referenced book must exist and must not have a stock row yet
/// (other than `current`).
async fn check_book(
    db: &DatabaseConnection,
    book_id: i32,
    current: Option<i32>,
) -> Result<(), DomainError> {
    if book::Entity::find_by_id(book_id).one(db).await?.is_none() {
        return Err(DomainError::field(
            "book",
            "Select a valid choice. That choice is not one of the available choices.",
        ));
    }

    let mut taken = book_stock::Entity::find().filter(book_stock::Column::BookId.eq(book_id));
    if let Some(id) = current {
        taken = taken.filter(book_stock::Column::Id.ne(id));
    }
    if taken.count(db).await? > 0 {
        return Err(DomainError::field(
            "book",
            "Stock with this book already exists.",
        ));
    }
    Ok(())
}

pub async fn add_stock(db: &DatabaseConnection, form: StockForm) -> Result<StockRow, DomainError> {
    check_book(db, form.book, None).await?;
    let stock = book_stock::ActiveModel {
        book_id: Set(form.book),
        quantity: Set(form.quantity),
        ..Default::default()
    }
    .insert(db)
    .await?;
    get_stock(db, stock.id).await
}

pub async fn change_stock(
    db: &DatabaseConnection,
    id: i32,
    form: StockForm,
) -> Result<StockRow, DomainError> {
    let existing = book_stock::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)?;
    check_book(db, form.book, Some(id)).await?;

    let mut active: book_stock::ActiveModel = existing.into();
    active.book_id = Set(form.book);
    active.quantity = Set(form.quantity);
    active.update(db).await?;
    get_stock(db, id).await
}

pub async fn delete_stock(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    let result = book_stock::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(DomainError::NotFound);
    }
    Ok(())
}

pub async fn run_action(
    db: &DatabaseConnection,
    perms: &ModelPerms,
    request: ActionRequest,
) -> Result<ActionOutcome, DomainError> {
    let def = resolve_action(&STOCK_ACTIONS, &request.action)?;
    if !def.requires.granted(perms) {
        return Err(DomainError::PermissionDenied);
    }
    let selected = order_by_ids(&request.ids, records(db, Some(request.ids.as_slice())).await?, |r| r.id);
    if def.name == super::DOWNLOAD_AS_CSV {
        return Ok(ActionOutcome::Csv(export_csv(&site::BOOK_STOCK, &selected)?));
    }

    let ids: Vec<i32> = selected.iter().map(|r| r.id).collect();
    let result = book_stock::Entity::delete_many()
        .filter(book_stock::Column::Id.is_in(ids))
        .exec(db)
        .await?;
    Ok(ActionOutcome::Deleted {
        count: result.rows_affected,
    })
}
