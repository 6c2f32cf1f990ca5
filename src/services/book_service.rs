//! Book Service - changelist, forms and bulk actions of the three book
//! changelists (all books, on sale, upcoming).

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::export::export_csv;
use super::{
    ActionChoice, ActionDef, ActionOutcome, ActionRequest, CSV_ACTION, DELETE_ACTION,
    PUBLISH_TODAY_ACTION, available_actions, resolve_action,
};
use crate::domain::changelist::{
    BookQuery, BookVariant, EMPTY_VALUE_DISPLAY, SIZE_PARAM, format_price,
};
use crate::domain::price_range::{PRICE_RANGE_PARAM, PriceRange, PriceRangeChoice};
use crate::domain::site::{self, ModelPerms};
use crate::domain::validation::{
    BookSize, check_book_rules, check_optional_text, check_required_text,
};
use crate::domain::{BookInput, BookRecord, DomainError, FieldErrors, dedup_ids};
use crate::infrastructure::AppState;
use crate::models::{Book, book, publisher};

pub const BOOK_ACTIONS: [ActionDef; 3] = [CSV_ACTION, PUBLISH_TODAY_ACTION, DELETE_ACTION];

pub const BOOK_COLUMNS: [&str; 6] = ["id", "title", "price", "size", "publisher", "publish_date"];

/// One changelist row, every cell already formatted for display.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BookRow {
    pub id: i32,
    pub title: String,
    pub price: String,
    pub size: String,
    pub publisher: String,
    /// Change page of the publisher, absent when the book has none
    pub publisher_url: Option<String>,
    pub publish_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeChoice {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookFilters {
    pub size: Vec<SizeChoice>,
    pub price_range: Vec<PriceRangeChoice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookChangelist {
    pub model: &'static str,
    pub verbose_name: &'static str,
    pub columns: &'static [&'static str],
    pub rows: Vec<BookRow>,
    pub result_count: u64,
    pub full_result_count: u64,
    pub page: u64,
    pub num_pages: u64,
    pub per_page: u64,
    pub filters: BookFilters,
    pub actions: Vec<ActionChoice>,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn or_empty(value: Option<String>) -> String {
    value.unwrap_or_else(|| EMPTY_VALUE_DISPLAY.to_string())
}

pub fn to_row(book: &book::Model, publisher: Option<&publisher::Model>) -> BookRow {
    BookRow {
        id: book.id,
        title: book.title.clone(),
        // Zero shows as empty, like any falsy price.
        price: or_empty(book.price.filter(|p| *p != 0).map(|p| format_price(p as i64))),
        size: or_empty(
            book.size
                .as_deref()
                .and_then(BookSize::from_code)
                .map(|s| s.label().to_string()),
        ),
        publisher: or_empty(publisher.map(|p| p.name.clone())),
        publisher_url: publisher.map(|p| format!("{}{}/change/", site::PUBLISHER.changelist_url(), p.id)),
        publish_date: or_empty(book.publish_date.map(|d| d.to_string())),
    }
}

/// List the books of `variant` according to the raw query string.
pub async fn changelist(
    state: &AppState,
    variant: BookVariant,
    params: &HashMap<String, String>,
    perms: &ModelPerms,
) -> Result<BookChangelist, DomainError> {
    let query = BookQuery::from_params(variant, params)?;
    let page = state.book_repo.changelist(&query).await?;

    let selected_size = params.get(SIZE_PARAM).map(String::as_str);
    let filters = BookFilters {
        size: BookSize::ALL
            .iter()
            .map(|s| SizeChoice {
                value: s.code(),
                label: s.label(),
                selected: selected_size == Some(s.code()),
            })
            .collect(),
        price_range: PriceRange::choices(params.get(PRICE_RANGE_PARAM).map(String::as_str)),
    };

    let model = variant.model_admin();
    Ok(BookChangelist {
        model: model.object_name,
        verbose_name: model.verbose_name,
        columns: &BOOK_COLUMNS,
        rows: page
            .rows
            .iter()
            .map(|(b, p)| to_row(b, p.as_ref()))
            .collect(),
        result_count: page.result_count,
        full_result_count: page.full_result_count,
        page: query.page,
        num_pages: super::num_pages(page.result_count, query.per_page),
        per_page: query.per_page,
        filters,
        actions: available_actions(&BOOK_ACTIONS, perms),
    })
}

/// Validate a submitted book form against the field rules and the rows it
/// references.
pub async fn clean_book_form(state: &AppState, mut input: BookInput) -> Result<BookInput, DomainError> {
    let mut errors = FieldErrors::new();

    input.title = input.title.trim().to_string();
    input.image = input.image.filter(|s| !s.trim().is_empty());
    input.description = input.description.filter(|s| !s.trim().is_empty());
    input.size = input.size.filter(|s| !s.is_empty());

    check_required_text(&mut errors, "title", &input.title);
    check_optional_text(&mut errors, "image", input.image.as_deref());
    check_book_rules(&mut errors, &input.title, input.price);

    if let Some(size) = &input.size
        && BookSize::from_code(size).is_none()
    {
        errors.add(
            "size",
            format!("Select a valid choice. {} is not one of the available choices.", size),
        );
    }

    if let Some(publisher_id) = input.publisher
        && state.publisher_repo.find_by_id(publisher_id).await?.is_none()
    {
        errors.add(
            "publisher",
            "Select a valid choice. That choice is not one of the available choices.",
        );
    }

    input.authors = dedup_ids(&input.authors);
    let found = state.author_repo.find_many(&input.authors).await?;
    if found.len() != input.authors.len() {
        for id in input
            .authors
            .iter()
            .filter(|id| !found.iter().any(|a| a.id == **id))
        {
            errors.add(
                "authors",
                format!("Select a valid choice. {} is not one of the available choices.", id),
            );
        }
    }

    errors.into_result()?;
    Ok(input)
}

/// Fetch a book, treating rows outside the variant as missing.
pub async fn get_book(state: &AppState, variant: BookVariant, id: i32) -> Result<Book, DomainError> {
    let book = state
        .book_repo
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound)?;
    if !variant.includes(book.publish_date, today()) {
        return Err(DomainError::NotFound);
    }
    Ok(book)
}

pub async fn add_book(
    state: &AppState,
    input: BookInput,
    created_by: Option<i32>,
) -> Result<Book, DomainError> {
    let input = clean_book_form(state, input).await?;
    state.book_repo.create(input, created_by).await
}

pub async fn change_book(
    state: &AppState,
    variant: BookVariant,
    id: i32,
    input: BookInput,
) -> Result<Book, DomainError> {
    get_book(state, variant, id).await?;
    let input = clean_book_form(state, input).await?;
    state.book_repo.update(id, input).await
}

pub async fn delete_book(state: &AppState, variant: BookVariant, id: i32) -> Result<(), DomainError> {
    get_book(state, variant, id).await?;
    state.book_repo.delete_many(&[id]).await?;
    tracing::info!("Book {} deleted", id);
    Ok(())
}

/// Selected books that exist and belong to the variant, in selection order.
async fn selected_records(
    state: &AppState,
    variant: BookVariant,
    ids: &[i32],
) -> Result<Vec<BookRecord>, DomainError> {
    let today = today();
    Ok(state
        .book_repo
        .find_many(ids)
        .await?
        .into_iter()
        .filter(|r| variant.includes(r.book.publish_date, today))
        .collect())
}

/// Run a bulk action over the selected ids.
pub async fn run_action(
    state: &AppState,
    variant: BookVariant,
    perms: &ModelPerms,
    request: ActionRequest,
) -> Result<ActionOutcome, DomainError> {
    let def = resolve_action(&BOOK_ACTIONS, &request.action)?;
    if !def.requires.granted(perms) {
        return Err(DomainError::PermissionDenied);
    }

    let records = selected_records(state, variant, &request.ids).await?;
    let model = variant.model_admin();

    match def.name {
        super::DOWNLOAD_AS_CSV => Ok(ActionOutcome::Csv(export_csv(model, &records)?)),
        super::PUBLISH_TODAY => {
            let ids: Vec<i32> = records.iter().map(|r| r.book.id).collect();
            let count = state.book_repo.publish_on(&ids, today()).await?;
            Ok(ActionOutcome::Updated {
                count,
                message: format!("{} book(s) set to publish today.", count),
            })
        }
        _ => {
            let ids: Vec<i32> = records.iter().map(|r| r.book.id).collect();
            let count = state.book_repo.delete_many(&ids).await?;
            tracing::info!("Deleted {} {} row(s)", count, model.label());
            Ok(ActionOutcome::Deleted { count })
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedTodayRow {
    pub id: i32,
    pub title: String,
    pub created_at: String,
}

/// Books registered on the current local date, for the info page.
pub async fn created_today(state: &AppState) -> Result<Vec<CreatedTodayRow>, DomainError> {
    Ok(state
        .book_repo
        .created_on(today())
        .await?
        .into_iter()
        .map(|b| CreatedTodayRow {
            id: b.id,
            title: b.title,
            created_at: b.created_at,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(price: Option<i32>, size: Option<&str>) -> book::Model {
        book::Model {
            id: 1,
            title: "Rust".to_string(),
            image: None,
            publisher_id: None,
            price,
            size: size.map(str::to_string),
            description: None,
            publish_date: None,
            created_by_id: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn row_formats_cells() {
        let publisher = publisher::Model {
            id: 4,
            name: "Gihyo".to_string(),
            postal_code: None,
            prefecture: None,
            address_1: None,
            address_2: None,
            phone_number: None,
        };
        let row = to_row(&model(Some(1000), Some("a4")), Some(&publisher));
        assert_eq!(row.price, "1,000 円");
        assert_eq!(row.size, "A4 - 210 x 297 mm");
        assert_eq!(row.publisher, "Gihyo");
        assert_eq!(row.publisher_url.as_deref(), Some("/admin/shop/publisher/4/change/"));
        assert_eq!(row.publish_date, "-");
    }

    #[test]
    fn empty_cells_use_placeholder() {
        let row = to_row(&model(None, None), None);
        assert_eq!(row.price, "-");
        assert_eq!(row.size, "-");
        assert_eq!(row.publisher, "-");
        assert!(row.publisher_url.is_none());
    }
}
