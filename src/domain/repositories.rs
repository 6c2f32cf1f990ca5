//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DomainError;
use super::changelist::BookQuery;
use crate::models::{author, book, publisher};
use crate::models::Book;

/// One changelist page of books with their publishers.
#[derive(Debug)]
pub struct BookPage {
    pub rows: Vec<(book::Model, Option<publisher::Model>)>,
    /// Rows matching the filters
    pub result_count: u64,
    /// Rows in the variant before filtering
    pub full_result_count: u64,
}

/// A book with its foreign keys resolved to display strings, for export.
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub book: book::Model,
    pub publisher_name: Option<String>,
    pub created_by_username: Option<String>,
}

/// Cleaned book form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookInput {
    pub title: String,
    pub image: Option<String>,
    pub publisher: Option<i32>,
    #[serde(default)]
    pub authors: Vec<i32>,
    pub price: Option<i64>,
    pub size: Option<String>,
    pub description: Option<String>,
    pub publish_date: Option<NaiveDate>,
}

/// Publisher form data after the composite widgets were recombined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublisherInput {
    pub name: String,
    pub postal_code: Option<String>,
    pub prefecture: Option<String>,
    pub address_1: Option<String>,
    pub address_2: Option<String>,
    pub phone_number: Option<String>,
}

/// Repository trait for Book entity
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Filtered, ordered, paginated changelist
    async fn changelist(&self, query: &BookQuery) -> Result<BookPage, DomainError>;

    /// Find a single book by ID, with authors and foreign keys resolved
    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError>;

    /// Fetch the given books in the order of `ids`, skipping unknown ids
    async fn find_many(&self, ids: &[i32]) -> Result<Vec<BookRecord>, DomainError>;

    /// Books whose creation timestamp falls on `day`
    async fn created_on(&self, day: NaiveDate) -> Result<Vec<book::Model>, DomainError>;

    /// Create a new book
    async fn create(&self, input: BookInput, created_by: Option<i32>) -> Result<Book, DomainError>;

    /// Update an existing book
    async fn update(&self, id: i32, input: BookInput) -> Result<Book, DomainError>;

    /// Set `publish_date` on every listed book in one statement
    async fn publish_on(&self, ids: &[i32], date: NaiveDate) -> Result<u64, DomainError>;

    /// Delete books together with their stock rows and author links
    async fn delete_many(&self, ids: &[i32]) -> Result<u64, DomainError>;
}

/// Repository trait for Author entity
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Find all authors, optionally filtered by a name fragment
    async fn find_all(&self, search: Option<&str>) -> Result<Vec<author::Model>, DomainError>;

    /// Find an author by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<author::Model>, DomainError>;

    /// Fetch the given authors in the order of `ids`
    async fn find_many(&self, ids: &[i32]) -> Result<Vec<author::Model>, DomainError>;

    /// Create a new author
    async fn create(&self, name: String) -> Result<author::Model, DomainError>;

    /// Rename an author
    async fn update(&self, id: i32, name: String) -> Result<author::Model, DomainError>;

    /// Delete authors and their book links
    async fn delete_many(&self, ids: &[i32]) -> Result<u64, DomainError>;
}

/// Repository trait for Publisher entity
#[async_trait]
pub trait PublisherRepository: Send + Sync {
    async fn find_all(&self, search: Option<&str>) -> Result<Vec<publisher::Model>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<publisher::Model>, DomainError>;

    async fn find_many(&self, ids: &[i32]) -> Result<Vec<publisher::Model>, DomainError>;

    async fn create(&self, input: PublisherInput) -> Result<publisher::Model, DomainError>;

    async fn update(&self, id: i32, input: PublisherInput)
    -> Result<publisher::Model, DomainError>;

    /// Delete publishers; fails with `Protected` if any book still references one
    async fn delete_many(&self, ids: &[i32]) -> Result<u64, DomainError>;
}

/// Keep the first occurrence of every id, preserving order.
pub fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Arrange fetched rows in the order of `ids`.
pub fn order_by_ids<T, F>(ids: &[i32], rows: Vec<T>, id_of: F) -> Vec<T>
where
    F: Fn(&T) -> i32,
{
    let mut by_id: std::collections::HashMap<i32, T> =
        rows.into_iter().map(|row| (id_of(&row), row)).collect();
    dedup_ids(ids)
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn rows_follow_selection_order() {
        let rows = vec![(1, "a"), (2, "b"), (3, "c")];
        let ordered = order_by_ids(&[3, 9, 1, 3], rows, |r| r.0);
        assert_eq!(ordered, vec![(3, "c"), (1, "a")]);
    }
}
