//! Shared handler state: the connection plus the repositories of the shop app.

use axum::extract::FromRef;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{AuthorRepository, BookRepository, PublisherRepository};
use crate::infrastructure::{
    SeaOrmAuthorRepository, SeaOrmBookRepository, SeaOrmPublisherRepository,
};

#[derive(Clone)]
pub struct AppState {
    /// Used directly by the stock, address and account services
    db: DatabaseConnection,
    pub book_repo: Arc<dyn BookRepository>,
    pub author_repo: Arc<dyn AuthorRepository>,
    pub publisher_repo: Arc<dyn PublisherRepository>,
}

impl AppState {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            book_repo: Arc::new(SeaOrmBookRepository::new(db.clone())),
            author_repo: Arc::new(SeaOrmAuthorRepository::new(db.clone())),
            publisher_repo: Arc::new(SeaOrmPublisherRepository::new(db.clone())),
            db,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Handlers without repositories take `State<DatabaseConnection>`.
impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
