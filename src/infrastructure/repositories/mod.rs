//! Repository implementations using SeaORM

pub mod author_repository;
pub mod book_repository;
pub mod publisher_repository;

use sea_orm::ColumnTrait;
use sea_orm::sea_query::{Expr, LikeExpr, SimpleExpr};

use crate::domain::changelist::like_contains;

pub use author_repository::SeaOrmAuthorRepository;
pub use book_repository::SeaOrmBookRepository;
pub use publisher_repository::SeaOrmPublisherRepository;

/// Case-insensitive substring match that takes `%` and `_` in `term`
/// literally, unlike `ColumnTrait::contains`.
pub fn contains_literal<C: ColumnTrait>(column: C, term: &str) -> SimpleExpr {
    Expr::col((column.entity_name(), column)).like(LikeExpr::new(like_contains(term)).escape('\\'))
}
