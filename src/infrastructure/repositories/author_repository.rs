//! SeaORM implementation of AuthorRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::domain::{AuthorRepository, DomainError, order_by_ids};
use crate::models::author::{ActiveModel, Column, Entity as AuthorEntity, Model};
use crate::models::book_authors;

/// SeaORM-based implementation of AuthorRepository
pub struct SeaOrmAuthorRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuthorRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthorRepository for SeaOrmAuthorRepository {
    async fn find_all(&self, search: Option<&str>) -> Result<Vec<Model>, DomainError> {
        let mut query = AuthorEntity::find();
        if let Some(q) = search
            && !q.trim().is_empty()
        {
            query = query.filter(super::contains_literal(Column::Name, q.trim()));
        }
        Ok(query.order_by_asc(Column::Id).all(&self.db).await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Model>, DomainError> {
        Ok(AuthorEntity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_many(&self, ids: &[i32]) -> Result<Vec<Model>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let authors = AuthorEntity::find()
            .filter(Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(order_by_ids(ids, authors, |a| a.id))
    }

    async fn create(&self, name: String) -> Result<Model, DomainError> {
        let author = ActiveModel {
            name: Set(name),
            ..Default::default()
        };
        Ok(author.insert(&self.db).await?)
    }

    async fn update(&self, id: i32, name: String) -> Result<Model, DomainError> {
        let existing = AuthorEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.name = Set(name);
        Ok(active.update(&self.db).await?)
    }

    async fn delete_many(&self, ids: &[i32]) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        book_authors::Entity::delete_many()
            .filter(book_authors::Column::AuthorId.is_in(ids.to_vec()))
            .exec(&txn)
            .await?;
        let result = AuthorEntity::delete_many()
            .filter(Column::Id.is_in(ids.to_vec()))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        Ok(result.rows_affected)
    }
}
