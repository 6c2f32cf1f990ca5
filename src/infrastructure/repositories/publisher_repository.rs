//! SeaORM implementation of PublisherRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::domain::{DomainError, PublisherInput, PublisherRepository, order_by_ids};
use crate::models::book;
use crate::models::publisher::{ActiveModel, Column, Entity as PublisherEntity, Model};

/// SeaORM-based implementation of PublisherRepository
pub struct SeaOrmPublisherRepository {
    db: DatabaseConnection,
}

impl SeaOrmPublisherRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PublisherRepository for SeaOrmPublisherRepository {
    async fn find_all(&self, search: Option<&str>) -> Result<Vec<Model>, DomainError> {
        let mut query = PublisherEntity::find();
        if let Some(q) = search
            && !q.trim().is_empty()
        {
            let q = q.trim();
            query = query.filter(
                Condition::any()
                    .add(super::contains_literal(Column::Name, q))
                    .add(super::contains_literal(Column::PostalCode, q))
                    .add(super::contains_literal(Column::PhoneNumber, q)),
            );
        }
        Ok(query.order_by_asc(Column::Id).all(&self.db).await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Model>, DomainError> {
        Ok(PublisherEntity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_many(&self, ids: &[i32]) -> Result<Vec<Model>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let publishers = PublisherEntity::find()
            .filter(Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(order_by_ids(ids, publishers, |p| p.id))
    }

    async fn create(&self, input: PublisherInput) -> Result<Model, DomainError> {
        let publisher = ActiveModel {
            name: Set(input.name),
            postal_code: Set(input.postal_code),
            prefecture: Set(input.prefecture),
            address_1: Set(input.address_1),
            address_2: Set(input.address_2),
            phone_number: Set(input.phone_number),
            ..Default::default()
        };
        Ok(publisher.insert(&self.db).await?)
    }

    async fn update(&self, id: i32, input: PublisherInput) -> Result<Model, DomainError> {
        let existing = PublisherEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.name = Set(input.name);
        active.postal_code = Set(input.postal_code);
        active.prefecture = Set(input.prefecture);
        active.address_1 = Set(input.address_1);
        active.address_2 = Set(input.address_2);
        active.phone_number = Set(input.phone_number);
        Ok(active.update(&self.db).await?)
    }

    async fn delete_many(&self, ids: &[i32]) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }

        // Books reference publishers with PROTECT semantics.
        let referencing = book::Entity::find()
            .filter(book::Column::PublisherId.is_in(ids.to_vec()))
            .count(&self.db)
            .await?;
        if referencing > 0 {
            return Err(DomainError::Protected(format!(
                "{} book(s) still reference the selected publisher(s)",
                referencing
            )));
        }

        let result = PublisherEntity::delete_many()
            .filter(Column::Id.is_in(ids.to_vec()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
