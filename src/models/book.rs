use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "book")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub image: Option<String>,
    pub publisher_id: Option<i32>,
    pub price: Option<i32>,
    /// `a4` or `b5`
    pub size: Option<String>,
    pub description: Option<String>,
    pub publish_date: Option<Date>,
    pub created_by_id: Option<i32>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::publisher::Entity",
        from = "Column::PublisherId",
        to = "super::publisher::Column::Id"
    )]
    Publisher,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::CreatedById",
        to = "super::employee::Column::Id",
        on_delete = "SetNull"
    )]
    CreatedBy,
    #[sea_orm(has_one = "super::book_stock::Entity")]
    Stock,
}

impl Related<super::publisher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Publisher.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreatedBy.def()
    }
}

impl Related<super::book_stock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stock.def()
    }
}

impl Related<super::author::Entity> for Entity {
    fn to() -> RelationDef {
        super::book_authors::Relation::Author.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::book_authors::Relation::Book.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

// DTO for the change view
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub image: Option<String>,
    pub publisher: Option<i32>,
    pub publisher_name: Option<String>,
    pub authors: Vec<i32>,
    pub price: Option<i32>,
    pub size: Option<String>,
    pub description: Option<String>,
    pub publish_date: Option<Date>,
    pub created_by: Option<String>,
    pub created_at: String,
}

impl From<Model> for Book {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            image: model.image,
            publisher: model.publisher_id,
            publisher_name: None,
            authors: Vec::new(),
            price: model.price,
            size: model.size,
            description: model.description,
            publish_date: model.publish_date,
            created_by: None,
            created_at: model.created_at,
        }
    }
}
