//! SeaORM implementation of BookRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::domain::changelist::{BookOrderField, BookQuery, BookVariant, like_contains};
use crate::domain::{
    BookInput, BookPage, BookRecord, BookRepository, DomainError, dedup_ids, order_by_ids,
};
use crate::models::Book;
use crate::models::book::{ActiveModel, Column, Entity as BookEntity};
use crate::models::{author, book_authors, book_stock, employee, publisher};

/// SeaORM-based implementation of BookRepository
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn to_dto(&self, model: crate::models::book::Model) -> Result<Book, DomainError> {
        let authors = model.find_related(author::Entity).all(&self.db).await?;
        let publisher = model.find_related(publisher::Entity).one(&self.db).await?;
        let creator = model.find_related(employee::Entity).one(&self.db).await?;

        let mut dto = Book::from(model);
        dto.authors = authors.into_iter().map(|a| a.id).collect();
        dto.authors.sort_unstable();
        dto.publisher_name = publisher.map(|p| p.name);
        dto.created_by = creator.map(|e| e.username);
        Ok(dto)
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Predicate of a book variant against `today`; `None` for the full table.
pub fn variant_condition(variant: BookVariant, today: NaiveDate) -> Option<Condition> {
    match variant {
        BookVariant::All => None,
        BookVariant::Published => Some(Condition::all().add(Column::PublishDate.lte(today))),
        BookVariant::Unpublished => Some(
            Condition::any()
                .add(Column::PublishDate.gt(today))
                .add(Column::PublishDate.is_null()),
        ),
    }
}

fn filter_condition(query: &BookQuery, today: NaiveDate) -> Result<Condition, DomainError> {
    let mut cond = Condition::all();
    if let Some(variant) = variant_condition(query.variant, today) {
        cond = cond.add(variant);
    }

    for term in &query.search_terms {
        let pattern = like_contains(term);
        cond = cond.add(
            Condition::any()
                .add(super::contains_literal(Column::Title, term))
                .add(Expr::cust_with_values(
                    r#"CAST("book"."price" AS TEXT) LIKE ? ESCAPE '\'"#,
                    [pattern.clone()],
                ))
                .add(Expr::cust_with_values(
                    r#""book"."publish_date" LIKE ? ESCAPE '\'"#,
                    [pattern],
                )),
        );
    }

    if let Some(size) = query.size {
        cond = cond.add(Column::Size.eq(size.code()));
    }

    if let Some(range) = query.price_range {
        if let Some(min) = range.min {
            cond = cond.add(Column::Price.gte(min));
        }
        if let Some(max) = range.max {
            cond = cond.add(Column::Price.lt(max));
        }
    }

    if let Some((start, end)) = query.date.bounds()? {
        cond = cond
            .add(Column::PublishDate.gte(start))
            .add(Column::PublishDate.lt(end));
    }

    Ok(cond)
}

fn sort_order(descending: bool) -> Order {
    if descending { Order::Desc } else { Order::Asc }
}

fn to_price(price: Option<i64>) -> Result<Option<i32>, DomainError> {
    price
        .map(|p| i32::try_from(p).map_err(|_| DomainError::field("price", "Price out of range.")))
        .transpose()
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn changelist(&self, query: &BookQuery) -> Result<BookPage, DomainError> {
        let today = today();

        let mut full = BookEntity::find();
        if let Some(variant) = variant_condition(query.variant, today) {
            full = full.filter(variant);
        }
        let full_result_count = full.count(&self.db).await?;

        let mut select = BookEntity::find()
            .find_also_related(publisher::Entity)
            .filter(filter_condition(query, today)?);

        let order = sort_order(query.ordering.descending);
        select = match query.ordering.field {
            BookOrderField::Id => select.order_by(Column::Id, order),
            BookOrderField::Title => select.order_by(Column::Title, order),
            BookOrderField::Price => select.order_by(Column::Price, order),
            BookOrderField::Size => select.order_by(Column::Size, order),
            BookOrderField::Publisher => select.order_by(publisher::Column::Name, order),
            BookOrderField::PublishDate => select.order_by(Column::PublishDate, order),
        };
        if query.ordering.field != BookOrderField::Id {
            select = select.order_by_asc(Column::Id);
        }

        let paginator = select.paginate(&self.db, query.per_page.max(1));
        let result_count = paginator.num_items().await?;
        let rows = paginator.fetch_page(query.page).await?;

        tracing::debug!(
            "Changelist {:?}: {} of {} rows, page {}",
            query.variant,
            result_count,
            full_result_count,
            query.page
        );

        Ok(BookPage {
            rows,
            result_count,
            full_result_count,
        })
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError> {
        match BookEntity::find_by_id(id).one(&self.db).await? {
            Some(model) => Ok(Some(self.to_dto(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_many(&self, ids: &[i32]) -> Result<Vec<BookRecord>, DomainError> {
        let ids = dedup_ids(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = BookEntity::find()
            .filter(Column::Id.is_in(ids.clone()))
            .find_also_related(publisher::Entity)
            .all(&self.db)
            .await?;

        let creator_ids: Vec<i32> = rows.iter().filter_map(|(b, _)| b.created_by_id).collect();
        let creators: HashMap<i32, String> = if creator_ids.is_empty() {
            HashMap::new()
        } else {
            employee::Entity::find()
                .filter(employee::Column::Id.is_in(creator_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|e| (e.id, e.username))
                .collect()
        };

        let records = rows
            .into_iter()
            .map(|(book, publisher)| BookRecord {
                created_by_username: book.created_by_id.and_then(|id| creators.get(&id).cloned()),
                publisher_name: publisher.map(|p| p.name),
                book,
            })
            .collect();

        Ok(order_by_ids(&ids, records, |r| r.book.id))
    }

    async fn created_on(
        &self,
        day: NaiveDate,
    ) -> Result<Vec<crate::models::book::Model>, DomainError> {
        let prefix = day.format("%Y-%m-%d").to_string();
        Ok(BookEntity::find()
            .filter(Column::CreatedAt.starts_with(prefix.as_str()))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn create(&self, input: BookInput, created_by: Option<i32>) -> Result<Book, DomainError> {
        let price = to_price(input.price)?;
        let txn = self.db.begin().await?;

        let new_book = ActiveModel {
            title: Set(input.title),
            image: Set(input.image),
            publisher_id: Set(input.publisher),
            price: Set(price),
            size: Set(input.size),
            description: Set(input.description),
            publish_date: Set(input.publish_date),
            created_by_id: Set(created_by),
            created_at: Set(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        };
        let model = new_book.insert(&txn).await?;

        link_authors(&txn, model.id, &input.authors).await?;
        txn.commit().await?;

        tracing::info!("Book {} created: {}", model.id, model.title);
        self.to_dto(model).await
    }

    async fn update(&self, id: i32, input: BookInput) -> Result<Book, DomainError> {
        let price = to_price(input.price)?;
        let existing = BookEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let txn = self.db.begin().await?;

        let mut active: ActiveModel = existing.into();
        active.title = Set(input.title);
        active.image = Set(input.image);
        active.publisher_id = Set(input.publisher);
        active.price = Set(price);
        active.size = Set(input.size);
        active.description = Set(input.description);
        active.publish_date = Set(input.publish_date);
        let model = active.update(&txn).await?;

        book_authors::Entity::delete_many()
            .filter(book_authors::Column::BookId.eq(id))
            .exec(&txn)
            .await?;
        link_authors(&txn, id, &input.authors).await?;
        txn.commit().await?;

        self.to_dto(model).await
    }

    async fn publish_on(&self, ids: &[i32], date: NaiveDate) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }

        // Single statement: every selected row gets the date or none does.
        let result = BookEntity::update_many()
            .col_expr(Column::PublishDate, Expr::value(date))
            .filter(Column::Id.is_in(ids.to_vec()))
            .exec(&self.db)
            .await?;

        tracing::info!("Published {} books on {}", result.rows_affected, date);
        Ok(result.rows_affected)
    }

    async fn delete_many(&self, ids: &[i32]) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        book_authors::Entity::delete_many()
            .filter(book_authors::Column::BookId.is_in(ids.to_vec()))
            .exec(&txn)
            .await?;
        book_stock::Entity::delete_many()
            .filter(book_stock::Column::BookId.is_in(ids.to_vec()))
            .exec(&txn)
            .await?;
        let result = BookEntity::delete_many()
            .filter(Column::Id.is_in(ids.to_vec()))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        Ok(result.rows_affected)
    }
}

async fn link_authors<C>(conn: &C, book_id: i32, author_ids: &[i32]) -> Result<(), DomainError>
where
    C: sea_orm::ConnectionTrait,
{
    let links: Vec<book_authors::ActiveModel> = dedup_ids(author_ids)
        .into_iter()
        .map(|author_id| book_authors::ActiveModel {
            book_id: Set(book_id),
            author_id: Set(author_id),
        })
        .collect();

    if !links.is_empty() {
        book_authors::Entity::insert_many(links)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}
