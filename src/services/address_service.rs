//! Address Service - postal code lookup and the directory changelist.

use std::collections::HashMap;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use serde::Serialize;

use super::{
    ActionDef, ActionOutcome, ActionRequest, CSV_ACTION, ActionChoice, DELETE_ACTION,
    available_actions, export_csv, num_pages, resolve_action,
};
use crate::domain::changelist::{DEFAULT_PER_PAGE, SEARCH_PARAM, like_contains, page_number};
use crate::domain::site::{self, ModelPerms};
use crate::domain::{DomainError, order_by_ids};
use crate::infrastructure::contains_literal;
use crate::models::address::{self, Column, Entity as AddressEntity};

pub const ADDRESS_ACTIONS: [ActionDef; 2] = [CSV_ACTION, DELETE_ACTION];

/// Query parameter of the lookup endpoint.
pub const POSTAL_CODE_PARAM: &str = "postalCode";

/// Lookup result, the fields the address form fills in.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AddressHit {
    pub prefecture: String,
    pub city: String,
    pub section: Option<String>,
}

/// Addresses whose postal code equals `postal_code` exactly.
pub async fn lookup(
    db: &DatabaseConnection,
    postal_code: Option<&str>,
) -> Result<Vec<AddressHit>, DomainError> {
    let Some(code) = postal_code else {
        return Ok(Vec::new());
    };

    let hits = AddressEntity::find()
        .filter(Column::PostalCode.eq(code))
        .order_by_asc(Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|a| AddressHit {
            prefecture: a.prefecture,
            city: a.city,
            section: a.section,
        })
        .collect::<Vec<_>>();

    tracing::debug!("Address lookup {}: {} hit(s)", code, hits.len());
    Ok(hits)
}

/// Flag columns offered as list filters, by query key.
const FLAG_FILTERS: [(&str, Column); 6] = [
    ("has_multiple_postal_codes__exact", Column::HasMultiplePostalCodes),
    ("has_banchi__exact", Column::HasBanchi),
    ("has_chome__exact", Column::HasChome),
    ("has_multiple_sections__exact", Column::HasMultipleSections),
    ("update_status__exact", Column::UpdateStatus),
    ("update_reason__exact", Column::UpdateReason),
];

fn filter_condition(params: &HashMap<String, String>) -> Result<Condition, DomainError> {
    let mut cond = Condition::all();

    if let Some(q) = params.get(SEARCH_PARAM) {
        for term in q.split_whitespace() {
            cond = cond.add(
                Condition::any()
                    .add(Expr::cust_with_values(
                        r#"CAST("address"."local_government_code" AS TEXT) LIKE ? ESCAPE '\'"#,
                        [like_contains(term)],
                    ))
                    .add(contains_literal(Column::PostalCode, term))
                    .add(contains_literal(Column::Prefecture, term))
                    .add(contains_literal(Column::City, term))
                    .add(contains_literal(Column::Section, term)),
            );
        }
    }

    for (key, column) in FLAG_FILTERS {
        if let Some(raw) = params.get(key) {
            let value: i16 = raw.trim().parse().map_err(|_| {
                DomainError::InvalidLookupParameters(format!("{}={:?} is not a number", key, raw))
            })?;
            cond = cond.add(column.eq(value));
        }
    }

    Ok(cond)
}

#[derive(Debug, Clone, Serialize)]
pub struct AddressChangelist {
    pub model: &'static str,
    pub verbose_name: &'static str,
    pub columns: &'static [&'static str],
    pub rows: Vec<address::Model>,
    pub result_count: u64,
    pub full_result_count: u64,
    pub page: u64,
    pub num_pages: u64,
    pub filters: Vec<&'static str>,
    pub actions: Vec<ActionChoice>,
}

pub const ADDRESS_LIST_DISPLAY: [&str; 5] = [
    "postal_code",
    "prefecture",
    "city",
    "section",
    "local_government_code",
];

pub async fn changelist(
    db: &DatabaseConnection,
    params: &HashMap<String, String>,
    perms: &ModelPerms,
) -> Result<AddressChangelist, DomainError> {
    let page = page_number(params, DEFAULT_PER_PAGE)?;
    let full_result_count = AddressEntity::find().count(db).await?;

    let paginator = AddressEntity::find()
        .filter(filter_condition(params)?)
        .order_by_asc(Column::PostalCode)
        .order_by_asc(Column::Id)
        .paginate(db, DEFAULT_PER_PAGE);
    let result_count = paginator.num_items().await?;
    let rows = paginator.fetch_page(page).await?;

    Ok(AddressChangelist {
        model: site::ADDRESS.object_name,
        verbose_name: site::ADDRESS.verbose_name,
        columns: &ADDRESS_LIST_DISPLAY,
        rows,
        result_count,
        full_result_count,
        page,
        num_pages: num_pages(result_count, DEFAULT_PER_PAGE),
        filters: FLAG_FILTERS.iter().map(|(key, _)| *key).collect(),
        actions: available_actions(&ADDRESS_ACTIONS, perms),
    })
}

pub async fn get_address(db: &DatabaseConnection, id: i32) -> Result<address::Model, DomainError> {
    AddressEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)
}

pub async fn delete_address(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    let result = AddressEntity::delete_by_id(id).exec(db).await?;
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
    let def = resolve_action(&ADDRESS_ACTIONS, &request.action)?;
    if !def.requires.granted(perms) {
        return Err(DomainError::PermissionDenied);
    }

    let found = AddressEntity::find()
        .filter(Column::Id.is_in(request.ids.clone()))
        .all(db)
        .await?;
    let selected = order_by_ids(&request.ids, found, |a| a.id);

    if def.name == super::DOWNLOAD_AS_CSV {
        return Ok(ActionOutcome::Csv(export_csv(&site::ADDRESS, &selected)?));
    }

    let ids: Vec<i32> = selected.iter().map(|a| a.id).collect();
    let result = AddressEntity::delete_many()
        .filter(Column::Id.is_in(ids))
        .exec(db)
        .await?;
    Ok(ActionOutcome::Deleted {
        count: result.rows_affected,
    })
}
