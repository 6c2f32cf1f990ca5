use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row of the national postal code directory.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "address")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub local_government_code: i32,
    pub postal_code_old: String,
    pub postal_code: String,
    pub prefecture_kana: String,
    pub city_kana: String,
    pub section_kana: Option<String>,
    pub prefecture: String,
    pub city: String,
    pub section: Option<String>,
    // 0 = not applicable, 1 = applicable
    pub has_multiple_postal_codes: i16,
    pub has_banchi: i16,
    pub has_chome: i16,
    pub has_multiple_sections: i16,
    /// 0 unchanged, 1 changed, 2 abolished
    pub update_status: i16,
    /// 0 unchanged .. 6 abolished
    pub update_reason: i16,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const UPDATE_STATUS_LABELS: [&str; 3] = ["unchanged", "changed", "abolished"];

pub const UPDATE_REASON_LABELS: [&str; 7] = [
    "unchanged",
    "municipal reorganisation",
    "residence indication",
    "land readjustment",
    "postal district adjustment",
    "correction",
    "abolished",
];
