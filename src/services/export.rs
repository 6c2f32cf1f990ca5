//! CSV download of selected changelist rows.
//!
//! Header is the model's field names in declaration order; each selected
//! record becomes one row, missing values as empty cells.

use crate::domain::site::ModelAdmin;
use crate::domain::{BookRecord, DomainError};
use crate::models::{address, author, department, publisher};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// A record that can be written as one CSV row.
pub trait CsvRow {
    /// Field names in declaration order.
    fn field_names() -> &'static [&'static str];

    /// One value per field name; `None` is written as an empty cell.
    fn field_values(&self) -> Vec<Option<String>>;
}

#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub body: Vec<u8>,
}

impl CsvExport {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }
}

pub fn export_csv<T: CsvRow>(model: &ModelAdmin, rows: &[T]) -> Result<CsvExport, DomainError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(T::field_names())?;

    for row in rows {
        let values = row.field_values();
        debug_assert_eq!(values.len(), T::field_names().len());
        writer.write_record(values.iter().map(|v| v.as_deref().unwrap_or("")))?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| DomainError::Internal(e.to_string()))?;

    tracing::info!("Exported {} {} row(s) as CSV", rows.len(), model.label());

    Ok(CsvExport {
        filename: format!("{}.csv", model.label()),
        body,
    })
}

fn opt<T: ToString>(value: &Option<T>) -> Option<String> {
    value.as_ref().map(ToString::to_string)
}

fn flag(value: bool) -> Option<String> {
    Some(if value { "True" } else { "False" }.to_string())
}

impl CsvRow for BookRecord {
    fn field_names() -> &'static [&'static str] {
        &[
            "id",
            "title",
            "image",
            "publisher",
            "price",
            "size",
            "description",
            "publish_date",
            "created_by",
            "created_at",
        ]
    }

    fn field_values(&self) -> Vec<Option<String>> {
        let b = &self.book;
        vec![
            Some(b.id.to_string()),
            Some(b.title.clone()),
            b.image.clone(),
            self.publisher_name.clone(),
            opt(&b.price),
            b.size.clone(),
            b.description.clone(),
            opt(&b.publish_date),
            self.created_by_username.clone(),
            Some(b.created_at.clone()),
        ]
    }
}

impl CsvRow for author::Model {
    fn field_names() -> &'static [&'static str] {
        &["id", "name"]
    }

    fn field_values(&self) -> Vec<Option<String>> {
        vec![Some(self.id.to_string()), Some(self.name.clone())]
    }
}

impl CsvRow for department::Model {
    fn field_names() -> &'static [&'static str] {
        &["id", "name"]
    }

    fn field_values(&self) -> Vec<Option<String>> {
        vec![Some(self.id.to_string()), Some(self.name.clone())]
    }
}

impl CsvRow for publisher::Model {
    fn field_names() -> &'static [&'static str] {
        &[
            "id",
            "name",
            "postal_code",
            "prefecture",
            "address_1",
            "address_2",
            "phone_number",
        ]
    }

    fn field_values(&self) -> Vec<Option<String>> {
        vec![
            Some(self.id.to_string()),
            Some(self.name.clone()),
            self.postal_code.clone(),
            self.prefecture.clone(),
            self.address_1.clone(),
            self.address_2.clone(),
            self.phone_number.clone(),
        ]
    }
}

impl CsvRow for address::Model {
    fn field_names() -> &'static [&'static str] {
        &[
            "id",
            "local_government_code",
            "postal_code_old",
            "postal_code",
            "prefecture_kana",
            "city_kana",
            "section_kana",
            "prefecture",
            "city",
            "section",
            "has_multiple_postal_codes",
            "has_banchi",
            "has_chome",
            "has_multiple_sections",
            "update_status",
            "update_reason",
        ]
    }

    fn field_values(&self) -> Vec<Option<String>> {
        vec![
            Some(self.id.to_string()),
            Some(self.local_government_code.to_string()),
            Some(self.postal_code_old.clone()),
            Some(self.postal_code.clone()),
            Some(self.prefecture_kana.clone()),
            Some(self.city_kana.clone()),
            self.section_kana.clone(),
            Some(self.prefecture.clone()),
            Some(self.city.clone()),
            self.section.clone(),
            Some(self.has_multiple_postal_codes.to_string()),
            Some(self.has_banchi.to_string()),
            Some(self.has_chome.to_string()),
            Some(self.has_multiple_sections.to_string()),
            Some(self.update_status.to_string()),
            Some(self.update_reason.to_string()),
        ]
    }
}

/// Stock row with its book shown by title.
#[derive(Debug, Clone)]
pub struct StockRecord {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub quantity: i32,
}

impl CsvRow for StockRecord {
    fn field_names() -> &'static [&'static str] {
        &["id", "book", "quantity"]
    }

    fn field_values(&self) -> Vec<Option<String>> {
        vec![
            Some(self.id.to_string()),
            Some(self.book_title.clone()),
            Some(self.quantity.to_string()),
        ]
    }
}

/// Employee row with the department shown by name; the password hash is
/// never exported.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EmployeeRecord {
    #[serde(flatten)]
    pub employee: crate::models::employee::Model,
    pub department_name: Option<String>,
}

impl CsvRow for EmployeeRecord {
    fn field_names() -> &'static [&'static str] {
        &[
            "id",
            "username",
            "first_name",
            "last_name",
            "email",
            "is_staff",
            "is_superuser",
            "is_active",
            "date_joined",
            "department",
        ]
    }

    fn field_values(&self) -> Vec<Option<String>> {
        let e = &self.employee;
        vec![
            Some(e.id.to_string()),
            Some(e.username.clone()),
            Some(e.first_name.clone()),
            Some(e.last_name.clone()),
            Some(e.email.clone()),
            flag(e.is_staff),
            flag(e.is_superuser),
            flag(e.is_active),
            Some(e.date_joined.clone()),
            self.department_name.clone(),
        ]
    }
}
