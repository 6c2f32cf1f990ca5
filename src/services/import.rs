//! Bulk import of the national postal code directory.
//!
//! The file is the processed `x-ken-all.csv`: no header, 15 columns,
//! Shift_JIS. Everything is parsed before the first insert so a bad row
//! leaves the table untouched; rows then go in as chunked multi-row inserts
//! inside one transaction.

use std::path::Path;
use std::time::{Duration, Instant};

use encoding_rs::Encoding;
use sea_orm::{DatabaseConnection, EntityTrait, Set, TransactionTrait};

use crate::domain::DomainError;
use crate::models::address;

pub const ADDRESS_COLUMNS: [&str; 15] = [
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
];

const INSERT_CHUNK: usize = 500;

/// One parsed directory row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub local_government_code: i32,
    pub postal_code_old: String,
    pub postal_code: String,
    pub prefecture_kana: String,
    pub city_kana: String,
    pub section_kana: Option<String>,
    pub prefecture: String,
    pub city: String,
    pub section: Option<String>,
    pub has_multiple_postal_codes: i16,
    pub has_banchi: i16,
    pub has_chome: i16,
    pub has_multiple_sections: i16,
    pub update_status: i16,
    pub update_reason: i16,
}

impl From<AddressRecord> for address::ActiveModel {
    fn from(r: AddressRecord) -> Self {
        address::ActiveModel {
            local_government_code: Set(r.local_government_code),
            postal_code_old: Set(r.postal_code_old),
            postal_code: Set(r.postal_code),
            prefecture_kana: Set(r.prefecture_kana),
            city_kana: Set(r.city_kana),
            section_kana: Set(r.section_kana),
            prefecture: Set(r.prefecture),
            city: Set(r.city),
            section: Set(r.section),
            has_multiple_postal_codes: Set(r.has_multiple_postal_codes),
            has_banchi: Set(r.has_banchi),
            has_chome: Set(r.has_chome),
            has_multiple_sections: Set(r.has_multiple_sections),
            update_status: Set(r.update_status),
            update_reason: Set(r.update_reason),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImportSummary {
    pub inserted: usize,
    pub elapsed: Duration,
}

/// Decode raw file bytes with a WHATWG encoding label such as `shift_jis`.
pub fn decode(bytes: &[u8], label: &str) -> Result<String, DomainError> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| DomainError::Import(format!("unknown encoding {:?}", label)))?;
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DomainError::Import(format!(
            "input is not valid {}",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

fn number<T: std::str::FromStr>(line: u64, column: usize, raw: &str) -> Result<T, DomainError> {
    raw.trim().parse::<T>().map_err(|_| {
        DomainError::Import(format!(
            "line {}: {} must be a number, got {:?}",
            line, ADDRESS_COLUMNS[column], raw
        ))
    })
}

fn optional(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Parse decoded CSV text. The first malformed row fails the whole parse.
pub fn parse_addresses(text: &str) -> Result<Vec<AddressRecord>, DomainError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row = result?;
        let line = row
            .position()
            .map(|p| p.line())
            .unwrap_or(index as u64 + 1);

        if row.len() != ADDRESS_COLUMNS.len() {
            return Err(DomainError::Import(format!(
                "line {}: expected {} columns, found {}",
                line,
                ADDRESS_COLUMNS.len(),
                row.len()
            )));
        }

        let col = |i: usize| row.get(i).unwrap_or("");
        records.push(AddressRecord {
            local_government_code: number(line, 0, col(0))?,
            postal_code_old: col(1).to_string(),
            postal_code: col(2).to_string(),
            prefecture_kana: col(3).to_string(),
            city_kana: col(4).to_string(),
            section_kana: optional(col(5)),
            prefecture: col(6).to_string(),
            city: col(7).to_string(),
            section: optional(col(8)),
            has_multiple_postal_codes: number(line, 9, col(9))?,
            has_banchi: number(line, 10, col(10))?,
            has_chome: number(line, 11, col(11))?,
            has_multiple_sections: number(line, 12, col(12))?,
            update_status: number(line, 13, col(13))?,
            update_reason: number(line, 14, col(14))?,
        });
    }
    Ok(records)
}

/// Parse and insert raw file contents.
pub async fn import_bytes(
    db: &DatabaseConnection,
    bytes: &[u8],
    encoding: &str,
) -> Result<ImportSummary, DomainError> {
    let started = Instant::now();
    let records = parse_addresses(&decode(bytes, encoding)?)?;
    let inserted = records.len();

    let txn = db.begin().await?;
    let mut rows = records.into_iter().map(address::ActiveModel::from).peekable();
    while rows.peek().is_some() {
        let chunk: Vec<address::ActiveModel> = rows.by_ref().take(INSERT_CHUNK).collect();
        address::Entity::insert_many(chunk)
            .exec_without_returning(&txn)
            .await?;
    }
    txn.commit().await?;

    let summary = ImportSummary {
        inserted,
        elapsed: started.elapsed(),
    };
    tracing::info!(
        "{} address records created in {:.2} secs.",
        summary.inserted,
        summary.elapsed.as_secs_f64()
    );
    Ok(summary)
}

/// Import the directory file at `path`.
pub async fn import_addresses(
    db: &DatabaseConnection,
    path: impl AsRef<Path>,
    encoding: &str,
) -> Result<ImportSummary, DomainError> {
    let path = path.as_ref();
    tracing::info!("Importing addresses from {} ({})", path.display(), encoding);
    let bytes = tokio::fs::read(path).await?;
    import_bytes(db, &bytes, encoding).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = "01101,060  ,0600000,ﾎｯｶｲﾄﾞｳ,ｻｯﾎﾟﾛｼﾁｭｳｵｳｸ,,北海道,札幌市中央区,,0,0,0,0,0,0";

    #[test]
    fn parses_a_directory_row() {
        let records = parse_addresses(ROW).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.local_government_code, 1101);
        assert_eq!(r.postal_code_old, "060  ");
        // Leading zeros survive because every column is read as text.
        assert_eq!(r.postal_code, "0600000");
        assert_eq!(r.prefecture, "北海道");
        assert_eq!(r.section, None);
        assert_eq!(r.section_kana, None);
    }

    #[test]
    fn wrong_column_count_names_the_line() {
        let text = format!("{}\n01101,060", ROW);
        let err = parse_addresses(&text).unwrap_err().to_string();
        assert!(err.contains("line 2"), "{}", err);
        assert!(err.contains("expected 15 columns"), "{}", err);
    }

    #[test]
    fn non_numeric_flag_is_rejected() {
        let text = ROW.replacen(",0,0,0,0,0,0", ",x,0,0,0,0,0", 1);
        assert!(matches!(parse_addresses(&text), Err(DomainError::Import(_))));
    }

    #[test]
    fn shift_jis_matches_utf8() {
        let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode(ROW);
        let decoded = decode(&encoded, "shift_jis").unwrap();
        assert_eq!(
            parse_addresses(&decoded).unwrap(),
            parse_addresses(&decode(ROW.as_bytes(), "utf-8").unwrap()).unwrap()
        );
    }

    #[test]
    fn unknown_encoding_label() {
        assert!(decode(b"", "klingon").is_err());
    }
}
