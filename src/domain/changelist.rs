//! Changelist query parsing for the book admin.
//!
//! Turns the raw query string of `/admin/shop/<book variant>/` into a typed
//! [`BookQuery`]; unparsable values surface as `InvalidLookupParameters`.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::price_range::{PRICE_RANGE_PARAM, PriceRange};
use super::site::{self, ModelAdmin};
use super::validation::BookSize;
use super::DomainError;

pub const LIST_PER_PAGE: u64 = 10;
/// Page size of the changelists without their own setting.
pub const DEFAULT_PER_PAGE: u64 = 100;
pub const EMPTY_VALUE_DISPLAY: &str = "-";

pub const SEARCH_PARAM: &str = "q";
pub const ORDER_PARAM: &str = "o";
pub const PAGE_PARAM: &str = "p";
pub const SIZE_PARAM: &str = "size__exact";
pub const YEAR_PARAM: &str = "publish_date__year";
pub const MONTH_PARAM: &str = "publish_date__month";
pub const DAY_PARAM: &str = "publish_date__day";

/// Named views over the single `book` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookVariant {
    All,
    /// `publish_date <= today`
    Published,
    /// `publish_date > today` or no date
    Unpublished,
}

impl BookVariant {
    pub fn model_admin(&self) -> &'static ModelAdmin {
        match self {
            BookVariant::All => &site::BOOK,
            BookVariant::Published => &site::PUBLISHED_BOOK,
            BookVariant::Unpublished => &site::UNPUBLISHED_BOOK,
        }
    }

    pub fn from_model_name(name: &str) -> Option<Self> {
        [BookVariant::All, BookVariant::Published, BookVariant::Unpublished]
            .into_iter()
            .find(|v| v.model_admin().model_name == name)
    }

    /// In-memory form of the variant predicate.
    pub fn includes(&self, publish_date: Option<NaiveDate>, today: NaiveDate) -> bool {
        match self {
            BookVariant::All => true,
            BookVariant::Published => publish_date.is_some_and(|d| d <= today),
            BookVariant::Unpublished => publish_date.is_none_or(|d| d > today),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookOrderField {
    Id,
    Title,
    Price,
    Size,
    Publisher,
    PublishDate,
}

impl BookOrderField {
    const ALL: [BookOrderField; 6] = [
        BookOrderField::Id,
        BookOrderField::Title,
        BookOrderField::Price,
        BookOrderField::Size,
        BookOrderField::Publisher,
        BookOrderField::PublishDate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BookOrderField::Id => "id",
            BookOrderField::Title => "title",
            BookOrderField::Price => "price",
            BookOrderField::Size => "size",
            BookOrderField::Publisher => "publisher",
            BookOrderField::PublishDate => "publish_date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookOrdering {
    pub field: BookOrderField,
    pub descending: bool,
}

impl Default for BookOrdering {
    fn default() -> Self {
        Self {
            field: BookOrderField::Id,
            descending: false,
        }
    }
}

impl BookOrdering {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let field = BookOrderField::ALL
            .into_iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| {
                DomainError::InvalidLookupParameters(format!("cannot order by {:?}", raw))
            })?;
        Ok(Self { field, descending })
    }
}

/// Date hierarchy drill-down on `publish_date`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateDrilldown {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl DateDrilldown {
    /// Half-open `[start, end)` range selected by the drill-down, if any.
    pub fn bounds(&self) -> Result<Option<(NaiveDate, NaiveDate)>, DomainError> {
        let invalid = || DomainError::InvalidLookupParameters("invalid publish date drill-down".into());

        let Some(year) = self.year else {
            if self.month.is_some() || self.day.is_some() {
                return Err(invalid());
            }
            return Ok(None);
        };

        let bounds = match (self.month, self.day) {
            (None, None) => {
                let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
                let end = NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(invalid)?;
                (start, end)
            }
            (Some(month), None) => {
                let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
                let end = if month == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(year, month + 1, 1)
                }
                .ok_or_else(invalid)?;
                (start, end)
            }
            (Some(month), Some(day)) => {
                let start = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
                let end = start.succ_opt().ok_or_else(invalid)?;
                (start, end)
            }
            (None, Some(_)) => return Err(invalid()),
        };
        Ok(Some(bounds))
    }

    pub fn matches(&self, date: Option<NaiveDate>) -> bool {
        let Some(date) = date else {
            return self.year.is_none();
        };
        self.year.is_none_or(|y| date.year() == y)
            && self.month.is_none_or(|m| date.month() == m)
            && self.day.is_none_or(|d| date.day() == d)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookQuery {
    pub variant: BookVariant,
    /// Whitespace separated search terms; each must match some search field.
    pub search_terms: Vec<String>,
    pub size: Option<BookSize>,
    pub price_range: Option<PriceRange>,
    pub date: DateDrilldown,
    pub ordering: BookOrdering,
    /// 0-based
    pub page: u64,
    pub per_page: u64,
}

impl BookQuery {
    pub fn new(variant: BookVariant) -> Self {
        Self {
            variant,
            search_terms: Vec::new(),
            size: None,
            price_range: None,
            date: DateDrilldown::default(),
            ordering: BookOrdering::default(),
            page: 0,
            per_page: LIST_PER_PAGE,
        }
    }

    pub fn from_params(
        variant: BookVariant,
        params: &HashMap<String, String>,
    ) -> Result<Self, DomainError> {
        let mut query = Self::new(variant);

        if let Some(q) = params.get(SEARCH_PARAM) {
            query.search_terms = q.split_whitespace().map(str::to_string).collect();
        }

        if let Some(size) = params.get(SIZE_PARAM) {
            query.size = Some(BookSize::from_code(size).ok_or_else(|| {
                DomainError::InvalidLookupParameters(format!("unknown size {:?}", size))
            })?);
        }

        query.price_range = PriceRange::parse(params.get(PRICE_RANGE_PARAM).map(String::as_str))?;

        query.date = DateDrilldown {
            year: parse_number(params, YEAR_PARAM)?,
            month: parse_number(params, MONTH_PARAM)?,
            day: parse_number(params, DAY_PARAM)?,
        };
        // Validate the combination up front.
        query.date.bounds()?;

        if let Some(o) = params.get(ORDER_PARAM) {
            query.ordering = BookOrdering::parse(o)?;
        }

        query.page = page_number(params, query.per_page)?;

        Ok(query)
    }
}

/// 0-based page requested by `p`, defaulting to the first. The row offset
/// of the page must fit an SQL `OFFSET` and a `usize`.
pub fn page_number(params: &HashMap<String, String>, per_page: u64) -> Result<u64, DomainError> {
    let page: u64 = parse_number(params, PAGE_PARAM)?.unwrap_or(0);
    let offset = page
        .checked_mul(per_page.max(1))
        .filter(|o| i64::try_from(*o).is_ok() && usize::try_from(*o).is_ok());
    if offset.is_none() {
        return Err(DomainError::InvalidLookupParameters(format!(
            "{}={} is out of range",
            PAGE_PARAM, page
        )));
    }
    Ok(page)
}

fn parse_number<T: std::str::FromStr>(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, DomainError> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            DomainError::InvalidLookupParameters(format!("{}={:?} is not a number", key, raw))
        }),
    }
}

/// `%term%` for a `LIKE ... ESCAPE '\\'`; wildcards inside `term` match
/// literally.
pub fn like_contains(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `1000` -> `"1,000 円"`
pub fn format_price(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if price < 0 { "-" } else { "" };
    format!("{}{} 円", sign, grouped)
}
