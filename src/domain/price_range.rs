//! Half-open price range used by the book changelist filter.
//!
//! The query value has the form `"<min>,<max>"`; either side may be empty.
//! A present lower bound is inclusive, a present upper bound is exclusive.

use serde::Serialize;

use super::DomainError;

/// Query-string key the filter reads.
pub const PRICE_RANGE_PARAM: &str = "price_range";

/// Buckets offered in the filter sidebar: a gapless, non-overlapping partition.
pub const PRICE_RANGE_CHOICES: [(&str, &str); 3] = [
    (",1000", "< 1000"),
    ("1000,2000", "[1000, 2000)"),
    ("2000,", "[2000, ∞)"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriceRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceRangeChoice {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl PriceRange {
    /// Parse the optional query value. `Ok(None)` means "do not filter".
    pub fn parse(value: Option<&str>) -> Result<Option<Self>, DomainError> {
        let Some(value) = value else {
            return Ok(None);
        };

        let (min_str, max_str) = value.split_once(',').ok_or_else(|| {
            DomainError::InvalidLookupParameters(format!(
                "{}={:?} must contain exactly one comma",
                PRICE_RANGE_PARAM, value
            ))
        })?;

        if max_str.contains(',') {
            return Err(DomainError::InvalidLookupParameters(format!(
                "{}={:?} must contain exactly one comma",
                PRICE_RANGE_PARAM, value
            )));
        }

        Ok(Some(Self {
            min: parse_bound(min_str)?,
            max: parse_bound(max_str)?,
        }))
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Same predicate the SQL filter applies; a missing price never matches
    /// a bounded range.
    pub fn contains(&self, price: Option<i64>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(price) = price else {
            return false;
        };
        self.min.is_none_or(|min| price >= min) && self.max.is_none_or(|max| price < max)
    }

    /// Filter sidebar entries with the current selection marked.
    pub fn choices(selected: Option<&str>) -> Vec<PriceRangeChoice> {
        PRICE_RANGE_CHOICES
            .iter()
            .map(|(value, label)| PriceRangeChoice {
                value,
                label,
                selected: selected == Some(*value),
            })
            .collect()
    }
}

fn parse_bound(raw: &str) -> Result<Option<i64>, DomainError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>().map(Some).map_err(|_| {
        DomainError::InvalidLookupParameters(format!("{:?} is not a valid price bound", raw))
    })
}
