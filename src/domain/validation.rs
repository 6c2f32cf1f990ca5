//! Field validators and enumerated choices shared by the admin forms.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{FieldErrors, NON_FIELD_ERRORS};

static POSTAL_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{3}-\d{4}$").expect("valid postal code regex"));
static PHONE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0\d{1,4}-\d{1,4}-\d{4}$").expect("valid phone number regex"));

pub const MAX_CHAR_LENGTH: usize = 255;
pub const BANNED_TITLE_WORD: &str = "Java";
pub const THIN_BOOK_WORD: &str = "薄い本";
pub const THIN_BOOK_MAX_PRICE: i64 = 3000;

pub const PREFECTURES: [&str; 47] = [
    "北海道", "青森県", "岩手県", "宮城県", "秋田県", "山形県", "福島県", "茨城県", "栃木県",
    "群馬県", "埼玉県", "千葉県", "東京都", "神奈川県", "新潟県", "富山県", "石川県", "福井県",
    "山梨県", "長野県", "岐阜県", "静岡県", "愛知県", "三重県", "滋賀県", "京都府", "大阪府",
    "兵庫県", "奈良県", "和歌山県", "鳥取県", "島根県", "岡山県", "広島県", "山口県", "徳島県",
    "香川県", "愛媛県", "高知県", "福岡県", "佐賀県", "長崎県", "熊本県", "大分県", "宮崎県",
    "鹿児島県", "沖縄県",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSize {
    A4,
    B5,
}

impl BookSize {
    pub const ALL: [BookSize; 2] = [BookSize::A4, BookSize::B5];

    pub fn code(&self) -> &'static str {
        match self {
            BookSize::A4 => "a4",
            BookSize::B5 => "b5",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookSize::A4 => "A4 - 210 x 297 mm",
            BookSize::B5 => "B5 - 182 x 257 mm",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

pub fn is_valid_postal_code(value: &str) -> bool {
    POSTAL_CODE_RE.is_match(value)
}

pub fn is_valid_phone_number(value: &str) -> bool {
    PHONE_NUMBER_RE.is_match(value)
}

pub fn is_valid_prefecture(value: &str) -> bool {
    PREFECTURES.contains(&value)
}

/// Required, bounded single-line text.
pub fn check_required_text(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "This field is required.");
    } else if value.chars().count() > MAX_CHAR_LENGTH {
        errors.add(
            field,
            format!("Ensure this value has at most {} characters.", MAX_CHAR_LENGTH),
        );
    }
}

pub fn check_optional_text(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value
        && value.chars().count() > MAX_CHAR_LENGTH
    {
        errors.add(
            field,
            format!("Ensure this value has at most {} characters.", MAX_CHAR_LENGTH),
        );
    }
}

/// Title and price rules of the book form.
pub fn check_book_rules(errors: &mut FieldErrors, title: &str, price: Option<i64>) {
    if title.contains(BANNED_TITLE_WORD) {
        errors.add("title", "Titles must not contain \"Java\".");
    }
    if let Some(price) = price {
        if price < 0 {
            errors.add("price", "Ensure this value is greater than or equal to 0.");
        } else if price > i32::MAX as i64 {
            errors.add("price", "Ensure this value is less than or equal to 2147483647.");
        }
        if title.contains(THIN_BOOK_WORD) && price > THIN_BOOK_MAX_PRICE {
            errors.add(NON_FIELD_ERRORS, "A thin book must not cost more than 3,000 yen.");
        }
    }
}
