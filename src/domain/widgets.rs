//! Multi-segment inputs for values stored as one delimited string.
//!
//! A postal code `"123-4567"` is edited as two boxes and a phone number
//! `"03-1234-5678"` as three. `decompress` feeds the boxes, `compose` turns
//! submitted boxes back into the stored value.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SubField {
    /// Visible width of the box.
    pub size: usize,
    pub max_length: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CompositeWidget {
    pub separator: char,
    pub sub_fields: &'static [SubField],
}

pub const POSTAL_CODE_WIDGET: CompositeWidget = CompositeWidget {
    separator: '-',
    sub_fields: &[
        SubField { size: 4, max_length: 3 },
        SubField { size: 5, max_length: 4 },
    ],
};

pub const PHONE_NUMBER_WIDGET: CompositeWidget = CompositeWidget {
    separator: '-',
    sub_fields: &[
        SubField { size: 6, max_length: 5 },
        SubField { size: 6, max_length: 4 },
        SubField { size: 5, max_length: 4 },
    ],
};

impl CompositeWidget {
    pub fn arity(&self) -> usize {
        self.sub_fields.len()
    }

    /// Split a stored value into one entry per sub-field.
    ///
    /// Absent or malformed input yields all `None` so the form shows empty
    /// boxes instead of failing.
    pub fn decompress(&self, value: Option<&str>) -> Vec<Option<String>> {
        let empty = vec![None; self.arity()];
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            return empty;
        };

        let parts: Vec<&str> = value.split(self.separator).collect();
        if parts.len() != self.arity() {
            return empty;
        }
        parts.into_iter().map(|p| Some(p.to_string())).collect()
    }

    /// Join submitted sub-field values. Any empty or missing part makes the
    /// whole value absent, as does a part holding the separator, since
    /// `decompress` could not split it back. Parts are joined verbatim.
    pub fn compose<S: AsRef<str>>(&self, parts: &[Option<S>]) -> Option<String> {
        if parts.len() != self.arity() {
            return None;
        }

        let mut joined = Vec::with_capacity(parts.len());
        for part in parts {
            let part: &str = part.as_ref()?.as_ref();
            if part.is_empty() || part.contains(self.separator) {
                return None;
            }
            joined.push(part);
        }
        Some(joined.join(&self.separator.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompress_postal_code() {
        assert_eq!(
            POSTAL_CODE_WIDGET.decompress(Some("123-4567")),
            vec![Some("123".to_string()), Some("4567".to_string())]
        );
    }

    #[test]
    fn decompress_absent_or_malformed_gives_empty_boxes() {
        assert_eq!(POSTAL_CODE_WIDGET.decompress(None), vec![None, None]);
        assert_eq!(POSTAL_CODE_WIDGET.decompress(Some("")), vec![None, None]);
        assert_eq!(POSTAL_CODE_WIDGET.decompress(Some("1234567")), vec![None, None]);
        assert_eq!(
            PHONE_NUMBER_WIDGET.decompress(Some("03-1234")),
            vec![None, None, None]
        );
    }

    #[test]
    fn compose_requires_every_part() {
        assert_eq!(
            POSTAL_CODE_WIDGET.compose(&[Some("123"), Some("4567")]),
            Some("123-4567".to_string())
        );
        assert_eq!(POSTAL_CODE_WIDGET.compose(&[Some("123"), None]), None);
        assert_eq!(POSTAL_CODE_WIDGET.compose(&[Some("123"), Some("")]), None);
        assert_eq!(POSTAL_CODE_WIDGET.compose(&[Some("123")]), None);
    }

    #[test]
    fn phone_number_round_trip() {
        let stored = PHONE_NUMBER_WIDGET
            .compose(&[Some("03"), Some("1234"), Some("5678")])
            .unwrap();
        assert_eq!(stored, "03-1234-5678");
        assert_eq!(
            PHONE_NUMBER_WIDGET.decompress(Some(&stored)),
            vec![
                Some("03".to_string()),
                Some("1234".to_string()),
                Some("5678".to_string())
            ]
        );
    }

    #[test]
    fn compose_rejects_parts_holding_the_separator() {
        assert_eq!(
            PHONE_NUMBER_WIDGET.compose(&[Some("03-1"), Some("1234"), Some("5678")]),
            None
        );
        assert_eq!(POSTAL_CODE_WIDGET.compose(&[Some("1-3"), Some("4567")]), None);
    }

    #[test]
    fn decompress_inverts_compose() {
        let cases: [&[&str]; 4] = [
            &["03", "1234", "5678"],
            &[" 12", "3456 ", "7"],
            &["０３", "ab", "x y"],
            &["123", "4567"],
        ];
        for parts in cases {
            let widget = if parts.len() == 2 {
                POSTAL_CODE_WIDGET
            } else {
                PHONE_NUMBER_WIDGET
            };
            let boxes: Vec<Option<&str>> = parts.iter().map(|p| Some(*p)).collect();
            let stored = widget.compose(&boxes).unwrap();
            let expected: Vec<Option<String>> = parts.iter().map(|p| Some(p.to_string())).collect();
            assert_eq!(widget.decompress(Some(&stored)), expected, "{:?}", parts);
        }
    }
}
