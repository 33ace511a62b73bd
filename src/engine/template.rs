//! RowTemplate - blank-row factory and emptiness reference.
//!
//! Captured once, at attach time, from the table's last row. The template's
//! serialized values become the permanent defaults that define "empty" for
//! the table's lifetime; its structure (field names and raw values) is what
//! blank rows are cloned from.

use super::row::{Field, Row};
use super::serializer::serialize;
use crate::types::Record;

/// The reference row cloned from the table's last row at initialization.
#[derive(Clone, Debug)]
pub(crate) struct RowTemplate {
    fields: Vec<Field>,
    defaults: Record,
}

impl RowTemplate {
    /// Capture the template from the row that is last at attach time.
    ///
    /// Only structure and values are captured, never the row's cached
    /// record or lifecycle flag.
    pub(crate) fn capture(last_row: &Row) -> Self {
        let mut defaults = Record::new();
        for field in &last_row.fields {
            defaults.set(field.name.clone(), field.value.trim());
        }
        Self {
            fields: last_row.fields.clone(),
            defaults,
        }
    }

    /// A fresh blank row: template structure, flagged as new.
    pub(crate) fn blank(&self) -> Row {
        Row {
            fields: self.fields.clone(),
            is_new: true,
            record: None,
        }
    }

    /// A row populated from a supplied record.
    ///
    /// Fields the record does not name are blanked; the record itself is
    /// cached on the row verbatim. Populated rows are never new.
    pub(crate) fn populated(&self, record: &Record) -> Row {
        let fields = self
            .fields
            .iter()
            .map(|field| Field {
                name: field.name.clone(),
                value: record.get(&field.name).unwrap_or_default().to_string(),
            })
            .collect();
        Row {
            fields,
            is_new: false,
            record: Some(record.clone()),
        }
    }

    /// Whether the template row carries a field of this name.
    pub(crate) fn knows_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Field names in template order.
    pub(crate) fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// The permanent default mapping defining "empty".
    pub(crate) fn defaults(&self) -> &Record {
        &self.defaults
    }

    /// A row is empty iff its current serialization matches the defaults
    /// exactly: same field set, same values. Extra or missing fields on
    /// either side count as mismatch.
    pub(crate) fn is_empty(&self, row: &mut Row) -> bool {
        serialize(row) == self.defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::row::seed;

    fn template() -> RowTemplate {
        RowTemplate::capture(&Row::seeded(seed(&[("name", ""), ("age", "")])))
    }

    #[test]
    fn test_blank_is_new_without_record() {
        let row = template().blank();
        assert!(row.is_new());
        assert!(!row.has_record());
        assert_eq!(row.field_value("name"), Some(""));
    }

    #[test]
    fn test_defaults_are_trimmed() {
        let t = RowTemplate::capture(&Row::seeded(seed(&[("note", "  n/a ")])));
        assert_eq!(t.defaults().get("note"), Some("n/a"));
    }

    #[test]
    fn test_populated_fills_and_caches_verbatim() {
        let record = Record::from_pairs([("name", "Bob"), ("color", "teal")]);
        let row = template().populated(&record);

        assert!(!row.is_new());
        assert_eq!(row.field_value("name"), Some("Bob"));
        // Unknown fields don't appear in the row...
        assert_eq!(row.field_value("color"), None);
        // ...but the supplied record is cached as given
        assert_eq!(row.record.as_ref().unwrap().get("color"), Some("teal"));
        // Fields the record doesn't name are blanked, not defaulted
        assert_eq!(row.field_value("age"), Some(""));
    }

    #[test]
    fn test_is_empty_exact_match_and_reversible() {
        let t = template();
        let mut row = t.blank();
        assert!(t.is_empty(&mut row));

        // Emptiness goes through the serialization cache: change the cached
        // record, not just the mirror
        let mut away = t.blank();
        away.set_field_value("name", "x");
        assert!(!t.is_empty(&mut away));

        let mut back = t.blank();
        back.set_field_value("name", "x");
        back.set_field_value("name", "");
        assert!(t.is_empty(&mut back));
    }

    #[test]
    fn test_is_empty_field_set_mismatch() {
        let t = template();
        // A row from an incompatible schema is never empty
        let mut narrow = Row::seeded(seed(&[("name", "")]));
        assert!(!t.is_empty(&mut narrow));

        let mut wide = Row::seeded(seed(&[("name", ""), ("age", ""), ("x", "")]));
        assert!(!t.is_empty(&mut wide));
    }
}
