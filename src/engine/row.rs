//! Row - one arena entry in the table's row sequence.
//!
//! A row mirrors the host's current field values and carries the two pieces
//! of lifecycle state the engine tracks per row: the `is_new` flag (the row
//! has never produced a record) and the cached record, set once derived or
//! assigned. A row with neither is in transition: it existed before the
//! engine attached and has not been serialized yet.

use crate::types::Record;

/// One named field of a row, mirroring the host's input of the same name.
#[derive(Clone, Debug)]
pub(crate) struct Field {
    pub(crate) name: String,
    pub(crate) value: String,
}

/// One visible row. Owned by the engine's row sequence, addressed by index.
#[derive(Clone, Debug)]
pub struct Row {
    pub(crate) fields: Vec<Field>,
    pub(crate) is_new: bool,
    pub(crate) record: Option<Record>,
}

impl Row {
    /// A row seeded from the host's current markup. Not new, no record.
    pub(crate) fn seeded(fields: Vec<(String, String)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, value)| Field { name, value })
                .collect(),
            is_new: false,
            record: None,
        }
    }

    /// True while the row has never produced a record.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// True once a record has been derived from or assigned to the row.
    pub fn has_record(&self) -> bool {
        self.record.is_some()
    }

    /// Current (raw, untrimmed) value of a named field.
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Field names in visible order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Overwrite a field's mirrored value. Returns false for unknown names.
    pub(crate) fn set_field_value(&mut self, name: &str, value: &str) -> bool {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value = value.to_string();
                true
            }
            None => false,
        }
    }
}

/// Build a row seed from borrowed pairs.
///
/// ```ignore
/// use spark_records::{EditableTable, seed};
///
/// let table = EditableTable::new(vec![seed(&[("name", ""), ("age", "")])])?;
/// ```
pub fn seed(fields: &[(&str, &str)]) -> Vec<(String, String)> {
    fields
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_row_is_in_transition() {
        let row = Row::seeded(seed(&[("name", "Alice")]));
        assert!(!row.is_new());
        assert!(!row.has_record());
        assert_eq!(row.field_value("name"), Some("Alice"));
    }

    #[test]
    fn test_set_field_value() {
        let mut row = Row::seeded(seed(&[("name", "")]));
        assert!(row.set_field_value("name", "Bob"));
        assert_eq!(row.field_value("name"), Some("Bob"));
        assert!(!row.set_field_value("missing", "x"));
    }

    #[test]
    fn test_field_names_keep_order() {
        let row = Row::seeded(seed(&[("b", ""), ("a", "")]));
        let names: Vec<&str> = row.field_names().collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
