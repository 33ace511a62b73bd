//! Core types shared across the crate.
//!
//! - [`Record`] - field-name → value mapping derived from or assigned to a row
//! - [`ChangeKind`] - which lifecycle transition an event describes
//! - [`RecordEvent`] - one emitted table notification
//! - [`TableError`] - the crate's (small) failure surface

use thiserror::Error;

// =============================================================================
// RECORD
// =============================================================================

/// A record: named string values belonging to exactly one row.
///
/// Field order follows the row the record was derived from, but equality is
/// order-insensitive: a record is a mapping, not a list. Field names are
/// unique; [`Record::set`] replaces an existing value in place.
#[derive(Clone, Debug, Default)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(name, value)` pairs.
    ///
    /// Later pairs overwrite earlier ones with the same name.
    pub fn from_pairs<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (name, value) in pairs {
            record.set(name.into(), value.into());
        }
        record
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set a field value, replacing any existing value for that name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Check whether a field name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate `(name, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Iterate field names in field order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }
}

impl PartialEq for Record {
    /// Order-insensitive exact match: same field set, same values.
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self.iter().all(|(name, value)| other.get(name) == Some(value))
    }
}

impl Eq for Record {}

// =============================================================================
// EVENTS
// =============================================================================

/// Which lifecycle transition a [`RecordEvent`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A row produced its record for the first time.
    Add,
    /// A single field of an existing record changed.
    Update,
    /// A recorded row left the table.
    Remove,
}

impl ChangeKind {
    /// Lowercase name, matching the event vocabulary of the host API.
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Add => "add",
            ChangeKind::Update => "update",
            ChangeKind::Remove => "remove",
        }
    }
}

/// One emitted table notification.
///
/// `index` is the row's visible position at the moment the transition
/// happened; for removals, the index the row occupied before it left.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordEvent {
    pub kind: ChangeKind,
    pub record: Record,
    pub index: usize,
}

impl RecordEvent {
    pub fn new(kind: ChangeKind, record: Record, index: usize) -> Self {
        Self { kind, record, index }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// The crate's failure surface.
///
/// Everything else in the engine is total: out-of-range indices clamp or
/// no-op, absent fields serialize to absent keys, removing an unrecorded row
/// is silent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// A table needs at least one row: the last row is cloned as the blank
    /// template at attach time.
    #[error("cannot attach to a table with no rows")]
    MissingTemplateRow,

    /// A batch insert named a field the template row does not carry. The
    /// whole batch is rejected; nothing was applied.
    #[error("record {record} names unknown field `{field}`")]
    UnknownField { record: usize, field: String },
}

// =============================================================================
// TESTS
// =============================================================================
