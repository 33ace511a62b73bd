//! Serializer - turn a row into a record, with caching.
//!
//! A row that already has an associated record is never re-derived from its
//! current field values; the cached record is returned unchanged. Otherwise
//! every named field is read, whitespace-trimmed, and the resulting mapping
//! is cached on the row before being returned. Absent fields are simply
//! absent from the mapping; serialization never fails.

use super::row::Row;
use crate::types::Record;

/// Serialize a row. Cached-or-derive; caching is the only side effect.
pub(crate) fn serialize(row: &mut Row) -> Record {
    if let Some(record) = &row.record {
        return record.clone();
    }

    let mut record = Record::new();
    for field in &row.fields {
        record.set(field.name.clone(), field.value.trim());
    }
    row.record = Some(record.clone());
    record
}
