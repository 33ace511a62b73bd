//! Table Engine - Row arena and record lifecycle.
//!
//! The engine owns the core data structures:
//! - Row: arena entry with named fields, lifecycle flag, cached record
//! - RowTemplate: blank-row factory and emptiness reference
//! - Serializer: row → record with caching
//! - Schedule: single-slot deferred prune + next-tick removal queue
//! - RecordTable: the lifecycle state machine itself
//!
//! # Architecture
//!
//! Rows are NOT shared handles. They are entries in a `Vec<Row>` owned solely
//! by [`RecordTable`], referenced by visible index:
//!
//! ```text
//! Index 0: Row (record={name:"Alice"}, is_new=false)
//! Index 1: Row (record={name:"Bob"},   is_new=false)
//! Index 2: Row (record=None,           is_new=true)   <- blank entry row
//! ```
//!
//! Indices shift as rows are inserted and removed; nothing outside the engine
//! holds onto a row. The host addresses rows by their current visible
//! position, exactly as it sees them.

mod row;
mod schedule;
mod serializer;
mod table;
mod template;

pub use row::{Row, seed};
pub use schedule::PRUNE_DELAY;
pub use table::RecordTable;
