//! # spark-records
//!
//! Editable record-table engine for reactive terminal UIs.
//!
//! Keeps an in-memory collection of records synchronized with the rows of a
//! host-rendered table: cells get edited, records appear and change, rows
//! grow under focus and empty rows are reclaimed, and the table always ends
//! in exactly one blank entry row.
//!
//! ## Architecture
//!
//! Rows are entries in an ordered arena owned by the engine, referenced by
//! visible index. UI notifications (input, focus, blur, removal) flow in;
//! typed record events flow out:
//!
//! ```text
//! host UI events → RecordTable → RecordEvent stream → handlers / signals
//!                      ↑
//!        commands via EditableTable (add records, get records)
//! ```
//!
//! The engine is single-threaded and cooperative: the two deferred
//! behaviors (the blur-scheduled prune and next-tick removal notifications)
//! are driven by pumping [`EditableTable::pump`] from the host's event
//! loop.
//!
//! ## Example
//!
//! ```ignore
//! use spark_records::{EditableTable, seed};
//!
//! let table = EditableTable::attach("people", vec![seed(&[("name", ""), ("age", "")])])?;
//!
//! let _cleanup = table.on_change(|kind, record, index| {
//!     println!("{} @ {index}: {record:?}", kind.as_str());
//! });
//!
//! table.focus(0);                   // the entry row grows a successor
//! table.input(0, "name", "Alice");  // record:add({name: "Alice", age: ""}, 0)
//! table.blur();
//! table.pump();                     // reclaims trailing empty rows
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `Record`, `ChangeKind`, `RecordEvent`, `TableError`
//! - [`engine`] - row arena, template, serializer, lifecycle state machine
//! - [`state`] - typed event registry and reactive cells
//! - [`table`] - the public `EditableTable` surface
//! - [`host`] - terminal key-event binding

pub mod engine;
pub mod host;
pub mod state;
pub mod table;
pub mod types;

// Re-export commonly used items
pub use engine::{PRUNE_DELAY, RecordTable, Row, seed};
pub use host::TableCursor;
pub use state::{ChangeHandler, Cleanup, EventRegistry, RecordHandler};
pub use table::EditableTable;
pub use types::{ChangeKind, Record, RecordEvent, TableError};
