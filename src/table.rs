//! EditableTable - the public surface.
//!
//! A thin, cloneable handle binding the lifecycle engine to the hosting
//! application: commands in (`add_record`, `add_records`, `records`), UI
//! notifications in (`input`, `focus`, `blur`, `remove_trigger`,
//! `row_removed`, `pump`), and the typed event stream out.
//!
//! Attachment is idempotent and keyed: attaching to an id that already has
//! an engine returns the existing handle and ignores the new seed.
//!
//! # Example
//!
//! ```ignore
//! use spark_records::{EditableTable, Record, seed};
//!
//! let table = EditableTable::attach("people", vec![seed(&[("name", ""), ("age", "")])])?;
//!
//! let _cleanup = table.on_add(|record, index| {
//!     println!("+ row {index}: {:?}", record.get("name"));
//! });
//!
//! table.focus(0);                     // entry row grows
//! table.input(0, "name", "Alice");    // record:add fires
//! table.blur();
//! table.pump();                       // drives the deferred prune / removals
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use spark_signals::Signal;
use tracing::debug;

use crate::engine::RecordTable;
use crate::state::{Cleanup, EventRegistry};
use crate::types::{ChangeKind, Record, RecordEvent, TableError};

thread_local! {
    /// Attached tables by host id, so re-attachment finds the live engine.
    static ATTACHED: RefCell<HashMap<String, EditableTable>> = RefCell::new(HashMap::new());
}

/// Cloneable handle to one table's engine and event registry.
#[derive(Clone, Debug)]
pub struct EditableTable {
    core: Rc<RefCell<RecordTable>>,
    events: Rc<EventRegistry>,
}

impl EditableTable {
    /// Build a standalone (unkeyed) table from the host's rows at attach
    /// time; the last row becomes the blank entry row.
    pub fn new(rows: Vec<Vec<(String, String)>>) -> Result<Self, TableError> {
        Ok(Self {
            core: Rc::new(RefCell::new(RecordTable::new(rows)?)),
            events: Rc::new(EventRegistry::new()),
        })
    }

    // =========================================================================
    // ATTACHMENT
    // =========================================================================

    /// Attach to the table identified by `id`. Idempotent: if an engine for
    /// this id already exists, it is returned unchanged and `rows` is
    /// ignored.
    pub fn attach(id: &str, rows: Vec<Vec<(String, String)>>) -> Result<Self, TableError> {
        if let Some(existing) = ATTACHED.with(|tables| tables.borrow().get(id).cloned()) {
            debug!(id, "already attached");
            return Ok(existing);
        }

        let table = Self::new(rows)?;
        ATTACHED.with(|tables| {
            tables.borrow_mut().insert(id.to_string(), table.clone());
        });
        debug!(id, "table attached");
        Ok(table)
    }

    /// Drop the engine registered under `id`. Returns false if none was.
    pub fn detach(id: &str) -> bool {
        let detached = ATTACHED.with(|tables| tables.borrow_mut().remove(id).is_some());
        if detached {
            debug!(id, "table detached");
        }
        detached
    }

    /// Whether an engine is registered under `id`.
    pub fn is_attached(id: &str) -> bool {
        ATTACHED.with(|tables| tables.borrow().contains_key(id))
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Insert a populated row just above the entry row. Silent by contract.
    pub fn add_record(&self, record: Record) {
        self.core.borrow_mut().add_record(record, None);
    }

    /// Insert a populated row at `index` (clamped). Silent by contract.
    pub fn add_record_at(&self, record: Record, index: usize) {
        self.core.borrow_mut().add_record(record, Some(index));
    }

    /// Insert a batch of populated rows starting at index 0. The batch is
    /// validated whole; nothing is applied on error.
    pub fn add_records(&self, records: Vec<Record>) -> Result<(), TableError> {
        self.core.borrow_mut().add_records(records, None)
    }

    /// Insert a batch of populated rows starting at `start`.
    pub fn add_records_at(&self, records: Vec<Record>, start: usize) -> Result<(), TableError> {
        self.core.borrow_mut().add_records(records, Some(start))
    }

    /// Snapshot of all records, in visible order. The entry row and
    /// untouched new rows are excluded.
    pub fn records(&self) -> Vec<Record> {
        self.core.borrow_mut().records()
    }

    // =========================================================================
    // UI NOTIFICATIONS
    // =========================================================================

    /// A field of the row at `index` changed to `value`.
    pub fn input(&self, index: usize, field: &str, value: &str) {
        let events = self.core.borrow_mut().field_edited(index, field, value);
        self.dispatch(events);
    }

    /// Focus landed in the row at `index`.
    pub fn focus(&self, index: usize) {
        self.core.borrow_mut().row_focused(index);
    }

    /// Focus left a row.
    pub fn blur(&self) {
        self.blur_at(Instant::now());
    }

    /// Focus left a row, with an explicit clock (deterministic tests).
    pub fn blur_at(&self, now: Instant) {
        self.core.borrow_mut().row_blurred(now);
    }

    /// The row's remove affordance was activated.
    pub fn remove_trigger(&self, index: usize) {
        self.core.borrow_mut().remove_triggered(index);
    }

    /// The host removed a row on its own.
    pub fn row_removed(&self, index: usize) {
        self.core.borrow_mut().row_removed(index);
    }

    /// Pump the cooperative schedule once.
    pub fn pump(&self) {
        self.pump_at(Instant::now());
    }

    /// Pump with an explicit clock (deterministic tests).
    pub fn pump_at(&self, now: Instant) {
        let events = self.core.borrow_mut().tick(now);
        self.dispatch(events);
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Number of visible rows, entry row included.
    pub fn row_count(&self) -> usize {
        self.core.borrow().row_count()
    }

    /// Reactive row count.
    pub fn row_count_signal(&self) -> Signal<usize> {
        self.core.borrow().row_count_signal()
    }

    /// The template's field names, in visible order.
    pub fn field_names(&self) -> Vec<String> {
        self.core.borrow().field_names()
    }

    /// Current mirrored value of one field.
    pub fn field_value(&self, index: usize, name: &str) -> Option<String> {
        self.core
            .borrow()
            .field_value(index, name)
            .map(String::from)
    }

    /// The most recent event, if any.
    pub fn last_change(&self) -> Option<RecordEvent> {
        self.events.last_change()
    }

    /// Reactive cell holding the most recent event.
    pub fn last_change_signal(&self) -> Signal<Option<RecordEvent>> {
        self.events.last_change_signal()
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// A row produced its record.
    pub fn on_add(&self, handler: impl Fn(&Record, usize) + 'static) -> Cleanup {
        self.events.on_kind(ChangeKind::Add, handler)
    }

    /// A single field of a record changed.
    pub fn on_update(&self, handler: impl Fn(&Record, usize) + 'static) -> Cleanup {
        self.events.on_kind(ChangeKind::Update, handler)
    }

    /// A recorded row left the table.
    pub fn on_remove(&self, handler: impl Fn(&Record, usize) + 'static) -> Cleanup {
        self.events.on_kind(ChangeKind::Remove, handler)
    }

    /// Every transition, with its kind.
    pub fn on_change(&self, handler: impl Fn(ChangeKind, &Record, usize) + 'static) -> Cleanup {
        self.events.on_change(handler)
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    /// Publish engine events after the engine borrow has ended, so handlers
    /// are free to call back into the table.
    fn dispatch(&self, events: Vec<RecordEvent>) {
        for event in &events {
            self.events.emit(event);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
