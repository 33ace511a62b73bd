//! RecordTable - the row/record lifecycle state machine.
//!
//! Owns the table's row sequence and keeps it synchronized with the host UI:
//! rows grow when focus lands in the last row, empty rows are pruned from the
//! bottom, edits promote rows to records, and removals are reconciled after
//! the host performs them. Each transition yields the events the surface
//! republishes.
//!
//! # Event discipline
//!
//! Mutating methods return the [`RecordEvent`]s the transition produced
//! instead of invoking callbacks while the engine is borrowed; the surface
//! dispatches them after the borrow ends. A given row's own sequence is
//! always `add` → (`update`)* → `remove`.
//!
//! # Example
//!
//! ```ignore
//! use spark_records::{RecordTable, seed};
//! use std::time::Instant;
//!
//! let mut table = RecordTable::new(vec![seed(&[("name", ""), ("age", "")])])?;
//! table.row_focused(0);                           // grows: entry row stays blank
//! let events = table.field_edited(0, "name", "Alice");
//! assert_eq!(events[0].kind, spark_records::ChangeKind::Add);
//! table.row_blurred(Instant::now());              // schedules the deferred prune
//! ```

use std::time::Instant;

use spark_signals::{Signal, signal};
use tracing::trace;

use super::row::Row;
use super::schedule::{PruneTimer, RemovalQueue};
use super::serializer::serialize;
use super::template::RowTemplate;
use crate::types::{ChangeKind, Record, RecordEvent, TableError};

/// The lifecycle engine. One per attached table.
#[derive(Debug)]
pub struct RecordTable {
    rows: Vec<Row>,
    template: RowTemplate,
    prune_timer: PruneTimer,
    removal_queue: RemovalQueue,
    row_count: Signal<usize>,
}

impl RecordTable {
    /// Build the engine from the host table's rows as rendered at attach
    /// time, each row given as ordered `(field-name, value)` pairs.
    ///
    /// The last row becomes the blank entry row and is cloned as the
    /// template; rows above it are in transition until first serialized.
    pub fn new(rows: Vec<Vec<(String, String)>>) -> Result<Self, TableError> {
        let mut rows: Vec<Row> = rows.into_iter().map(Row::seeded).collect();
        let last = match rows.last_mut() {
            Some(last) => last,
            None => return Err(TableError::MissingTemplateRow),
        };
        last.is_new = true;
        let template = RowTemplate::capture(last);
        let count = rows.len();

        Ok(Self {
            rows,
            template,
            prune_timer: PruneTimer::default(),
            removal_queue: RemovalQueue::default(),
            row_count: signal(count),
        })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Number of visible rows, entry row included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Reactive row count. Updates on every growth, prune, and removal.
    pub fn row_count_signal(&self) -> Signal<usize> {
        self.row_count.clone()
    }

    /// The row at a visible index.
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Current mirrored value of one field.
    pub fn field_value(&self, index: usize, name: &str) -> Option<&str> {
        self.rows.get(index).and_then(|row| row.field_value(name))
    }

    /// The template's field names, in visible order.
    pub fn field_names(&self) -> Vec<String> {
        self.template.field_names().map(String::from).collect()
    }

    /// The permanent defaults defining "empty".
    pub fn defaults(&self) -> &Record {
        self.template.defaults()
    }

    /// Whether a deferred prune is scheduled.
    pub fn has_pending_prune(&self) -> bool {
        self.prune_timer.is_pending()
    }

    /// Removal notifications owed on the next tick.
    pub fn pending_removals(&self) -> usize {
        self.removal_queue.len()
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Insert a populated row. `index` defaults to just above the entry row;
    /// out-of-range indices clamp. Programmatic adds emit nothing: the
    /// caller already knows the data it supplied.
    pub fn add_record(&mut self, record: Record, index: Option<usize>) {
        let at = index
            .unwrap_or(self.rows.len() - 1)
            .min(self.rows.len() - 1);
        self.rows.insert(at, self.template.populated(&record));
        self.sync_row_count();
        trace!(index = at, "record row inserted");
    }

    /// Insert a batch of populated rows at consecutive indices starting at
    /// `start` (default 0). The whole batch is validated against the
    /// template's field set first; a record naming an unknown field rejects
    /// the batch without applying anything.
    pub fn add_records(
        &mut self,
        records: Vec<Record>,
        start: Option<usize>,
    ) -> Result<(), TableError> {
        for (position, record) in records.iter().enumerate() {
            for name in record.field_names() {
                if !self.template.knows_field(name) {
                    return Err(TableError::UnknownField {
                        record: position,
                        field: name.to_string(),
                    });
                }
            }
        }

        let start = start.unwrap_or(0);
        for (offset, record) in records.into_iter().enumerate() {
            self.add_record(record, Some(start + offset));
        }
        Ok(())
    }

    /// Snapshot of every row's record except the trailing entry row, in
    /// visible order. Untouched new rows are skipped; transition rows are
    /// serialized (and cached) on the way out.
    pub fn records(&mut self) -> Vec<Record> {
        let last = self.rows.len() - 1;
        let mut records = Vec::new();
        for row in &mut self.rows[..last] {
            if row.is_new {
                continue;
            }
            records.push(serialize(row));
        }
        records
    }

    // =========================================================================
    // UI NOTIFICATIONS
    // =========================================================================

    /// A field of the row at `index` changed to `value`.
    ///
    /// First meaningful edit of a new row promotes it: every unrecorded row
    /// above it gets a synthetic record first (top-to-bottom), then the
    /// edited row's own `add` is emitted. Edits to promoted rows update the
    /// single changed field in place.
    pub fn field_edited(&mut self, index: usize, name: &str, value: &str) -> Vec<RecordEvent> {
        let Some(row) = self.rows.get_mut(index) else {
            return Vec::new();
        };
        if !row.set_field_value(name, value) {
            return Vec::new();
        }

        let mut events = Vec::new();

        if self.rows[index].is_new {
            self.rows[index].is_new = false;

            // People tab through rows without typing; those rows still have
            // to be represented as records once something below them is.
            // Walk up to the first row that already has one.
            let mut unrecorded = Vec::new();
            let mut above = index;
            while above > 0 {
                above -= 1;
                if self.rows[above].has_record() {
                    break;
                }
                unrecorded.push(above);
            }
            for &at in unrecorded.iter().rev() {
                let record = serialize(&mut self.rows[at]);
                self.rows[at].is_new = false;
                trace!(index = at, "synthesized record for skipped row");
                events.push(RecordEvent::new(ChangeKind::Add, record, at));
            }

            let record = serialize(&mut self.rows[index]);
            trace!(index, "row promoted to record");
            events.push(RecordEvent::new(ChangeKind::Add, record, index));
        } else {
            // Single-field update: the rest of the record is never re-read
            // from the row. The value is stored as delivered; trimming only
            // happens on first serialization.
            let mut record = serialize(&mut self.rows[index]);
            record.set(name, value);
            self.rows[index].record = Some(record.clone());
            events.push(RecordEvent::new(ChangeKind::Update, record, index));
        }

        events
    }

    /// Focus landed in the row at `index`.
    ///
    /// Focusing the current last row appends a fresh blank row, one append
    /// per focus event. Then trailing empty rows are pruned up to (never
    /// including) the focused row, and any deferred prune is cancelled.
    pub fn row_focused(&mut self, index: usize) {
        if index >= self.rows.len() {
            return;
        }
        if index == self.rows.len() - 1 {
            self.rows.push(self.template.blank());
            self.sync_row_count();
            trace!("blank entry row appended");
        }
        self.prune(Some(index));
        self.prune_timer.cancel();
    }

    /// Focus left a row. Prune after a short delay: a focus event may be
    /// about to land in another row of this table, and it wins.
    pub fn row_blurred(&mut self, now: Instant) {
        self.prune_timer.schedule(now);
    }

    /// The row's remove affordance was activated: drop it immediately, then
    /// reclaim trailing empty rows.
    pub fn remove_triggered(&mut self, index: usize) {
        if index >= self.rows.len() {
            return;
        }
        self.remove_row_at(index);
        self.prune(None);
    }

    /// The host removed a row on its own (observed, any cause). The engine
    /// only reconciles its bookkeeping; out-of-range indices are stale
    /// notifications and ignored.
    pub fn row_removed(&mut self, index: usize) {
        if index >= self.rows.len() {
            return;
        }
        self.remove_row_at(index);
    }

    /// Pump the cooperative schedule: emit removal notifications owed from
    /// the previous tick, then run the deferred prune if it has come due.
    pub fn tick(&mut self, now: Instant) -> Vec<RecordEvent> {
        let mut events = Vec::new();
        for (record, index) in self.removal_queue.drain() {
            trace!(index, "record removal notified");
            events.push(RecordEvent::new(ChangeKind::Remove, record, index));
        }
        if self.prune_timer.fire(now) {
            self.prune(None);
        }
        events
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    /// Remove trailing empty rows, walking upward from the row just above
    /// the entry row. Stops at the first non-empty row or at `keep` (the
    /// focused row is never evicted, empty or not). The entry row itself is
    /// never evaluated.
    fn prune(&mut self, keep: Option<usize>) {
        while self.rows.len() >= 2 {
            let candidate = self.rows.len() - 2;
            if keep == Some(candidate) {
                break;
            }
            if !self.template.is_empty(&mut self.rows[candidate]) {
                break;
            }
            trace!(index = candidate, "empty row pruned");
            self.remove_row_at(candidate);
        }
    }

    /// Drop the row at `index`. A row that never got past `is_new` leaves
    /// silently; any other row owes a removal notification on the next tick,
    /// carrying its last known record and the index it occupied. The table
    /// never ends up rowless.
    fn remove_row_at(&mut self, index: usize) {
        let mut row = self.rows.remove(index);
        if !row.is_new {
            let record = serialize(&mut row);
            self.removal_queue.push(record, index);
        }
        if self.rows.is_empty() {
            self.rows.push(self.template.blank());
        }
        self.sync_row_count();
    }

    fn sync_row_count(&mut self) {
        self.row_count.set(self.rows.len());
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::row::seed;
    use crate::engine::schedule::PRUNE_DELAY;

    fn table() -> RecordTable {
        RecordTable::new(vec![seed(&[("name", ""), ("age", "")])]).unwrap()
    }

    fn kinds(events: &[RecordEvent]) -> Vec<ChangeKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_new_requires_a_template_row() {
        assert_eq!(
            RecordTable::new(Vec::new()).unwrap_err(),
            TableError::MissingTemplateRow
        );
    }

    #[test]
    fn test_last_seed_row_becomes_entry_row() {
        let t = table();
        assert_eq!(t.row_count(), 1);
        assert!(t.row(0).unwrap().is_new());
    }

    #[test]
    fn test_focus_in_last_row_grows_once_per_event() {
        let mut t = table();
        t.row_focused(0);
        assert_eq!(t.row_count(), 2);

        // Same row again: no longer last, no growth
        t.row_focused(0);
        assert_eq!(t.row_count(), 2);

        // Each focus event on the current last row appends
        t.row_focused(1);
        assert_eq!(t.row_count(), 3);
        t.row_focused(2);
        assert_eq!(t.row_count(), 4);
    }

    #[test]
    fn test_first_edit_emits_add_then_updates() {
        let mut t = table();
        t.row_focused(0);

        let events = t.field_edited(0, "name", "Alice");
        assert_eq!(kinds(&events), vec![ChangeKind::Add]);
        assert_eq!(events[0].index, 0);
        assert_eq!(
            events[0].record,
            Record::from_pairs([("name", "Alice"), ("age", "")])
        );

        let events = t.field_edited(0, "age", "30");
        assert_eq!(kinds(&events), vec![ChangeKind::Update]);
        assert_eq!(
            events[0].record,
            Record::from_pairs([("name", "Alice"), ("age", "30")])
        );
    }

    #[test]
    fn test_update_changes_single_field_in_place() {
        let mut t = table();
        t.row_focused(0);
        t.field_edited(0, "name", "  Alice  ");

        // First serialization trimmed
        assert_eq!(t.records()[0].get("name"), Some("Alice"));

        // In-place update stores the value as delivered
        let events = t.field_edited(0, "name", "  Bob ");
        assert_eq!(events[0].record.get("name"), Some("  Bob "));
        assert_eq!(events[0].record.get("age"), Some(""));
    }

    #[test]
    fn test_edit_unknown_field_is_a_no_op() {
        let mut t = table();
        assert!(t.field_edited(0, "nope", "x").is_empty());
        assert!(t.field_edited(9, "name", "x").is_empty());
        assert!(t.row(0).unwrap().is_new());
    }

    #[test]
    fn test_tabbed_through_rows_get_records_top_down() {
        let mut t = table();
        t.row_focused(0);
        t.row_focused(1);
        t.row_focused(2);
        assert_eq!(t.row_count(), 4);

        let events = t.field_edited(2, "name", "Carol");
        assert_eq!(
            kinds(&events),
            vec![ChangeKind::Add, ChangeKind::Add, ChangeKind::Add]
        );
        let indices: Vec<usize> = events.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);

        // The skipped rows carry the template defaults
        assert_eq!(events[0].record, *t.defaults());
        assert_eq!(events[1].record, *t.defaults());
        assert_eq!(events[2].record.get("name"), Some("Carol"));
    }

    #[test]
    fn test_synthesis_happens_once_per_row_lifetime() {
        let mut t = table();
        t.row_focused(0);
        t.row_focused(1);
        let events = t.field_edited(1, "name", "Bob");
        assert_eq!(kinds(&events), vec![ChangeKind::Add, ChangeKind::Add]);

        // The synthesized row is promoted: its next edit is an update, and
        // editing below it synthesizes nothing new
        let events = t.field_edited(0, "name", "Alice");
        assert_eq!(kinds(&events), vec![ChangeKind::Update]);

        t.row_focused(2);
        let events = t.field_edited(2, "name", "Carol");
        assert_eq!(kinds(&events), vec![ChangeKind::Add]);
        assert_eq!(events[0].index, 2);
    }

    #[test]
    fn test_synthesis_walk_stops_at_first_recorded_row() {
        let mut t = table();
        t.add_record(Record::from_pairs([("name", "Anna"), ("age", "1")]), None);
        assert_eq!(t.row_count(), 2);

        t.row_focused(1);
        t.row_focused(2);
        let events = t.field_edited(2, "name", "Carol");

        // Row 1 (tabbed through) is synthesized; row 0 already has a record
        let indices: Vec<usize> = events.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_records_skips_entry_row_and_untouched_rows() {
        let mut t = table();
        t.row_focused(0);
        t.row_focused(1);
        assert_eq!(t.row_count(), 3);

        // Two untouched new rows and the entry row: nothing to report
        assert!(t.records().is_empty());

        t.field_edited(0, "name", "Alice");
        let records = t.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), Some("Alice"));
    }

    #[test]
    fn test_add_record_defaults_to_above_entry_row() {
        let mut t = table();
        t.add_record(Record::from_pairs([("name", "Bob"), ("age", "2")]), None);

        assert_eq!(t.row_count(), 2);
        assert!(t.row(1).unwrap().is_new());
        assert_eq!(t.field_value(0, "name"), Some("Bob"));
        assert_eq!(t.records().len(), 1);
    }

    #[test]
    fn test_add_record_clamps_out_of_range_index() {
        let mut t = table();
        t.add_record(Record::from_pairs([("name", "Bob")]), Some(99));
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.field_value(0, "name"), Some("Bob"));
        assert!(t.row(1).unwrap().is_new());
    }

    #[test]
    fn test_add_records_inserts_in_order_silently() {
        let mut t = table();
        let result = t.add_records(
            vec![
                Record::from_pairs([("name", "Alice")]),
                Record::from_pairs([("name", "Bob")]),
            ],
            None,
        );
        assert!(result.is_ok());

        let records = t.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some("Alice"));
        assert_eq!(records[1].get("name"), Some("Bob"));
    }

    #[test]
    fn test_add_records_rejects_unknown_fields_atomically() {
        let mut t = table();
        let result = t.add_records(
            vec![
                Record::from_pairs([("name", "Alice")]),
                Record::from_pairs([("color", "teal")]),
            ],
            None,
        );
        assert_eq!(
            result.unwrap_err(),
            TableError::UnknownField {
                record: 1,
                field: "color".to_string(),
            }
        );
        // Nothing was applied
        assert_eq!(t.row_count(), 1);
        assert!(t.records().is_empty());
    }

    #[test]
    fn test_focus_prunes_trailing_empty_rows() {
        let mut t = table();
        t.row_focused(0);
        t.row_focused(1);
        t.row_focused(2);
        t.field_edited(0, "name", "Alice");
        assert_eq!(t.row_count(), 4);

        // Focus back on row 0: the untouched rows between it and the entry
        // row are reclaimed
        t.row_focused(0);
        assert_eq!(t.row_count(), 2);
    }

    #[test]
    fn test_prune_preserves_focused_row_even_if_empty() {
        let mut t = table();
        t.row_focused(0);
        t.row_focused(1);
        assert_eq!(t.row_count(), 3);

        t.row_focused(1);
        assert_eq!(t.row_count(), 3);
    }

    #[test]
    fn test_prune_stops_at_first_non_empty_row() {
        let mut t = table();
        t.row_focused(0);
        t.field_edited(0, "name", "Alice");
        t.row_focused(1);
        t.row_focused(2);
        assert_eq!(t.row_count(), 4);

        t.row_focused(0);
        // Rows 1 and 2 were empty; row 0 is non-empty and keeps its place
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.records().len(), 1);
    }

    #[test]
    fn test_blur_defers_prune_until_tick() {
        let mut t = table();
        let t0 = Instant::now();
        t.row_focused(0);
        t.row_focused(1);
        t.field_edited(0, "name", "Alice");
        assert_eq!(t.row_count(), 3);

        t.row_blurred(t0);
        assert!(t.has_pending_prune());
        assert_eq!(t.row_count(), 3);

        assert!(t.tick(t0 + PRUNE_DELAY).is_empty());
        assert_eq!(t.row_count(), 2);
        assert!(!t.has_pending_prune());
    }

    #[test]
    fn test_focus_cancels_deferred_prune() {
        let mut t = table();
        let t0 = Instant::now();
        t.row_focused(0);
        t.row_focused(1);
        assert_eq!(t.row_count(), 3);

        t.row_blurred(t0);
        t.row_focused(1);
        assert!(!t.has_pending_prune());

        // The cancelled prune never runs
        t.tick(t0 + PRUNE_DELAY);
        assert_eq!(t.row_count(), 3);
    }

    #[test]
    fn test_remove_triggered_emits_on_next_tick() {
        let mut t = table();
        t.row_focused(0);
        t.field_edited(0, "name", "Alice");
        t.row_focused(1);
        t.field_edited(1, "name", "Bob");
        assert_eq!(t.row_count(), 3);

        t.remove_triggered(1);
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.pending_removals(), 1);

        let events = t.tick(Instant::now());
        assert_eq!(kinds(&events), vec![ChangeKind::Remove]);
        assert_eq!(events[0].index, 1);
        assert_eq!(events[0].record.get("name"), Some("Bob"));

        // Exactly once
        assert!(t.tick(Instant::now()).is_empty());
        assert_eq!(t.records().len(), 1);
    }

    #[test]
    fn test_removing_new_row_is_silent() {
        let mut t = table();
        t.row_focused(0);
        assert_eq!(t.row_count(), 2);

        t.row_removed(0);
        assert_eq!(t.row_count(), 1);
        assert_eq!(t.pending_removals(), 0);
    }

    #[test]
    fn test_removing_transition_row_reports_last_known_values() {
        let mut t = RecordTable::new(vec![
            seed(&[("name", "Seed"), ("age", "9")]),
            seed(&[("name", ""), ("age", "")]),
        ])
        .unwrap();

        // Row 0 existed before attach and was never serialized
        t.row_removed(0);
        let events = t.tick(Instant::now());
        assert_eq!(kinds(&events), vec![ChangeKind::Remove]);
        assert_eq!(events[0].record.get("name"), Some("Seed"));
        assert_eq!(events[0].index, 0);
    }

    #[test]
    fn test_pruning_a_recorded_row_reports_removal() {
        let mut t = table();
        t.row_focused(0);
        t.field_edited(0, "name", "Alice");

        // Edit the row back to the template defaults: the cached record is
        // updated in place, so the row now classifies as empty
        t.field_edited(0, "name", "");
        t.row_focused(1);
        let t0 = Instant::now();
        t.row_blurred(t0);

        assert!(t.tick(t0 + PRUNE_DELAY).is_empty());
        assert_eq!(t.row_count(), 1);

        // The prune queued the removal; the next tick reports it
        let events = t.tick(t0 + PRUNE_DELAY);
        assert_eq!(kinds(&events), vec![ChangeKind::Remove]);
        assert_eq!(events[0].index, 0);
    }

    #[test]
    fn test_table_never_ends_up_rowless() {
        let mut t = table();
        t.row_removed(0);
        assert_eq!(t.row_count(), 1);
        assert!(t.row(0).unwrap().is_new());
    }

    #[test]
    fn test_stale_notifications_are_ignored() {
        let mut t = table();
        t.row_removed(5);
        t.remove_triggered(5);
        t.row_focused(5);
        assert_eq!(t.row_count(), 1);
    }

    #[test]
    fn test_row_count_signal_tracks_mutations() {
        let mut t = table();
        let count = t.row_count_signal();
        assert_eq!(count.get(), 1);

        t.row_focused(0);
        assert_eq!(count.get(), 2);

        t.row_removed(0);
        assert_eq!(count.get(), 1);
    }
}
