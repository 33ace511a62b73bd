//! Property tests for the row lifecycle state machine.
//!
//! Random notification scripts are thrown at a table and the structural
//! invariants are checked after every step: the table never runs out of
//! rows, untouched rows never surface as records, the reactive row count
//! never drifts, and a single row's event sequence follows
//! `add` → (`update`)* → `remove`.

use std::time::{Duration, Instant};

use proptest::prelude::*;

use spark_records::{ChangeKind, PRUNE_DELAY, Record, RecordEvent, RecordTable, seed};

#[derive(Clone, Debug)]
enum Op {
    Focus(usize),
    Input(usize, bool, String),
    Blur,
    Tick(u64),
    RemoveTrigger(usize),
    RowRemoved(usize),
    AddRecord(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..8).prop_map(Op::Focus),
        ((0usize..8), any::<bool>(), "[a-c ]{0,4}").prop_map(|(i, f, v)| Op::Input(i, f, v)),
        Just(Op::Blur),
        (0u64..200).prop_map(Op::Tick),
        (0usize..8).prop_map(Op::RemoveTrigger),
        (0usize..8).prop_map(Op::RowRemoved),
        "[a-c]{1,4}".prop_map(Op::AddRecord),
    ]
}

fn new_table() -> RecordTable {
    RecordTable::new(vec![seed(&[("name", ""), ("age", "")])]).unwrap()
}

fn apply(table: &mut RecordTable, op: &Op, now: &mut Instant) -> Vec<RecordEvent> {
    match op {
        Op::Focus(index) => {
            table.row_focused(*index);
            Vec::new()
        }
        Op::Input(index, second_field, value) => {
            let field = if *second_field { "age" } else { "name" };
            table.field_edited(*index, field, value)
        }
        Op::Blur => {
            table.row_blurred(*now);
            Vec::new()
        }
        Op::Tick(advance_ms) => {
            *now += Duration::from_millis(*advance_ms);
            table.tick(*now)
        }
        Op::RemoveTrigger(index) => {
            table.remove_triggered(*index);
            Vec::new()
        }
        Op::RowRemoved(index) => {
            table.row_removed(*index);
            Vec::new()
        }
        Op::AddRecord(name) => {
            table.add_record(Record::from_pairs([("name", name.as_str())]), None);
            Vec::new()
        }
    }
}

proptest! {
    /// Structural invariants hold after every single step.
    #[test]
    fn structure_survives_any_script(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut table = new_table();
        let count = table.row_count_signal();
        let mut now = Instant::now();

        for op in &ops {
            apply(&mut table, op, &mut now);

            // Never rowless; the reactive count never drifts
            prop_assert!(table.row_count() >= 1);
            prop_assert_eq!(count.get(), table.row_count());

            // The entry row never surfaces as a record
            let visible = table.row_count();
            prop_assert!(table.records().len() < visible);
        }
    }

    /// Rows that were never edited never surface through `records()`.
    #[test]
    fn untouched_rows_never_surface(focus_hops in prop::collection::vec(0usize..6, 0..12)) {
        let mut table = new_table();
        for index in focus_hops {
            table.row_focused(index);
        }
        prop_assert!(table.records().is_empty());
    }

    /// A single edited row emits `add` exactly once, then only `update`s.
    #[test]
    fn single_row_event_grammar(values in prop::collection::vec("[a-d]{0,3}", 1..15)) {
        let mut table = new_table();
        table.row_focused(0);

        let mut kinds = Vec::new();
        for value in &values {
            for event in table.field_edited(0, "name", value) {
                kinds.push(event.kind);
            }
        }

        prop_assert_eq!(kinds[0], ChangeKind::Add);
        prop_assert!(kinds[1..].iter().all(|k| *k == ChangeKind::Update));
        prop_assert_eq!(kinds.len(), values.len());
    }

    /// Removal notifications arrive exactly once, on the tick after the
    /// removal, regardless of what was focused before.
    #[test]
    fn removal_notifies_exactly_once(prefix in prop::collection::vec(0usize..4, 0..6)) {
        let mut table = new_table();
        for index in prefix {
            table.row_focused(index);
        }
        table.row_focused(0);
        table.field_edited(0, "name", "x");
        table.remove_triggered(0);

        let now = Instant::now();
        let first: Vec<ChangeKind> = table.tick(now).iter().map(|e| e.kind).collect();
        prop_assert_eq!(first, vec![ChangeKind::Remove]);
        prop_assert!(table.tick(now).is_empty());
    }

    /// Whatever happened before, a quiet table drains in at most two ticks:
    /// one to run the deferred prune, one to flush the removals it queued.
    #[test]
    fn quiet_tables_drain(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut table = new_table();
        let mut now = Instant::now();
        for op in &ops {
            apply(&mut table, op, &mut now);
        }

        now += PRUNE_DELAY;
        table.tick(now);
        table.tick(now);
        prop_assert!(table.tick(now).is_empty());
        prop_assert!(!table.has_pending_prune());
        prop_assert_eq!(table.pending_removals(), 0);
    }
}
