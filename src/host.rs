//! Host Module - Terminal key events → table notifications.
//!
//! The engine never owns input; the host does. [`TableCursor`] is the
//! host-side adapter for terminal applications: it keeps a (row, field)
//! cursor over an [`EditableTable`] and translates crossterm key events into
//! the engine's notification vocabulary. Pure translation: no rendering,
//! no terminal I/O.
//!
//! Key map:
//!
//! - `Tab` / `BackTab` - next / previous field, wrapping across rows
//! - `Enter` - same field, next row
//! - printable keys / `Backspace` - edit the focused field
//! - `Ctrl+D` - activate the row's remove affordance
//! - `Esc` - blur (schedules the deferred prune)
//!
//! Moving the cursor fires blur-then-focus, so last-row growth and pruning
//! fall out of the engine exactly as they do for a pointer-driven host.
//!
//! # Example
//!
//! ```ignore
//! use spark_records::{EditableTable, TableCursor, seed};
//!
//! let table = EditableTable::attach("people", vec![seed(&[("name", "")])])?;
//! let mut cursor = TableCursor::new(table.clone());
//!
//! loop {
//!     if let crossterm::event::Event::Key(key) = crossterm::event::read()? {
//!         cursor.handle_key(&key);
//!     }
//!     table.pump();
//! }
//! ```

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use unicode_segmentation::UnicodeSegmentation;

use crate::table::EditableTable;

/// Host-side (row, field) cursor translating key events into notifications.
pub struct TableCursor {
    table: EditableTable,
    fields: Vec<String>,
    row: usize,
    field: usize,
    focused: bool,
}

impl TableCursor {
    /// A cursor over `table`, initially unfocused. The first `Tab` (or an
    /// explicit [`focus_cell`](Self::focus_cell)) enters the table.
    pub fn new(table: EditableTable) -> Self {
        let fields = table.field_names();
        Self {
            table,
            fields,
            row: 0,
            field: 0,
            focused: false,
        }
    }

    /// The table this cursor drives.
    pub fn table(&self) -> &EditableTable {
        &self.table
    }

    /// Current (row, field) position while focused.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.focused.then_some((self.row, self.field))
    }

    /// Name of the currently focused field.
    pub fn field_name(&self) -> Option<&str> {
        if !self.focused {
            return None;
        }
        self.fields.get(self.field).map(String::as_str)
    }

    /// Move focus to a cell, clamping both coordinates. Fires blur on the
    /// cell being left and focus on the one being entered.
    pub fn focus_cell(&mut self, row: usize, field: usize) {
        if self.focused {
            self.table.blur();
        }
        self.row = row.min(self.table.row_count() - 1);
        self.field = field.min(self.fields.len().saturating_sub(1));
        self.focused = true;
        self.table.focus(self.row);
    }

    /// Leave the table. Fires blur, scheduling the deferred prune.
    pub fn blur(&mut self) {
        if self.focused {
            self.focused = false;
            self.table.blur();
        }
    }

    /// Route one key event. Returns true when the event was consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }
        if self.fields.is_empty() {
            return false;
        }

        if !self.focused {
            // Tab enters the table; everything else passes through
            if key.code == KeyCode::Tab {
                self.focus_cell(0, 0);
                return true;
            }
            return false;
        }

        match key.code {
            KeyCode::Tab => {
                if self.field + 1 < self.fields.len() {
                    self.focus_cell(self.row, self.field + 1);
                } else {
                    self.focus_cell(self.row + 1, 0);
                }
                true
            }
            KeyCode::BackTab => {
                if self.field > 0 {
                    self.focus_cell(self.row, self.field - 1);
                } else if self.row > 0 {
                    self.focus_cell(self.row - 1, self.fields.len() - 1);
                }
                true
            }
            KeyCode::Enter => {
                self.focus_cell(self.row + 1, self.field);
                true
            }
            KeyCode::Esc => {
                self.blur();
                true
            }
            KeyCode::Backspace => {
                let value = self.current_value();
                let graphemes: Vec<&str> = value.graphemes(true).collect();
                if !graphemes.is_empty() {
                    let shortened = graphemes[..graphemes.len() - 1].concat();
                    let name = self.fields[self.field].clone();
                    self.table.input(self.row, &name, &shortened);
                }
                true
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.table.remove_trigger(self.row);
                self.row = self.row.min(self.table.row_count() - 1);
                self.table.focus(self.row);
                true
            }
            KeyCode::Char(c) if key.modifiers.difference(KeyModifiers::SHIFT).is_empty() => {
                let mut value = self.current_value();
                value.push(c);
                let name = self.fields[self.field].clone();
                self.table.input(self.row, &name, &value);
                true
            }
            _ => false,
        }
    }

    fn current_value(&self) -> String {
        self.table
            .field_value(self.row, &self.fields[self.field])
            .unwrap_or_default()
    }
}

// =============================================================================
// TESTS
// =============================================================================
