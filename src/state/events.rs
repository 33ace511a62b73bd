//! Events Module - Typed notification registry.
//!
//! The table's event stream is a typed interface: one registration call per
//! event kind instead of stringly-named topics. Handlers are id-tagged so
//! each registration returns a cleanup closure that unregisters exactly that
//! handler.
//!
//! # API
//!
//! - `on_kind(kind, handler)` - a specific transition kind
//! - `on_change(handler)` - every transition, with its [`ChangeKind`]
//! - `emit(event)` - publish one event to cell and handlers
//! - `last_change` - reactive cell holding the most recent event
//!
//! # Example
//!
//! ```ignore
//! use spark_records::EditableTable;
//!
//! let table = EditableTable::new(vec![/* rows */])?;
//! let cleanup = table.on_add(|record, index| {
//!     println!("row {} became {:?}", index, record.get("name"));
//! });
//!
//! // ... later
//! cleanup();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use spark_signals::{Signal, signal};

use crate::types::{ChangeKind, Record, RecordEvent};

// =============================================================================
// TYPES
// =============================================================================

/// Handler for one event kind.
pub type RecordHandler = Box<dyn Fn(&Record, usize)>;

/// Handler for the generic change stream.
pub type ChangeHandler = Box<dyn Fn(ChangeKind, &Record, usize)>;

/// Unregisters the handler a registration call installed.
pub type Cleanup = Box<dyn FnOnce()>;

#[derive(Default)]
struct Handlers {
    add: Vec<(usize, RecordHandler)>,
    update: Vec<(usize, RecordHandler)>,
    remove: Vec<(usize, RecordHandler)>,
    change: Vec<(usize, ChangeHandler)>,
    next_id: usize,
}

impl Handlers {
    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn kind_slot(&mut self, kind: ChangeKind) -> &mut Vec<(usize, RecordHandler)> {
        match kind {
            ChangeKind::Add => &mut self.add,
            ChangeKind::Update => &mut self.update,
            ChangeKind::Remove => &mut self.remove,
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Per-table event registry. Handler storage is shared, so cleanup closures
/// stay valid however the registry handle itself is moved or cloned.
pub struct EventRegistry {
    handlers: Rc<RefCell<Handlers>>,
    last_change: Signal<Option<RecordEvent>>,
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry").finish_non_exhaustive()
    }
}

impl EventRegistry {
    pub fn new() -> Self {
        Self {
            handlers: Rc::new(RefCell::new(Handlers::default())),
            last_change: signal(None),
        }
    }

    /// Register a handler for one specific event kind.
    pub fn on_kind(&self, kind: ChangeKind, handler: impl Fn(&Record, usize) + 'static) -> Cleanup {
        let id = {
            let mut handlers = self.handlers.borrow_mut();
            let id = handlers.next_id();
            handlers.kind_slot(kind).push((id, Box::new(handler)));
            id
        };

        let handlers = Rc::clone(&self.handlers);
        Box::new(move || {
            handlers.borrow_mut().kind_slot(kind).retain(|(h, _)| *h != id);
        })
    }

    /// Register a handler for the generic change stream.
    pub fn on_change(&self, handler: impl Fn(ChangeKind, &Record, usize) + 'static) -> Cleanup {
        let id = {
            let mut handlers = self.handlers.borrow_mut();
            let id = handlers.next_id();
            handlers.change.push((id, Box::new(handler)));
            id
        };

        let handlers = Rc::clone(&self.handlers);
        Box::new(move || {
            handlers.borrow_mut().change.retain(|(h, _)| *h != id);
        })
    }

    /// Publish one event: update the reactive cell, then the generic change
    /// handlers, then the kind-specific handlers (the host API's order).
    pub fn emit(&self, event: &RecordEvent) {
        self.last_change.set(Some(event.clone()));

        let handlers = self.handlers.borrow();
        for (_, handler) in &handlers.change {
            handler(event.kind, &event.record, event.index);
        }
        let kind_handlers = match event.kind {
            ChangeKind::Add => &handlers.add,
            ChangeKind::Update => &handlers.update,
            ChangeKind::Remove => &handlers.remove,
        };
        for (_, handler) in kind_handlers {
            handler(&event.record, event.index);
        }
    }

    /// The most recent event, if any.
    pub fn last_change(&self) -> Option<RecordEvent> {
        self.last_change.get()
    }

    /// Reactive cell holding the most recent event.
    pub fn last_change_signal(&self) -> Signal<Option<RecordEvent>> {
        self.last_change.clone()
    }

    /// Total registered handlers across all kinds.
    pub fn handler_count(&self) -> usize {
        let handlers = self.handlers.borrow();
        handlers.add.len() + handlers.update.len() + handlers.remove.len() + handlers.change.len()
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
