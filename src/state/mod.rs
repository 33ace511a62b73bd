//! State Module - Reactive table state and notifications.
//!
//! - **Events** - typed per-kind handler registry, last-change signal

mod events;

pub use events::*;
