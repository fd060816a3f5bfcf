//! Callback types for the signal system

use crate::event::StatementEvent;

/// Synchronous observer invoked for every emitted statement
pub type StatementCallback = Box<dyn Fn(&StatementEvent) + Send + Sync>;
