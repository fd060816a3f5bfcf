//! Convenience re-exports for common signal-system usage

pub use crate::event::{StatementEvent, StatementKind};
pub use crate::manager::SignalManager;
pub use crate::types::StatementCallback;
