//! Signal system for statement observation
//!
//! Every statement the engine sends to the database is announced here
//! before it runs. Subscribers only observe; they cannot alter or veto
//! execution.

pub mod event;
pub mod manager;
pub mod prelude;
pub mod types;

pub use event::{StatementEvent, StatementKind};
pub use manager::SignalManager;
pub use types::StatementCallback;
