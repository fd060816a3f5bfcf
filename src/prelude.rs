//! Convenience re-exports for common Nordic usage
//!
//! ```rust
//! use nordic::prelude::*;
//! ```

pub use crate::core::{Nordic, NordicBuilder};
pub use crate::entity::{Entity, EntityDescriptor, EntityIdentifier};
pub use crate::errors::{NordicError, NordicResult};
pub use crate::row;

pub use config::{AppConfig, DatabaseConfig, EngineConfig, KeyCase, TimestampPolicy};

pub use table_access::prelude::*;

pub use signal_system::prelude::*;

pub use entity_derive::Entity;
