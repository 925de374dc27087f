//! Persistence layer for the lead agent
//!
//! Provides:
//! - In-memory conversation store holding versioned JSON documents
//! - Forward migration of stored records on every read
//! - Per-phone leases serializing read-modify-write cycles
//! - Handoff sinks (tracing log, JSON-lines lead file)

pub mod error;
pub mod lease;
pub mod memory;
pub mod migration;
pub mod sinks;

pub use error::PersistenceError;
pub use lease::{KeyedStateStore, StateLease};
pub use memory::InMemoryStore;
pub use migration::{migrate, to_document};
pub use sinks::{JsonlHandoffSink, LogHandoffSink};
