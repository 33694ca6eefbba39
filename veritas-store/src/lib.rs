//! Persistence ports for the Veritas orchestrator.
//!
//! Each responsibility gets its own narrow async trait so tests and
//! embedders can substitute backends independently. Relational storage
//! itself is an external collaborator; this crate ships only the port
//! definitions and an in-memory backend.

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::{
    AnalysisStore, ClaimStore, ConversationStore, DomainStore, MessageStore, SearchStore,
    SourceStore,
};
