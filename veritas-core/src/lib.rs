//! Domain model for the Veritas fact-checking system.
//!
//! Defines the entities the orchestrator operates on (claims, analyses,
//! searches, sources, domains, conversation threading), the status state
//! machines that govern their lifecycle, and the stream event type that
//! carries progress to callers.

pub mod event;
pub mod model;
pub mod status;

pub use event::{AnalysisCompleted, StreamEvent};
pub use model::{
    Analysis, Claim, ClaimConversation, Conversation, ConversationStatus, Domain, Message,
    MessageSender, Search, Source,
};
pub use status::{AnalysisStatus, ClaimStatus};
