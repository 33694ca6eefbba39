//! Claim analysis orchestration for the Veritas fact-checking services.
//!
//! Runs an LLM-driven analysis loop over a claim: the model may request
//! web searches turn by turn, sources are scored and ranked, and a
//! structured verdict is extracted from the final streamed reply. The
//! same orchestrator also streams follow-up discussion over a completed
//! analysis. Progress reaches the caller as [`StreamEvent`]s from
//! `veritas-core`; every stream ends with a `done` sentinel.
//!
//! [`StreamEvent`]: veritas_core::StreamEvent

mod discussion;
pub mod orchestrator;
pub mod turn_loop;
pub mod verdict;

pub use orchestrator::{Orchestrator, OrchestratorConfig, Stores};
pub use turn_loop::MAX_NUM_TURNS;
pub use verdict::{Verdict, FALLBACK_ANALYSIS_TEXT};
