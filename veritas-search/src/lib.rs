//! Web search tool for the Veritas fact-checking services.
//!
//! Runs a search query against the Google Custom Search JSON API,
//! persists normalized source records with domain-inherited credibility,
//! and provides the aggregation used to score and rank sources.

pub mod credibility;
pub mod domain;
pub mod google;
pub mod tool;

pub use credibility::{calculate_overall_credibility, dedup_and_rank, format_sources_for_prompt};
pub use domain::normalize_domain_name;
pub use google::GoogleSearchClient;
pub use tool::SearchTool;
