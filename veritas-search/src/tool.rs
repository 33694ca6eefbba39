//! Search tool trait.

use async_trait::async_trait;
use uuid::Uuid;

use veritas_common::Result;
use veritas_core::Source;

/// Cap on results per search call, enforced by the Custom Search API.
pub const MAX_RESULTS_PER_SEARCH: u8 = 10;

/// Web search tool interface.
///
/// Implementations execute the query, persist normalized source records
/// attributed to `search_id`, and return them with credibility inherited
/// from each source's domain.
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Run a search and persist its sources.
    async fn search_and_create_sources(
        &self,
        query: &str,
        search_id: Uuid,
        num_results: u8,
    ) -> Result<Vec<Source>>;
}
