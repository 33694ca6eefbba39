//! Store traits, one per responsibility.

use async_trait::async_trait;
use uuid::Uuid;

use veritas_common::Result;
use veritas_core::{
    Analysis, Claim, ClaimConversation, ClaimStatus, Conversation, Domain, Message, Search, Source,
};

/// Claim lookup and status updates.
///
/// Claims are created on submission by an upstream service; the
/// orchestrator only reads them and advances their status.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Fetch a claim by id.
    async fn get(&self, id: Uuid) -> Result<Option<Claim>>;

    /// Persist a new claim status, returning the updated claim.
    async fn update_status(&self, id: Uuid, status: ClaimStatus) -> Result<Claim>;
}

/// Analysis records.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Persist a new analysis.
    async fn create(&self, analysis: Analysis) -> Result<Analysis>;

    /// Persist an updated analysis in place.
    async fn update(&self, analysis: Analysis) -> Result<Analysis>;

    /// Fetch an analysis by id.
    async fn get(&self, id: Uuid) -> Result<Option<Analysis>>;

    /// Most recently updated completed analysis for a claim, if any.
    async fn latest_completed_for_claim(&self, claim_id: Uuid) -> Result<Option<Analysis>>;
}

/// Search records, one per tool invocation.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Persist a search record.
    async fn create(&self, search: Search) -> Result<Search>;
}

/// Source records. URL is the dedup key within storage.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Persist a source, or return the existing record when the URL is
    /// already stored (first write wins).
    async fn create(&self, source: Source) -> Result<Source>;

    /// Fetch a source by its URL.
    async fn get_by_url(&self, url: &str) -> Result<Option<Source>>;
}

/// Domain records, upserted lazily as URLs are first seen.
#[async_trait]
pub trait DomainStore: Send + Sync {
    /// Fetch the domain by normalized name, creating an unrated record if
    /// absent. The boolean is true when a record was created.
    async fn get_or_create(&self, domain_name: &str) -> Result<(Domain, bool)>;
}

/// Conversation threading for follow-up discussion.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persist a conversation.
    async fn create(&self, conversation: Conversation) -> Result<Conversation>;

    /// Fetch a conversation by id.
    async fn get(&self, id: Uuid) -> Result<Option<Conversation>>;

    /// Persist a claim-conversation link.
    async fn create_claim_conversation(
        &self,
        claim_conversation: ClaimConversation,
    ) -> Result<ClaimConversation>;

    /// Fetch a claim-conversation link by id.
    async fn get_claim_conversation(&self, id: Uuid) -> Result<Option<ClaimConversation>>;
}

/// Messages inside conversations.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message.
    async fn create(&self, message: Message) -> Result<Message>;

    /// Persist an updated message in place.
    async fn update(&self, message: Message) -> Result<Message>;

    /// The most recent `limit` messages of a claim conversation,
    /// oldest-first.
    async fn recent_for_claim_conversation(
        &self,
        claim_conversation_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Message>>;
}
