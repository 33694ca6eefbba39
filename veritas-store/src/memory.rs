//! In-memory store backend.
//!
//! Backs every port with `RwLock`-guarded maps. Used by tests and by
//! embedders that don't need durable storage.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use veritas_common::{Error, Result};
use veritas_core::{
    Analysis, AnalysisStatus, Claim, ClaimConversation, ClaimStatus, Conversation, Domain, Message,
    Search, Source,
};

use crate::traits::{
    AnalysisStore, ClaimStore, ConversationStore, DomainStore, MessageStore, SearchStore,
    SourceStore,
};

/// In-memory backend implementing every store port.
#[derive(Default)]
pub struct MemoryStore {
    claims: RwLock<HashMap<Uuid, Claim>>,
    analyses: RwLock<HashMap<Uuid, Analysis>>,
    searches: RwLock<HashMap<Uuid, Search>>,
    sources: RwLock<HashMap<Uuid, Source>>,
    // url -> source id, enforcing URL uniqueness
    source_urls: RwLock<HashMap<String, Uuid>>,
    // normalized name -> domain
    domains: RwLock<HashMap<String, Domain>>,
    conversations: RwLock<HashMap<Uuid, Conversation>>,
    claim_conversations: RwLock<HashMap<Uuid, ClaimConversation>>,
    messages: RwLock<HashMap<Uuid, Message>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a claim, as the upstream submission service would.
    pub async fn insert_claim(&self, claim: Claim) -> Claim {
        self.claims.write().await.insert(claim.id, claim.clone());
        claim
    }

    /// Seed a rated domain, as a curation pipeline would.
    pub async fn insert_domain(&self, domain: Domain) -> Domain {
        self.domains
            .write()
            .await
            .insert(domain.domain_name.clone(), domain.clone());
        domain
    }

    /// Messages in a conversation, oldest-first. Test/debug helper.
    pub async fn conversation_messages(&self, conversation_id: Uuid) -> Vec<Message> {
        let mut msgs: Vec<Message> = self
            .messages
            .read()
            .await
            .values()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        msgs.sort_by_key(|m| m.timestamp);
        msgs
    }
}

#[async_trait]
impl ClaimStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Claim>> {
        Ok(self.claims.read().await.get(&id).cloned())
    }

    async fn update_status(&self, id: Uuid, status: ClaimStatus) -> Result<Claim> {
        let mut claims = self.claims.write().await;
        let claim = claims
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("claim {id}")))?;
        claim.status = status;
        claim.updated_at = Utc::now();
        Ok(claim.clone())
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn create(&self, analysis: Analysis) -> Result<Analysis> {
        self.analyses
            .write()
            .await
            .insert(analysis.id, analysis.clone());
        Ok(analysis)
    }

    async fn update(&self, mut analysis: Analysis) -> Result<Analysis> {
        let mut analyses = self.analyses.write().await;
        if !analyses.contains_key(&analysis.id) {
            return Err(Error::NotFound(format!("analysis {}", analysis.id)));
        }
        analysis.updated_at = Utc::now();
        analyses.insert(analysis.id, analysis.clone());
        Ok(analysis)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Analysis>> {
        Ok(self.analyses.read().await.get(&id).cloned())
    }

    async fn latest_completed_for_claim(&self, claim_id: Uuid) -> Result<Option<Analysis>> {
        let analyses = self.analyses.read().await;
        let latest = analyses
            .values()
            .filter(|a| a.claim_id == claim_id && a.status == AnalysisStatus::Completed)
            .max_by_key(|a| a.updated_at)
            .cloned();
        Ok(latest)
    }
}

#[async_trait]
impl SearchStore for MemoryStore {
    async fn create(&self, search: Search) -> Result<Search> {
        self.searches.write().await.insert(search.id, search.clone());
        Ok(search)
    }
}

#[async_trait]
impl SourceStore for MemoryStore {
    async fn create(&self, source: Source) -> Result<Source> {
        let mut urls = self.source_urls.write().await;
        if let Some(existing_id) = urls.get(&source.url) {
            // First write wins; hand back the stored record.
            let sources = self.sources.read().await;
            return sources
                .get(existing_id)
                .cloned()
                .ok_or_else(|| Error::Storage(format!("dangling url index for {}", source.url)));
        }
        urls.insert(source.url.clone(), source.id);
        self.sources.write().await.insert(source.id, source.clone());
        Ok(source)
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<Source>> {
        let urls = self.source_urls.read().await;
        let Some(id) = urls.get(url) else {
            return Ok(None);
        };
        Ok(self.sources.read().await.get(id).cloned())
    }
}

#[async_trait]
impl DomainStore for MemoryStore {
    async fn get_or_create(&self, domain_name: &str) -> Result<(Domain, bool)> {
        let mut domains = self.domains.write().await;
        if let Some(domain) = domains.get(domain_name) {
            return Ok((domain.clone(), false));
        }
        let domain = Domain::unrated(domain_name);
        domains.insert(domain_name.to_string(), domain.clone());
        Ok((domain, true))
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create(&self, conversation: Conversation) -> Result<Conversation> {
        self.conversations
            .write()
            .await
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.conversations.read().await.get(&id).cloned())
    }

    async fn create_claim_conversation(
        &self,
        claim_conversation: ClaimConversation,
    ) -> Result<ClaimConversation> {
        self.claim_conversations
            .write()
            .await
            .insert(claim_conversation.id, claim_conversation.clone());
        Ok(claim_conversation)
    }

    async fn get_claim_conversation(&self, id: Uuid) -> Result<Option<ClaimConversation>> {
        Ok(self.claim_conversations.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create(&self, message: Message) -> Result<Message> {
        self.messages.write().await.insert(message.id, message.clone());
        Ok(message)
    }

    async fn update(&self, message: Message) -> Result<Message> {
        let mut messages = self.messages.write().await;
        if !messages.contains_key(&message.id) {
            return Err(Error::NotFound(format!("message {}", message.id)));
        }
        messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn recent_for_claim_conversation(
        &self,
        claim_conversation_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let messages = self.messages.read().await;
        let mut matching: Vec<Message> = messages
            .values()
            .filter(|m| m.claim_conversation_id == Some(claim_conversation_id))
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.timestamp);
        if matching.len() > limit {
            matching.drain(..matching.len() - limit);
        }
        Ok(matching)
    }
}
