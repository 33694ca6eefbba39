//! Domain entities for claims, analyses, searches, sources, and
//! conversation threading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::{AnalysisStatus, ClaimStatus};

/// A user-submitted statement to be fact-checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: Uuid,
    pub user_id: Uuid,
    pub claim_text: String,
    pub context: String,
    pub language: String,
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Create a new pending claim.
    pub fn new(user_id: Uuid, claim_text: impl Into<String>, context: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            claim_text: claim_text.into(),
            context: context.into(),
            language: "english".to_string(),
            status: ClaimStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the claim language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// One analysis attempt for a claim. A claim can accumulate several over
/// re-analysis, each reaching exactly one terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    pub claim_id: Uuid,
    /// Model-estimated truthfulness, always clamped to [0,1].
    pub veracity_score: f64,
    /// Optional model confidence in the verdict, clamped to [0,1].
    pub confidence_score: Option<f64>,
    pub analysis_text: String,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Analysis {
    /// Create a new pending analysis for a claim.
    pub fn new(claim_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            claim_id,
            veracity_score: 0.0,
            confidence_score: None,
            analysis_text: String::new(),
            status: AnalysisStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One web-search tool invocation during an analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Search {
    pub id: Uuid,
    pub analysis_id: Uuid,
    /// The tool-call query the model asked for.
    pub prompt: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

impl Search {
    /// Record a tool-call query for an analysis.
    pub fn new(analysis_id: Uuid, prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            analysis_id,
            prompt: prompt.into(),
            summary: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// A single retrieved document backing an analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub search_id: Uuid,
    /// Dedup key; unique within storage.
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub domain_id: Option<Uuid>,
    /// Inherited from the owning domain at creation time; None for
    /// domains that have not been rated yet.
    pub credibility_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A website domain with a trust rating, upserted lazily the first time a
/// URL from that domain is seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: Uuid,
    /// Normalized name, unique within storage.
    pub domain_name: String,
    pub credibility_score: Option<f64>,
    pub is_reliable: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Domain {
    /// Create an unrated domain record.
    pub fn unrated(domain_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            domain_name: domain_name.into(),
            credibility_score: None,
            is_reliable: false,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Conversation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Paused,
    Completed,
}

/// A user's conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: ConversationStatus,
    pub started_at: DateTime<Utc>,
}

impl Conversation {
    /// Start a new active conversation for a user.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            status: ConversationStatus::Active,
            started_at: Utc::now(),
        }
    }
}

/// Links a claim's discussion into a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimConversation {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub claim_id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl ClaimConversation {
    /// Attach a claim discussion to a conversation.
    pub fn new(conversation_id: Uuid, claim_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            claim_id,
            started_at: Utc::now(),
        }
    }
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    User,
    Bot,
    System,
}

/// A message inside a conversation, optionally linked to a claim,
/// analysis, or claim-conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: MessageSender,
    pub content: String,
    pub claim_id: Option<Uuid>,
    pub analysis_id: Option<Uuid>,
    pub claim_conversation_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message in a conversation.
    pub fn new(conversation_id: Uuid, sender: MessageSender, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender,
            content: content.into(),
            claim_id: None,
            analysis_id: None,
            claim_conversation_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Link this message to a claim.
    pub fn with_claim(mut self, claim_id: Uuid) -> Self {
        self.claim_id = Some(claim_id);
        self
    }

    /// Link this message to an analysis.
    pub fn with_analysis(mut self, analysis_id: Uuid) -> Self {
        self.analysis_id = Some(analysis_id);
        self
    }

    /// Link this message to a claim conversation.
    pub fn with_claim_conversation(mut self, claim_conversation_id: Uuid) -> Self {
        self.claim_conversation_id = Some(claim_conversation_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_claim_is_pending() {
        let claim = Claim::new(Uuid::new_v4(), "The sky is green", "");
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert_eq!(claim.language, "english");
    }

    #[test]
    fn new_analysis_is_pending() {
        let analysis = Analysis::new(Uuid::new_v4());
        assert_eq!(analysis.status, AnalysisStatus::Pending);
        assert!(analysis.confidence_score.is_none());
    }

    #[test]
    fn message_builder_links() {
        let claim_id = Uuid::new_v4();
        let analysis_id = Uuid::new_v4();
        let msg = Message::new(Uuid::new_v4(), MessageSender::Bot, "hello")
            .with_claim(claim_id)
            .with_analysis(analysis_id);
        assert_eq!(msg.claim_id, Some(claim_id));
        assert_eq!(msg.analysis_id, Some(analysis_id));
        assert!(msg.claim_conversation_id.is_none());
    }

    #[test]
    fn sender_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MessageSender::Bot).unwrap(), "\"bot\"");
        assert_eq!(
            serde_json::to_string(&MessageSender::System).unwrap(),
            "\"system\""
        );
    }
}
