//! The analysis orchestrator.
//!
//! Drives one claim through the full pipeline: ownership and state checks,
//! the bounded search loop, source aggregation, verdict extraction, status
//! finalization, and discussion thread setup. Progress streams to the
//! caller as events; every stream ends with exactly one `done` sentinel.

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use veritas_common::{util::truncate_with_ellipsis, Error, Result, Settings};
use veritas_core::{
    Analysis, AnalysisCompleted, AnalysisStatus, Claim, ClaimConversation, ClaimStatus,
    Conversation, Message, MessageSender, Source, StreamEvent,
};
use veritas_llm::{prompts, ChatTurn, LlmProvider};
use veritas_search::{calculate_overall_credibility, dedup_and_rank, SearchTool};
use veritas_store::{
    AnalysisStore, ClaimStore, ConversationStore, MemoryStore, MessageStore, SearchStore,
};

use crate::discussion;
use crate::turn_loop::TurnLoop;
use crate::verdict;

/// Buffer size for event channels handed to callers.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The persistence ports the orchestrator works against.
#[derive(Clone)]
pub struct Stores {
    pub claims: Arc<dyn ClaimStore>,
    pub analyses: Arc<dyn AnalysisStore>,
    pub searches: Arc<dyn SearchStore>,
    pub conversations: Arc<dyn ConversationStore>,
    pub messages: Arc<dyn MessageStore>,
}

impl Stores {
    /// Wire every port to one shared in-memory backend.
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            claims: store.clone(),
            analyses: store.clone(),
            searches: store.clone(),
            conversations: store.clone(),
            messages: store,
        }
    }
}

/// Tunables the orchestrator reads per run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub temperature: f64,
    pub num_results: u8,
    pub history_window: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            num_results: 5,
            history_window: 10,
        }
    }
}

impl From<&Settings> for OrchestratorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            temperature: settings.llm.temperature,
            num_results: settings.search.num_results,
            history_window: settings.analysis.history_window,
        }
    }
}

/// Claim analysis and discussion orchestrator.
#[derive(Clone)]
pub struct Orchestrator {
    llm: Arc<dyn LlmProvider>,
    search: Arc<dyn SearchTool>,
    stores: Stores,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchTool>,
        stores: Stores,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            llm,
            search,
            stores,
            config,
        }
    }

    /// Analyze a claim, streaming progress events to the returned receiver.
    ///
    /// The stream always terminates with `done`, preceded by exactly one
    /// `error` event when the run failed.
    pub fn analyze_claim_stream(&self, claim_id: Uuid, user_id: Uuid) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(err) = this.run_analysis(claim_id, user_id, &tx).await {
                tracing::error!(claim_id = %claim_id, error = %err, "claim analysis failed");
                let _ = tx.send(StreamEvent::error(err.to_string())).await;
            }
            let _ = tx.send(StreamEvent::Done).await;
        });
        rx
    }

    /// Analyze a claim without streaming, returning the completed analysis
    /// and its ranked sources.
    pub async fn analyze_claim_direct(
        &self,
        claim_id: Uuid,
        user_id: Uuid,
    ) -> Result<(Analysis, Vec<Source>)> {
        // Events still flow internally; a drain task keeps the loop from
        // blocking on a full channel.
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });
        let result = self.run_analysis(claim_id, user_id, &tx).await;
        drop(tx);
        let _ = drain.await;
        result
    }

    /// Stream a follow-up discussion turn about a completed analysis.
    pub fn stream_claim_discussion(
        &self,
        conversation_id: Uuid,
        claim_conversation_id: Uuid,
        user_id: Uuid,
        user_text: impl Into<String>,
    ) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let this = self.clone();
        let user_text = user_text.into();
        tokio::spawn(async move {
            let outcome = discussion::stream_reply(
                this.llm.as_ref(),
                &this.stores,
                this.config.history_window,
                this.config.temperature,
                conversation_id,
                claim_conversation_id,
                user_id,
                &user_text,
                &tx,
            )
            .await;
            if let Err(err) = outcome {
                tracing::error!(
                    claim_conversation_id = %claim_conversation_id,
                    error = %err,
                    "discussion turn failed"
                );
                let _ = tx.send(StreamEvent::error(err.to_string())).await;
            }
            let _ = tx.send(StreamEvent::Done).await;
        });
        rx
    }

    /// One full analysis run.
    ///
    /// Precondition failures (unknown claim, wrong owner, claim not pending)
    /// return before any state is written. Once the analysis record exists,
    /// failures finalize the claim as rejected and the analysis as failed.
    async fn run_analysis(
        &self,
        claim_id: Uuid,
        user_id: Uuid,
        events: &mpsc::Sender<StreamEvent>,
    ) -> Result<(Analysis, Vec<Source>)> {
        let claim = self
            .stores
            .claims
            .get(claim_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("claim {claim_id} not found")))?;
        if claim.user_id != user_id {
            return Err(Error::NotAuthorized(
                "claim belongs to a different user".into(),
            ));
        }
        claim.status.ensure_transition(ClaimStatus::Analyzing)?;

        let claim = self
            .stores
            .claims
            .update_status(claim_id, ClaimStatus::Analyzing)
            .await?;
        let _ = events.send(StreamEvent::status("Analyzing claim...")).await;
        tracing::info!(
            claim_id = %claim_id,
            claim = %truncate_with_ellipsis(&claim.claim_text, 80),
            "starting analysis"
        );

        let analysis = self.stores.analyses.create(Analysis::new(claim_id)).await?;

        match self.run_analysis_inner(&claim, analysis.clone(), events).await {
            Ok(done) => Ok(done),
            Err(err) => {
                self.finalize_failure(claim_id, analysis.id).await;
                Err(err)
            }
        }
    }

    async fn run_analysis_inner(
        &self,
        claim: &Claim,
        mut analysis: Analysis,
        events: &mpsc::Sender<StreamEvent>,
    ) -> Result<(Analysis, Vec<Source>)> {
        analysis.status = AnalysisStatus::Processing;
        analysis = self.stores.analyses.update(analysis).await?;

        let turn_loop = TurnLoop {
            llm: self.llm.as_ref(),
            search: self.search.as_ref(),
            searches: self.stores.searches.as_ref(),
            temperature: self.config.temperature,
            num_results: self.config.num_results,
        };
        let outcome = turn_loop
            .run(analysis.id, &claim.claim_text, &claim.context, events)
            .await?;

        if outcome.sources.is_empty() {
            let _ = events
                .send(StreamEvent::status(
                    "No sources found; judging on model knowledge alone",
                ))
                .await;
        } else {
            let overall = calculate_overall_credibility(&outcome.sources);
            let _ = events
                .send(StreamEvent::status(format!(
                    "Found {} sources, overall credibility {overall:.2}",
                    outcome.sources.len()
                )))
                .await;
        }
        let sources = dedup_and_rank(outcome.sources);

        let mut transcript = outcome.transcript;
        transcript.push(ChatTurn::user(prompts::verdict_instruction()));
        let raw = self.stream_verdict(&transcript, events).await?;
        let verdict = verdict::parse(&raw)?;

        analysis.veracity_score = verdict.veracity_score;
        analysis.confidence_score = verdict.confidence_score;
        analysis.analysis_text = verdict.analysis_text;
        analysis.status = AnalysisStatus::Completed;
        let analysis = self.stores.analyses.update(analysis).await?;
        self.stores
            .claims
            .update_status(claim.id, ClaimStatus::Analyzed)
            .await?;
        tracing::info!(
            claim_id = %claim.id,
            analysis_id = %analysis.id,
            veracity = analysis.veracity_score,
            sources = sources.len(),
            "analysis completed"
        );

        let thread = self.init_discussion_thread(claim, &analysis).await?;
        let _ = events
            .send(StreamEvent::AnalysisComplete {
                content: AnalysisCompleted {
                    analysis_id: analysis.id,
                    veracity_score: analysis.veracity_score,
                    confidence_score: analysis.confidence_score,
                    conversation_id: Some(thread.conversation_id),
                    claim_conversation_id: Some(thread.id),
                },
            })
            .await;

        Ok((analysis, sources))
    }

    /// Collect the streamed verdict into one raw string, forwarding chunks
    /// as content events.
    async fn stream_verdict(
        &self,
        transcript: &[ChatTurn],
        events: &mpsc::Sender<StreamEvent>,
    ) -> Result<String> {
        let mut chunks = self
            .llm
            .generate_stream(transcript, self.config.temperature)
            .await?;
        let mut raw = String::new();
        while let Some(chunk) = chunks.recv().await {
            let chunk = chunk?;
            if chunk.is_complete {
                break;
            }
            raw.push_str(&chunk.text);
            let _ = events.send(StreamEvent::content(chunk.text)).await;
        }
        Ok(raw)
    }

    /// Seed the follow-up thread for a completed analysis: the claim as the
    /// opening user message, the verdict text as the first bot reply.
    async fn init_discussion_thread(
        &self,
        claim: &Claim,
        analysis: &Analysis,
    ) -> Result<ClaimConversation> {
        let conversation = self
            .stores
            .conversations
            .create(Conversation::new(claim.user_id))
            .await?;
        let thread = self
            .stores
            .conversations
            .create_claim_conversation(ClaimConversation::new(conversation.id, claim.id))
            .await?;
        self.stores
            .messages
            .create(
                Message::new(conversation.id, MessageSender::User, &claim.claim_text)
                    .with_claim(claim.id)
                    .with_claim_conversation(thread.id),
            )
            .await?;
        self.stores
            .messages
            .create(
                Message::new(conversation.id, MessageSender::Bot, &analysis.analysis_text)
                    .with_claim(claim.id)
                    .with_analysis(analysis.id)
                    .with_claim_conversation(thread.id),
            )
            .await?;
        Ok(thread)
    }

    /// Best-effort terminal statuses after a mid-run failure. Storage errors
    /// here are logged, not propagated, so the original failure survives.
    async fn finalize_failure(&self, claim_id: Uuid, analysis_id: Uuid) {
        if let Err(err) = self
            .stores
            .claims
            .update_status(claim_id, ClaimStatus::Rejected)
            .await
        {
            tracing::error!(claim_id = %claim_id, error = %err, "failed to reject claim");
        }
        match self.stores.analyses.get(analysis_id).await {
            Ok(Some(mut analysis)) => {
                analysis.status = AnalysisStatus::Failed;
                if let Err(err) = self.stores.analyses.update(analysis).await {
                    tracing::error!(analysis_id = %analysis_id, error = %err, "failed to fail analysis");
                }
            }
            Ok(None) => {
                tracing::error!(analysis_id = %analysis_id, "analysis vanished during failure handling");
            }
            Err(err) => {
                tracing::error!(analysis_id = %analysis_id, error = %err, "failed to load analysis");
            }
        }
    }
}
