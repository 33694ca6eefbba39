//! The bounded agent loop driving one claim analysis.
//!
//! Interleaves LLM turns with web searches until the model signals READY
//! or the turn cap is hit. All loop state lives in the per-call context;
//! nothing is held on the orchestrator across invocations.

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::mpsc;
use uuid::Uuid;

use veritas_common::{util::truncate_with_ellipsis, Result};
use veritas_core::{Search, Source, StreamEvent};
use veritas_llm::{prompts, ChatTurn, LlmProvider};
use veritas_search::SearchTool;
use veritas_store::SearchStore;

/// Hard cap on LLM calls per analysis.
pub const MAX_NUM_TURNS: usize = 10;

// Case-sensitive; the query runs greedily to the end of its line.
static SEARCH_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)SEARCH:\s+(.+)$").unwrap());

/// What one loop run produced.
#[derive(Debug)]
pub struct LoopOutcome {
    /// Full transcript, ready for the verdict instruction to be appended.
    pub transcript: Vec<ChatTurn>,
    /// Every source accumulated across all tool calls, in call order.
    pub sources: Vec<Source>,
    /// Whether the model signalled READY (vs. turn exhaustion).
    pub ready: bool,
}

/// One analysis turn loop. Built fresh per orchestration call.
pub struct TurnLoop<'a> {
    pub llm: &'a dyn LlmProvider,
    pub search: &'a dyn SearchTool,
    pub searches: &'a dyn SearchStore,
    pub temperature: f64,
    pub num_results: u8,
}

impl TurnLoop<'_> {
    /// Run the loop for a claim, streaming progress into `events`.
    pub async fn run(
        &self,
        analysis_id: Uuid,
        claim_text: &str,
        context: &str,
        events: &mpsc::Sender<StreamEvent>,
    ) -> Result<LoopOutcome> {
        let mut transcript = vec![ChatTurn::system(prompts::analysis_system_prompt(
            claim_text, context,
        ))];
        let mut sources: Vec<Source> = Vec::new();
        let mut ready = false;

        for turn in 0..MAX_NUM_TURNS {
            let response = self.llm.generate_response(&transcript, self.temperature).await?;

            if let Some(caps) = SEARCH_MARKER_RE.captures(&response.text) {
                let query = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
                let marker_end = caps.get(0).map(|m| m.end()).unwrap_or(response.text.len());
                tracing::debug!(turn, query, "tool call requested");

                // Keep only the assistant content up to and including the query.
                transcript.push(ChatTurn::assistant(&response.text[..marker_end]));

                let _ = events
                    .send(StreamEvent::status(format!("Searching the web: {query}")))
                    .await;

                let search = self.searches.create(Search::new(analysis_id, query)).await?;
                let found = self
                    .search
                    .search_and_create_sources(query, search.id, self.num_results)
                    .await?;

                transcript.push(ChatTurn::user(format!(
                    "{} {}",
                    prompts::SEARCH_RESULT_PREFIX,
                    veritas_search::format_sources_for_prompt(&found),
                )));
                sources.extend(found);
                continue;
            }

            if response.text.trim().eq_ignore_ascii_case("READY") {
                tracing::debug!(turn, "model signalled READY");
                ready = true;
                break;
            }

            tracing::debug!(
                turn,
                preview = %truncate_with_ellipsis(&response.text, 80),
                "plain assistant turn"
            );
            transcript.push(ChatTurn::assistant(response.text));
        }

        if !ready {
            // Preserved behavior: proceed to verdict extraction on whatever
            // transcript exists rather than failing the analysis.
            tracing::warn!(analysis_id = %analysis_id, "turn cap reached without READY signal");
        }

        Ok(LoopOutcome {
            transcript,
            sources,
            ready,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use veritas_common::Error;
    use veritas_llm::{ChunkReceiver, LlmResponse, Role};
    use veritas_store::MemoryStore;

    /// Provider that replays a fixed script of responses.
    struct ScriptedProvider {
        script: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(script: Vec<&str>) -> Self {
            let mut script: Vec<String> = script.into_iter().map(String::from).collect();
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate_response(
            &self,
            _messages: &[ChatTurn],
            _temperature: f64,
        ) -> Result<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop();
            match next {
                Some(text) => Ok(LlmResponse::from_text(text)),
                None => Err(Error::Provider("script exhausted".into())),
            }
        }

        async fn generate_stream(
            &self,
            _messages: &[ChatTurn],
            _temperature: f64,
        ) -> Result<ChunkReceiver> {
            unimplemented!("loop tests never stream")
        }
    }

    /// Search tool returning canned sources per call.
    struct StubSearch {
        per_call: Vec<Vec<Source>>,
        calls: AtomicUsize,
    }

    impl StubSearch {
        fn new(per_call: Vec<Vec<Source>>) -> Self {
            Self {
                per_call,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SearchTool for StubSearch {
        async fn search_and_create_sources(
            &self,
            _query: &str,
            search_id: Uuid,
            _num_results: u8,
        ) -> Result<Vec<Source>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let mut sources = self.per_call.get(call).cloned().unwrap_or_default();
            for s in &mut sources {
                s.search_id = search_id;
            }
            Ok(sources)
        }
    }

    fn source(url: &str, credibility: Option<f64>) -> Source {
        let now = Utc::now();
        Source {
            id: Uuid::new_v4(),
            search_id: Uuid::new_v4(),
            url: url.into(),
            title: url.into(),
            snippet: String::new(),
            domain_id: None,
            credibility_score: credibility,
            created_at: now,
            updated_at: now,
        }
    }

    async fn run_loop(
        provider: &ScriptedProvider,
        search: &StubSearch,
    ) -> (LoopOutcome, Vec<StreamEvent>) {
        let store = MemoryStore::new();
        let (tx, mut rx) = mpsc::channel(64);
        let turn_loop = TurnLoop {
            llm: provider,
            search,
            searches: &store,
            temperature: 0.7,
            num_results: 5,
        };
        let outcome = turn_loop
            .run(Uuid::new_v4(), "The sky is green", "", &tx)
            .await
            .unwrap();
        drop(tx);
        let mut events = Vec::new();
        while let Some(e) = rx.recv().await {
            events.push(e);
        }
        (outcome, events)
    }

    #[tokio::test]
    async fn ready_terminates_without_tool_calls() {
        let provider = ScriptedProvider::new(vec!["ready"]);
        let search = StubSearch::new(vec![]);
        let (outcome, _) = run_loop(&provider, &search).await;

        assert!(outcome.ready);
        assert_eq!(provider.calls(), 1);
        assert_eq!(search.calls(), 0);
        // Nothing appended after the system seed.
        assert_eq!(outcome.transcript.len(), 1);
        assert_eq!(outcome.transcript[0].role, Role::System);
    }

    #[tokio::test]
    async fn search_marker_truncates_and_feeds_results_back() {
        let provider = ScriptedProvider::new(vec![
            "Let me check.\nSEARCH: sky color facts\nignored trailing thoughts",
            "READY",
        ]);
        let search = StubSearch::new(vec![vec![source("https://a.com", Some(0.8))]]);
        let (outcome, events) = run_loop(&provider, &search).await;

        assert!(outcome.ready);
        assert_eq!(search.calls(), 1);
        assert_eq!(outcome.sources.len(), 1);

        // assistant turn truncated at the end of the query line
        assert_eq!(outcome.transcript[1].role, Role::Assistant);
        assert_eq!(
            outcome.transcript[1].content,
            "Let me check.\nSEARCH: sky color facts"
        );
        // tool result came back as a user turn
        assert_eq!(outcome.transcript[2].role, Role::User);
        assert!(outcome.transcript[2].content.starts_with("Search result:"));
        assert!(outcome.transcript[2].content.contains("https://a.com"));

        assert!(events.iter().any(|e| matches!(
            e,
            StreamEvent::Status { content } if content.contains("sky color facts")
        )));
    }

    #[tokio::test]
    async fn loop_caps_at_ten_llm_calls() {
        // Model asks for a search every single turn and never says READY.
        let provider = ScriptedProvider::new(vec!["SEARCH: again"; 10]);
        let search = StubSearch::new(vec![Vec::new(); 10]);
        let (outcome, _) = run_loop(&provider, &search).await;

        assert!(!outcome.ready);
        assert_eq!(provider.calls(), MAX_NUM_TURNS);
        assert_eq!(search.calls(), MAX_NUM_TURNS);
    }

    #[tokio::test]
    async fn search_is_case_sensitive_and_ready_is_not() {
        // Lowercase marker is not a tool call; it lands as a plain turn.
        let provider = ScriptedProvider::new(vec!["search: not a marker", "ReAdY"]);
        let search = StubSearch::new(vec![]);
        let (outcome, _) = run_loop(&provider, &search).await;

        assert!(outcome.ready);
        assert_eq!(search.calls(), 0);
        assert_eq!(outcome.transcript[1].content, "search: not a marker");
    }

    #[tokio::test]
    async fn provider_error_aborts_the_loop() {
        let provider = ScriptedProvider::new(vec![]);
        let search = StubSearch::new(vec![]);
        let store = MemoryStore::new();
        let (tx, _rx) = mpsc::channel(8);
        let turn_loop = TurnLoop {
            llm: &provider,
            search: &search,
            searches: &store,
            temperature: 0.7,
            num_results: 5,
        };
        let err = turn_loop
            .run(Uuid::new_v4(), "claim", "", &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }
}
