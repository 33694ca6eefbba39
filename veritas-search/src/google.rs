//! Google Custom Search client.
//!
//! Executes queries against the Custom Search JSON API and turns result
//! items into persisted `Source` records with credibility inherited from
//! their domain. API-level failures degrade to an empty result set rather
//! than aborting the analysis; per-item failures are isolated.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use veritas_common::{Error, Result, Settings};
use veritas_core::Source;
use veritas_store::{DomainStore, SourceStore};

use crate::domain::normalize_domain_name;
use crate::tool::{SearchTool, MAX_RESULTS_PER_SEARCH};

/// Web search client backed by the Google Custom Search JSON API.
pub struct GoogleSearchClient {
    endpoint: String,
    api_key: String,
    engine_id: String,
    client: Client,
    domains: Arc<dyn DomainStore>,
    sources: Arc<dyn SourceStore>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

impl GoogleSearchClient {
    /// Create a client from settings. Fails when the API key or engine id
    /// is not configured.
    pub fn new(
        settings: &Settings,
        domains: Arc<dyn DomainStore>,
        sources: Arc<dyn SourceStore>,
    ) -> Result<Self> {
        let api_key = settings
            .search
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("search api_key not set".into()))?;
        let engine_id = settings
            .search
            .engine_id
            .clone()
            .ok_or_else(|| Error::Config("search engine_id not set".into()))?;

        Ok(Self::with_endpoint(
            &settings.search.endpoint,
            &api_key,
            &engine_id,
            domains,
            sources,
        ))
    }

    /// Create a client against a specific endpoint (used by tests).
    pub fn with_endpoint(
        endpoint: &str,
        api_key: &str,
        engine_id: &str,
        domains: Arc<dyn DomainStore>,
        sources: Arc<dyn SourceStore>,
    ) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            engine_id: engine_id.to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            domains,
            sources,
        }
    }

    async fn fetch_items(&self, query: &str, num_results: u8) -> Vec<SearchItem> {
        let num = num_results.min(MAX_RESULTS_PER_SEARCH);
        let request = self.client.get(&self.endpoint).query(&[
            ("key", self.api_key.as_str()),
            ("cx", self.engine_id.as_str()),
            ("q", query),
            ("num", &num.to_string()),
            ("fields", "items(title,link,snippet)"),
        ]);

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, query, "search request failed");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status, body, query, "search api error");
            return Vec::new();
        }

        match response.json::<SearchResponse>().await {
            Ok(parsed) => {
                if parsed.items.is_empty() {
                    tracing::warn!(query, "no search results found");
                }
                parsed.items
            }
            Err(e) => {
                tracing::error!(error = %e, query, "failed to parse search response");
                Vec::new()
            }
        }
    }

    async fn persist_item(&self, item: &SearchItem, search_id: Uuid) -> Result<Source> {
        // First write for a URL wins; later sightings reuse the record.
        if let Some(existing) = self.sources.get_by_url(&item.link).await? {
            tracing::debug!(url = %item.link, "reusing existing source");
            return Ok(existing);
        }

        let domain_name = normalize_domain_name(&item.link);
        let (domain, is_new) = self.domains.get_or_create(&domain_name).await?;
        if is_new {
            tracing::info!(domain = %domain_name, "created new domain record");
        }

        let now = Utc::now();
        let source = Source {
            id: Uuid::new_v4(),
            search_id,
            url: item.link.clone(),
            title: item.title.clone(),
            snippet: item.snippet.clone(),
            domain_id: Some(domain.id),
            credibility_score: domain.credibility_score,
            created_at: now,
            updated_at: now,
        };
        self.sources.create(source).await
    }
}

#[async_trait]
impl SearchTool for GoogleSearchClient {
    async fn search_and_create_sources(
        &self,
        query: &str,
        search_id: Uuid,
        num_results: u8,
    ) -> Result<Vec<Source>> {
        let items = self.fetch_items(query, num_results).await;

        let mut sources = Vec::with_capacity(items.len());
        for item in &items {
            match self.persist_item(item, search_id).await {
                Ok(source) => sources.push(source),
                Err(e) => {
                    tracing::error!(error = %e, url = %item.link, "error processing search result");
                }
            }
        }

        Ok(sources)
    }
}
