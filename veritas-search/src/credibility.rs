//! Source credibility aggregation and presentation ordering.

use std::cmp::Ordering;
use std::collections::HashSet;

use veritas_core::Source;

/// Overall credibility of a set of sources: the arithmetic mean of the
/// non-null scores. An empty set (or one with no rated sources) scores 0.0.
pub fn calculate_overall_credibility(sources: &[Source]) -> f64 {
    let rated: Vec<f64> = sources.iter().filter_map(|s| s.credibility_score).collect();
    if rated.is_empty() {
        return 0.0;
    }
    rated.iter().sum::<f64>() / rated.len() as f64
}

/// Deduplicate by URL (first occurrence wins) and order for presentation:
/// credibility descending, unrated sources last. The sort is stable, so
/// ties keep their accumulation order.
pub fn dedup_and_rank(sources: Vec<Source>) -> Vec<Source> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Source> = sources
        .into_iter()
        .filter(|s| seen.insert(s.url.clone()))
        .collect();

    unique.sort_by(|a, b| match (a.credibility_score, b.credibility_score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    unique
}

/// Format sources into a string for the LLM prompt.
pub fn format_sources_for_prompt(sources: &[Source]) -> String {
    if sources.is_empty() {
        return "No reliable sources found.".to_string();
    }

    let blocks: Vec<String> = sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let credibility = source
                .credibility_score
                .map(|c| format!("{c:.2}"))
                .unwrap_or_else(|| "unrated".to_string());
            format!(
                "Source {n}:\nTitle: {title}\nURL: {url}\nCredibility Score: {credibility}\nExcerpt: {snippet}",
                n = i + 1,
                title = source.title,
                url = source.url,
                snippet = source.snippet,
            )
        })
        .collect();

    blocks.join("\n\n")
}
