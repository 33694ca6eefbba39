//! Verdict extraction from raw model output.
//!
//! Models are instructed to answer with strict JSON, but in practice wrap
//! it in prose, emit control characters, or mangle the object entirely.
//! Parsing runs two strategies first-success-wins: a strict JSON parse
//! over the brace-sliced text, then a regex field extraction over the
//! cleaned text. Only when both fail does the caller see a parse error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use veritas_common::{Error, Result};

/// Placeholder when the model omits the analysis field.
pub const FALLBACK_ANALYSIS_TEXT: &str = "No analysis text was provided.";

static VERACITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""veracity_score":\s*(0?\.\d+)"#).unwrap());
static ANALYSIS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""analysis":\s*"([^"]+)""#).unwrap());

/// A structured verdict extracted from model output.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Clamped to [0,1].
    pub veracity_score: f64,
    pub analysis_text: String,
    /// Clamped to [0,1] when reported.
    pub confidence_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct VerdictJson {
    veracity_score: f64,
    #[serde(default)]
    analysis: Option<String>,
    #[serde(default)]
    confidence_score: Option<f64>,
}

/// Parse accumulated model output into a verdict.
pub fn parse(raw: &str) -> Result<Verdict> {
    let cleaned = strip_control_chars(raw);

    strict_json_parse(slice_to_braces(&cleaned))
        .or_else(|_| regex_fallback_parse(&cleaned))
        .map_err(|_| {
            Error::Parse(format!(
                "verdict unparseable by strict and fallback strategies: {}",
                veritas_common::util::truncate_with_ellipsis(&cleaned, 200)
            ))
        })
}

/// Remove carriage returns and the NUL/SUB control characters models
/// sometimes leak into streams.
fn strip_control_chars(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '\r' | '\0' | '\x1a'))
        .collect()
}

/// Slice to the outermost braces, tolerating leading/trailing prose.
/// Returns the input unchanged when no brace pair exists.
fn slice_to_braces(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn strict_json_parse(text: &str) -> Result<Verdict> {
    let parsed: VerdictJson = serde_json::from_str(text)?;
    Ok(Verdict {
        veracity_score: parsed.veracity_score.clamp(0.0, 1.0),
        analysis_text: parsed
            .analysis
            .unwrap_or_else(|| FALLBACK_ANALYSIS_TEXT.to_string()),
        confidence_score: parsed.confidence_score.map(|c| c.clamp(0.0, 1.0)),
    })
}

fn regex_fallback_parse(text: &str) -> Result<Verdict> {
    let veracity = VERACITY_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());
    let analysis = ANALYSIS_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    match (veracity, analysis) {
        (Some(score), Some(analysis_text)) => Ok(Verdict {
            veracity_score: score.clamp(0.0, 1.0),
            analysis_text,
            confidence_score: None,
        }),
        _ => Err(Error::Parse("fallback field extraction failed".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_json_parses_verbatim() {
        let raw = r#"{"veracity_score": 0.85, "analysis": "Strongly supported by sources."}"#;
        let verdict = parse(raw).unwrap();
        assert_eq!(verdict.veracity_score, 0.85);
        assert_eq!(verdict.analysis_text, "Strongly supported by sources.");
        assert!(verdict.confidence_score.is_none());
    }

    #[test]
    fn out_of_range_scores_clamp() {
        let high = parse(r#"{"veracity_score": 1.5, "analysis": "x"}"#).unwrap();
        assert_eq!(high.veracity_score, 1.0);

        let low = parse(r#"{"veracity_score": -0.3, "analysis": "x"}"#).unwrap();
        assert_eq!(low.veracity_score, 0.0);

        let conf = parse(r#"{"veracity_score": 0.5, "analysis": "x", "confidence_score": 3.0}"#)
            .unwrap();
        assert_eq!(conf.confidence_score, Some(1.0));
    }

    #[test]
    fn brace_slicing_tolerates_prose() {
        let raw = "Here it is: {\"veracity_score\":0.3,\"analysis\":\"mixed\"} thanks";
        let verdict = parse(raw).unwrap();
        assert_eq!(verdict.veracity_score, 0.3);
        assert_eq!(verdict.analysis_text, "mixed");
    }

    #[test]
    fn control_characters_are_stripped() {
        let raw = "{\"veracity_score\":\r 0.7,\0 \"analysis\": \"clean\"\x1a}";
        let verdict = parse(raw).unwrap();
        assert_eq!(verdict.veracity_score, 0.7);
        assert_eq!(verdict.analysis_text, "clean");
    }

    #[test]
    fn missing_analysis_uses_placeholder() {
        let verdict = parse(r#"{"veracity_score": 0.9}"#).unwrap();
        assert_eq!(verdict.analysis_text, FALLBACK_ANALYSIS_TEXT);
    }

    #[test]
    fn regex_fallback_rescues_broken_json() {
        // Trailing comma makes this invalid JSON; both fields still extract.
        let raw = r#"{"veracity_score": .42, "analysis": "partially true",}"#;
        let verdict = parse(raw).unwrap();
        assert_eq!(verdict.veracity_score, 0.42);
        assert_eq!(verdict.analysis_text, "partially true");
    }

    #[test]
    fn fallback_requires_both_fields() {
        // veracity present, analysis missing, and not valid JSON
        let raw = r#"score was "veracity_score": 0.4 but no analysis field,"#;
        let err = parse(raw).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse("I cannot answer that.").unwrap_err();
        assert!(err.is_parse());
        assert!(matches!(err, Error::Parse(_)));
    }
}
