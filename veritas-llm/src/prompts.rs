//! Prompt templates for the analysis loop and discussion streaming.

/// Prefix for tool results fed back into the transcript as user turns.
pub const SEARCH_RESULT_PREFIX: &str = "Search result:";

/// System prompt seeding the analysis turn loop.
///
/// The protocol markers matter: the loop watches for `SEARCH:` lines to
/// run the web-search tool and for a bare `READY` reply to stop.
pub fn analysis_system_prompt(claim_text: &str, context: &str) -> String {
    format!(
        "You are a fact-checking agent. Your task is to verify the following claim:\n\
         \n\
         Claim: {claim_text}\n\
         Context: {context}\n\
         \n\
         You may search the web for evidence. To run a search, end your reply with a line:\n\
         SEARCH: <your query>\n\
         \n\
         Each search result will be provided back to you. Run as many searches as you need,\n\
         one at a time. When you have gathered enough evidence to judge the claim, reply\n\
         with exactly the single word READY and nothing else."
    )
}

/// Instruction appended after the loop to request the structured verdict.
pub fn verdict_instruction() -> &'static str {
    "Based on the evidence gathered above, give your final verdict on the claim.\n\
     Respond with ONLY a strict JSON object, no other text before or after:\n\
     {\"veracity_score\": <float between 0 and 1, where 0 is completely false and 1 is completely true>, \"analysis\": \"<your detailed reasoning>\"}\n\
     Escape all control characters inside the analysis string."
}

/// System prompt seeding a follow-up discussion about a completed analysis.
pub fn discussion_system_prompt(
    claim_text: &str,
    analysis_text: &str,
    veracity_pct: &str,
    confidence_pct: &str,
) -> String {
    format!(
        "You are discussing a completed fact-check with the user.\n\
         \n\
         Claim: {claim_text}\n\
         Verdict: veracity {veracity_pct}, confidence {confidence_pct}.\n\
         Analysis: {analysis_text}\n\
         \n\
         Answer the user's questions about this analysis. Stay factual, ground your\n\
         answers in the analysis above, and say so when something is outside what\n\
         the analysis covered."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_prompt_embeds_claim_and_markers() {
        let prompt = analysis_system_prompt("The sky is green", "submitted via app");
        assert!(prompt.contains("The sky is green"));
        assert!(prompt.contains("submitted via app"));
        assert!(prompt.contains("SEARCH:"));
        assert!(prompt.contains("READY"));
    }

    #[test]
    fn verdict_instruction_requests_strict_json() {
        let instruction = verdict_instruction();
        assert!(instruction.contains("veracity_score"));
        assert!(instruction.contains("analysis"));
        assert!(instruction.contains("ONLY"));
    }

    #[test]
    fn discussion_prompt_embeds_percentages() {
        let prompt = discussion_system_prompt("claim", "analysis body", "73%", "90%");
        assert!(prompt.contains("veracity 73%"));
        assert!(prompt.contains("confidence 90%"));
    }
}
