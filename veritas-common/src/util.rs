//! Utility functions for Veritas services.

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Safely handles multi-byte UTF-8 characters by using character boundaries
/// instead of byte indices. Used to keep claim text and LLM output readable
/// in logs.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let truncated = &s[..idx];
            format!("{}...", truncated.trim_end())
        }
        None => s.to_string(),
    }
}

/// Format a [0,1] score as an integer percentage string.
pub fn as_percentage(score: f64) -> String {
    format!("{:.0}%", score.clamp(0.0, 1.0) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
        assert_eq!(truncate_with_ellipsis("hello world", 5), "hello...");
        assert_eq!(truncate_with_ellipsis("😀😀😀😀", 2), "😀😀...");
        assert_eq!(truncate_with_ellipsis("", 10), "");
    }

    #[test]
    fn formats_percentages() {
        assert_eq!(as_percentage(0.87), "87%");
        assert_eq!(as_percentage(0.0), "0%");
        assert_eq!(as_percentage(1.5), "100%");
        assert_eq!(as_percentage(-0.2), "0%");
    }
}
