//! Domain-name normalization.

use url::Url;

/// Normalize a domain name or URL to a consistent form.
///
/// Strips scheme, port, leading `www.`, and lowercases. Falls back to a
/// cleaned version of the input for things the `url` crate rejects.
///
/// ```
/// use veritas_search::normalize_domain_name;
/// assert_eq!(normalize_domain_name("https://www.Example.com:8080/path"), "example.com");
/// assert_eq!(normalize_domain_name("news.example.co.uk"), "news.example.co.uk");
/// ```
pub fn normalize_domain_name(input: &str) -> String {
    let candidate = if input.contains("//") {
        input.to_string()
    } else {
        format!("http://{input}")
    };

    let host = Url::parse(&candidate)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| input.to_string());

    let host = host.split(':').next().unwrap_or(&host);
    host.trim_start_matches("www.").to_lowercase().trim().to_string()
}
