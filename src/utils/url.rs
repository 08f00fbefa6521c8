//! Endpoint URL helpers.

/// Join `base_url` and `endpoint` with exactly one slash between them.
///
/// ```
/// use luna::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8899/v1/", "/chat/completions"),
///     "http://localhost:8899/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
