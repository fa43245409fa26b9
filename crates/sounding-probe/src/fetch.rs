//! Direct-fetch provider
//!
//! Treats the query as a URL, fetches it over HTTP and turns the first
//! meaningful line of the body into a claim.
//!
//! # Status mapping
//!
//! | response | probe error |
//! |----------|-------------|
//! | 401, 403 | `Unauthorized` |
//! | 404, 410, empty body | `NoResults` |
//! | 429 | `RateLimited` |
//! | 5xx, connect failure | `Unavailable` |
//! | deadline elapsed | `Timeout` |
//!
//! # Examples
//!
//! ```no_run
//! use sounding_probe::FetchProvider;
//!
//! let provider = FetchProvider::new().with_max_claim_chars(200);
//! ```

use async_trait::async_trait;
use sounding_domain::{ProbeError, ProbeOutcome, ProbeProvider};
use std::time::Duration;

/// Default cap on claim length (characters)
pub const DEFAULT_MAX_CLAIM_CHARS: usize = 280;

/// Default cap on the retained raw payload (bytes)
pub const DEFAULT_MAX_RAW_BYTES: usize = 64 * 1024;

/// Provider that fetches the query URL directly
pub struct FetchProvider {
    client: reqwest::Client,
    max_claim_chars: usize,
    max_raw_bytes: usize,
}

impl FetchProvider {
    /// Create a fetch provider with default limits
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a fetch provider around a pre-configured client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            max_claim_chars: DEFAULT_MAX_CLAIM_CHARS,
            max_raw_bytes: DEFAULT_MAX_RAW_BYTES,
        }
    }

    /// Set the claim length cap
    pub fn with_max_claim_chars(mut self, max: usize) -> Self {
        self.max_claim_chars = max.max(1);
        self
    }

    /// Set the raw payload cap
    pub fn with_max_raw_bytes(mut self, max: usize) -> Self {
        self.max_raw_bytes = max;
        self
    }
}

impl Default for FetchProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProbeProvider for FetchProvider {
    async fn execute(&self, query: &str, timeout: Duration) -> Result<ProbeOutcome, ProbeError> {
        let url = reqwest::Url::parse(query.trim())
            .map_err(|e| ProbeError::NoResults(format!("'{}' is not a URL: {}", query, e)))?;

        tracing::debug!(%url, ?timeout, "fetching");

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        if let Some(error) = classify_status(status, url.as_str()) {
            return Err(error);
        }

        // The claim needs at least a line's worth even when raw capture is off
        let limit = self.max_raw_bytes.max(self.max_claim_chars * 4);
        let bytes = read_capped(response, limit).await?;
        let body = decode_prefix(&bytes, limit);
        let claim = claim_from_body(&body, self.max_claim_chars)
            .ok_or_else(|| ProbeError::NoResults(format!("empty body from {}", url)))?;

        Ok(ProbeOutcome::new(claim, url.as_str()).with_raw(truncate_bytes(&body, self.max_raw_bytes)))
    }
}

/// Read the body chunk by chunk, stopping once `limit` bytes are held
async fn read_capped(mut response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ProbeError> {
    let mut body = Vec::new();
    while body.len() < limit {
        let Some(chunk) = response.chunk().await.map_err(map_transport_error)? else {
            break;
        };
        let take = chunk.len().min(limit - body.len());
        body.extend_from_slice(&chunk[..take]);
    }
    Ok(body)
}

/// Decode up to `max_bytes` of a possibly cut-off UTF-8 body
///
/// A multi-byte character split by the cut is dropped; other invalid bytes
/// are replaced.
fn decode_prefix(bytes: &[u8], max_bytes: usize) -> String {
    let bytes = &bytes[..bytes.len().min(max_bytes)];
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) if e.error_len().is_none() => {
            String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Map an HTTP status to a probe error, `None` for success
pub fn classify_status(status: u16, url: &str) -> Option<ProbeError> {
    match status {
        200..=299 => None,
        401 | 403 => Some(ProbeError::Unauthorized(format!("{} returned {}", url, status))),
        404 | 410 => Some(ProbeError::NoResults(format!("{} returned {}", url, status))),
        429 => Some(ProbeError::RateLimited(format!("{} returned 429", url))),
        _ => Some(ProbeError::Unavailable(format!("{} returned {}", url, status))),
    }
}

/// First non-empty line of the body, trimmed and capped at `max_chars`
pub fn claim_from_body(body: &str, max_chars: usize) -> Option<String> {
    let line = body.lines().map(str::trim).find(|l| !l.is_empty())?;
    Some(line.chars().take(max_chars).collect())
}

fn truncate_bytes(body: &str, max_bytes: usize) -> String {
    if body.len() <= max_bytes {
        return body.to_string();
    }
    let mut end = max_bytes;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

fn map_transport_error(e: reqwest::Error) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout
    } else {
        ProbeError::Unavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(200, "u"), None);
        assert!(matches!(classify_status(401, "u"), Some(ProbeError::Unauthorized(_))));
        assert!(matches!(classify_status(403, "u"), Some(ProbeError::Unauthorized(_))));
        assert!(matches!(classify_status(404, "u"), Some(ProbeError::NoResults(_))));
        assert!(matches!(classify_status(429, "u"), Some(ProbeError::RateLimited(_))));
        assert!(matches!(classify_status(503, "u"), Some(ProbeError::Unavailable(_))));
    }

    #[test]
    fn test_claim_from_body() {
        let body = "\n\n   Tokio 1.47 released  \nmore text";
        assert_eq!(claim_from_body(body, 100), Some("Tokio 1.47 released".to_string()));
        assert_eq!(claim_from_body("abcdef", 3), Some("abc".to_string()));
        assert_eq!(claim_from_body("  \n \n", 10), None);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "héllo";
        // 'é' is two bytes; cutting at 2 must back off to 1
        assert_eq!(truncate_bytes(body, 2), "h");
        assert_eq!(truncate_bytes(body, 100), body);
    }

    #[test]
    fn test_decode_prefix_drops_split_character() {
        let bytes = "héllo".as_bytes();
        assert_eq!(decode_prefix(bytes, 2), "h");
        assert_eq!(decode_prefix(bytes, 3), "hé");
        assert_eq!(decode_prefix(bytes, 100), "héllo");
        assert_eq!(decode_prefix(&[b'a', 0xff, b'b'], 10), "a\u{fffd}b");
    }

    #[tokio::test]
    async fn test_non_url_query_is_no_results() {
        let provider = FetchProvider::new();
        let err = provider
            .execute("what is tokio", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::NoResults(_)));
    }
}
