//! Twitter API v2 client using OAuth 1.0a user context.

use super::oauth::{TwitterCredentials, generate_oauth_header, percent_encode};
use super::types::{
    PostTweetResponse, RawSearchResult, SearchResponse, SingleUserResponse, TwitterApiError,
    TwitterUser,
};
use super::SocialPlatform;
use crate::error::{PlatformError, truncate};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

/// Twitter API v2 base URL
pub const TWITTER_API_BASE: &str = "https://api.twitter.com/2";

const TWEET_FIELDS: &str = "created_at,author_id,conversation_id,public_metrics,referenced_tweets";
const EXPANSIONS: &str = "author_id,referenced_tweets.id";
const USER_FIELDS: &str = "username";

/// Rate limit information from Twitter API response headers
#[derive(Debug, Clone, Default)]
struct RateLimitInfo {
    /// Remaining requests in current window
    remaining: Option<u32>,
    /// Unix timestamp when the rate limit resets
    reset_at: Option<u64>,
}

impl RateLimitInfo {
    fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        Self {
            remaining: parse_header(headers, "x-rate-limit-remaining"),
            reset_at: parse_header(headers, "x-rate-limit-reset"),
        }
    }

    fn seconds_until_reset(&self) -> Option<u64> {
        self.reset_at.map(|reset| {
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            reset.saturating_sub(now)
        })
    }
}

fn parse_header<T: std::str::FromStr>(headers: &reqwest::header::HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[derive(Clone)]
pub struct TwitterClient {
    client: reqwest::Client,
    credentials: TwitterCredentials,
    api_base: String,
    max_results: Option<u32>,
}

impl TwitterClient {
    pub fn new(credentials: TwitterCredentials) -> Self {
        Self {
            client: crate::http::shared_client().clone(),
            credentials,
            api_base: TWITTER_API_BASE.to_string(),
            max_results: None,
        }
    }

    /// Page size for recent search. The API accepts 10..=100.
    pub fn with_max_results(mut self, max_results: Option<u32>) -> Self {
        self.max_results = max_results.map(|n| n.clamp(10, 100));
        self
    }

    /// Verify credentials by fetching the authenticated user
    pub async fn verify_credentials(&self) -> Result<TwitterUser, PlatformError> {
        let url = format!("{}/users/me", self.api_base);
        let auth_header = generate_oauth_header("GET", &url, &self.credentials, None);

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth_header)
            .send()
            .await
            .map_err(|e| PlatformError::Request(e.to_string()))?;

        let body = read_body(response).await?;
        let data: SingleUserResponse =
            serde_json::from_str(&body).map_err(|e| PlatformError::Decode(e.to_string()))?;

        data.data.ok_or_else(|| PlatformError::Api {
            status: 200,
            message: "No user data returned".to_string(),
        })
    }

    fn search_params<'a>(
        &self,
        query: &'a str,
        start_time: &'a str,
        max_results: &'a str,
    ) -> Vec<(&'a str, &'a str)> {
        let mut params: Vec<(&str, &str)> = vec![
            ("query", query),
            ("start_time", start_time),
            ("tweet.fields", TWEET_FIELDS),
            ("expansions", EXPANSIONS),
            ("user.fields", USER_FIELDS),
        ];
        if self.max_results.is_some() {
            params.push(("max_results", max_results));
        }
        params
    }
}

/// Read a response body, mapping non-success statuses to `PlatformError`.
async fn read_body(response: reqwest::Response) -> Result<String, PlatformError> {
    let rate_limit = RateLimitInfo::from_headers(response.headers());
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if let Some(remaining) = rate_limit.remaining {
        if remaining <= 3 {
            log::warn!(
                "[TWITTER] Rate limit low ({} remaining), reset in {:?}s",
                remaining,
                rate_limit.seconds_until_reset()
            );
        }
    }

    if !status.is_success() {
        log::debug!("[TWITTER] API error ({}): {}", status, body);
        return Err(PlatformError::from_status(
            status.as_u16(),
            &body,
            rate_limit.seconds_until_reset(),
        ));
    }

    Ok(body)
}

fn join_errors(errors: &[TwitterApiError]) -> String {
    errors
        .iter()
        .map(TwitterApiError::describe)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Decode a recent-search body.
///
/// Partial errors (e.g. a deleted referenced tweet) are logged; an error
/// payload with no data at all is an API error.
fn parse_search_body(body: &str) -> Result<RawSearchResult, PlatformError> {
    let data: SearchResponse =
        serde_json::from_str(body).map_err(|e| PlatformError::Decode(e.to_string()))?;

    if let Some(errors) = data.errors.as_deref().filter(|e| !e.is_empty()) {
        if data.data.is_none() {
            return Err(PlatformError::Api {
                status: 200,
                message: join_errors(errors),
            });
        }
        log::debug!("[TWITTER] Search returned partial errors: {}", join_errors(errors));
    }

    if let Some(meta) = &data.meta {
        log::debug!(
            "[TWITTER] Search returned {} tweet(s) (newest {:?}, oldest {:?})",
            meta.result_count,
            meta.newest_id,
            meta.oldest_id
        );
    }

    Ok(RawSearchResult::from_response(data))
}

fn parse_post_body(body: &str) -> Result<String, PlatformError> {
    let data: PostTweetResponse =
        serde_json::from_str(body).map_err(|e| PlatformError::Decode(e.to_string()))?;

    if let Some(errors) = data.errors.as_deref().filter(|e| !e.is_empty()) {
        return Err(PlatformError::Api {
            status: 200,
            message: join_errors(errors),
        });
    }

    data.data
        .map(|tweet| {
            log::info!("[TWITTER] Posted tweet {} - {}", tweet.id, truncate(&tweet.text, 50));
            tweet.id
        })
        .ok_or_else(|| PlatformError::Api {
            status: 200,
            message: "No tweet data returned".to_string(),
        })
}

fn post_body(text: &str, reply_to: Option<&str>, quote_of: Option<&str>) -> serde_json::Value {
    let mut body = json!({
        "text": text
    });

    if let Some(reply_to) = reply_to {
        body["reply"] = json!({
            "in_reply_to_tweet_id": reply_to
        });
    }

    if let Some(quote_id) = quote_of {
        body["quote_tweet_id"] = json!(quote_id);
    }

    body
}

#[async_trait]
impl SocialPlatform for TwitterClient {
    async fn search(
        &self,
        query: &str,
        start_time: DateTime<Utc>,
    ) -> Result<RawSearchResult, PlatformError> {
        let url = format!("{}/tweets/search/recent", self.api_base);
        let start_time = start_time.to_rfc3339_opts(SecondsFormat::Secs, true);
        let max_results = self.max_results.unwrap_or(10).to_string();
        let params = self.search_params(query, &start_time, &max_results);

        let query_string: String = params
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let full_url = format!("{}?{}", url, query_string);

        // Query params must be part of the signature
        let auth_header = generate_oauth_header("GET", &url, &self.credentials, Some(params.as_slice()));

        log::debug!("[TWITTER] Search query: {}", query);

        let response = self
            .client
            .get(&full_url)
            .header("Authorization", auth_header)
            .send()
            .await
            .map_err(|e| PlatformError::Request(e.to_string()))?;

        let body = read_body(response).await?;
        log::debug!("[TWITTER] search/recent response: {}", body);

        parse_search_body(&body)
    }

    async fn create_post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        quote_of: Option<&str>,
    ) -> Result<String, PlatformError> {
        let url = format!("{}/tweets", self.api_base);
        let auth_header = generate_oauth_header("POST", &url, &self.credentials, None);

        let response = self
            .client
            .post(&url)
            .header("Authorization", auth_header)
            .header("Content-Type", "application/json")
            .json(&post_body(text, reply_to, quote_of))
            .send()
            .await
            .map_err(|e| PlatformError::Request(e.to_string()))?;

        let body = read_body(response).await?;
        parse_post_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TwitterClient {
        TwitterClient::new(TwitterCredentials::new(
            "k".to_string(),
            "s".to_string(),
            "t".to_string(),
            "ts".to_string(),
        ))
    }

    #[test]
    fn test_post_body_reply() {
        let body = post_body("hello", Some("123"), None);
        assert_eq!(body["text"], "hello");
        assert_eq!(body["reply"]["in_reply_to_tweet_id"], "123");
        assert!(body.get("quote_tweet_id").is_none());
    }

    #[test]
    fn test_post_body_quote() {
        let body = post_body("hello", None, Some("456"));
        assert_eq!(body["quote_tweet_id"], "456");
        assert!(body.get("reply").is_none());
    }

    #[test]
    fn test_search_params_include_max_results_only_when_set() {
        let plain = client();
        let params = plain.search_params("q", "2025-01-01T00:00:00Z", "10");
        assert!(params.iter().all(|(k, _)| *k != "max_results"));
        assert!(params.contains(&("expansions", "author_id,referenced_tweets.id")));

        let paged = client().with_max_results(Some(500));
        assert_eq!(paged.max_results, Some(100));
        let params = paged.search_params("q", "2025-01-01T00:00:00Z", "100");
        assert!(params.contains(&("max_results", "100")));
    }

    #[test]
    fn test_parse_post_body() {
        let id = parse_post_body(r#"{"data": {"id": "1999", "text": "gm"}}"#).unwrap();
        assert_eq!(id, "1999");

        let err = parse_post_body(r#"{"errors": [{"message": "duplicate content"}]}"#).unwrap_err();
        assert!(matches!(err, PlatformError::Api { .. }));
        assert!(err.to_string().contains("duplicate content"));

        assert!(matches!(
            parse_post_body("not json"),
            Err(PlatformError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_search_body_tolerates_partial_errors() {
        let body = r#"{
            "data": [{"id": "1", "text": "hi", "author_id": "9", "created_at": "2025-01-22T14:00:00Z", "conversation_id": "1"}],
            "errors": [{"detail": "Could not find tweet with referenced_tweets.id: [0]."}]
        }"#;
        let result = parse_search_body(body).unwrap();
        assert_eq!(result.len(), 1);

        let err = parse_search_body(r#"{"errors": [{"detail": "Invalid query"}]}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid query"));
    }

    #[test]
    fn test_rate_limit_headers() {
        use reqwest::header::{HeaderMap, HeaderValue};

        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-remaining", HeaderValue::from_static("2"));
        headers.insert("x-rate-limit-reset", HeaderValue::from_static("1737554400"));
        let info = RateLimitInfo::from_headers(&headers);
        assert_eq!(info.remaining, Some(2));
        assert_eq!(info.reset_at, Some(1737554400));

        // Out of range for u32: unknown, not wrapped to a small count
        headers.insert("x-rate-limit-remaining", HeaderValue::from_static("4294967298"));
        assert_eq!(RateLimitInfo::from_headers(&headers).remaining, None);

        let info = RateLimitInfo::from_headers(&HeaderMap::new());
        assert_eq!(info.remaining, None);
        assert_eq!(info.seconds_until_reset(), None);
    }
}
