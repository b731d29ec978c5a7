use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::AsRefStr;

/// Relation of a referenced tweet, as reported in `referenced_tweets[].type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReferenceKind {
    RepliedTo,
    Quoted,
    Retweeted,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencedPost {
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetrics {
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub quote_count: u64,
    #[serde(default)]
    pub impression_count: u64,
}

/// A fetched tweet with its author resolved. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub conversation_id: String,
    pub referenced_posts: Vec<ReferencedPost>,
    pub metrics: PostMetrics,
}

impl Post {
    /// Only the first reference decides thread membership.
    pub fn first_reference(&self) -> Option<&ReferencedPost> {
        self.referenced_posts.first()
    }
}

/// One search call's worth of posts plus the author lookup.
#[derive(Debug, Clone, Default)]
pub struct RawSearchResult {
    pub posts: Vec<Post>,
    /// author_id → username
    pub authors: HashMap<String, String>,
}

impl RawSearchResult {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Build from a recent-search payload, resolving usernames from `includes.users`.
    ///
    /// Tweets missing `author_id` or `created_at` cannot be threaded and are dropped.
    pub fn from_response(response: SearchResponse) -> Self {
        let authors: HashMap<String, String> = response
            .includes
            .and_then(|inc| inc.users)
            .unwrap_or_default()
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let mut posts = Vec::new();
        for tweet in response.data.unwrap_or_default() {
            let (Some(author_id), Some(created_at)) = (tweet.author_id, tweet.created_at) else {
                log::warn!(
                    "[TWITTER] Dropping tweet {} without author_id/created_at",
                    tweet.id
                );
                continue;
            };

            let author_name = authors
                .get(&author_id)
                .cloned()
                .unwrap_or_else(|| "unknown".to_string());

            posts.push(Post {
                conversation_id: tweet.conversation_id.unwrap_or_else(|| tweet.id.clone()),
                id: tweet.id,
                text: tweet.text,
                author_id,
                author_name,
                created_at,
                referenced_posts: tweet.referenced_tweets.unwrap_or_default(),
                metrics: tweet.public_metrics.unwrap_or_default(),
            });
        }

        Self { posts, authors }
    }
}

/// Twitter API v2 recent search response
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub data: Option<Vec<ApiTweet>>,
    pub includes: Option<SearchIncludes>,
    pub meta: Option<SearchMeta>,
    pub errors: Option<Vec<TwitterApiError>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTweet {
    pub id: String,
    pub text: String,
    pub author_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub conversation_id: Option<String>,
    pub referenced_tweets: Option<Vec<ReferencedPost>>,
    pub public_metrics: Option<PostMetrics>,
}

#[derive(Debug, Deserialize)]
pub struct SearchIncludes {
    pub users: Option<Vec<TwitterUser>>,
}

#[derive(Debug, Deserialize)]
pub struct SearchMeta {
    #[serde(default)]
    pub result_count: i64,
    pub newest_id: Option<String>,
    pub oldest_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwitterUser {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct TwitterApiError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub detail: Option<String>,
}

impl TwitterApiError {
    pub fn describe(&self) -> String {
        match &self.detail {
            Some(detail) if self.message.is_empty() => detail.clone(),
            _ => self.message.clone(),
        }
    }
}

/// Twitter API v2 users/me response
#[derive(Debug, Deserialize)]
pub struct SingleUserResponse {
    pub data: Option<TwitterUser>,
}

/// Twitter API v2 tweet post response
#[derive(Debug, Deserialize)]
pub struct PostTweetResponse {
    pub data: Option<PostedTweet>,
    pub errors: Option<Vec<TwitterApiError>>,
}

#[derive(Debug, Deserialize)]
pub struct PostedTweet {
    pub id: String,
    pub text: String,
}
