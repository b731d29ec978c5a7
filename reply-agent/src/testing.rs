//! Test doubles for the model and the platform, plus tweet fixtures.

use crate::ai::LanguageModel;
use crate::error::{ModelError, PlatformError};
use crate::twitter::types::{PostMetrics, ReferencedPost};
use crate::twitter::{Post, RawSearchResult, ReferenceKind, SocialPlatform};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Base timestamp for fixtures: 2025-01-22T14:00:00Z
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 22, 14, 0, 0).unwrap()
}

/// Tweet `id` by author `author_id` (`@user_<author_id>`), `minute` minutes after
/// the base time, optionally replying to `reply_to`.
pub fn post(id: &str, author_id: &str, conversation_id: &str, minute: i64, reply_to: Option<&str>) -> Post {
    Post {
        id: id.to_string(),
        text: format!("tweet {}", id),
        author_id: author_id.to_string(),
        author_name: format!("user_{}", author_id),
        created_at: base_time() + Duration::minutes(minute),
        conversation_id: conversation_id.to_string(),
        referenced_posts: reply_to
            .map(|parent| {
                vec![ReferencedPost {
                    kind: ReferenceKind::RepliedTo,
                    id: parent.to_string(),
                }]
            })
            .unwrap_or_default(),
        metrics: PostMetrics::default(),
    }
}

pub fn search_result(posts: Vec<Post>) -> RawSearchResult {
    let authors = posts
        .iter()
        .map(|p| (p.author_id.clone(), p.author_name.clone()))
        .collect();
    RawSearchResult { posts, authors }
}

/// Language model that replays queued responses and records every prompt.
#[derive(Clone, Default)]
pub struct MockModel {
    responses: Arc<Mutex<VecDeque<Result<String, ModelError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockModel {
    pub fn new(responses: Vec<Result<String, ModelError>>) -> Self {
        MockModel {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn replies(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn query(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::new("mock model exhausted")))
    }
}

/// One recorded `create_post` call
#[derive(Debug, Clone, PartialEq)]
pub struct PostCall {
    pub text: String,
    pub reply_to: Option<String>,
    pub quote_of: Option<String>,
}

/// Platform that replays queued search and post results.
///
/// When the post queue is empty, posts succeed with ids `new-1`, `new-2`, ...
#[derive(Clone, Default)]
pub struct MockPlatform {
    searches: Arc<Mutex<VecDeque<Result<RawSearchResult, PlatformError>>>>,
    post_results: Arc<Mutex<VecDeque<Result<String, PlatformError>>>>,
    queries: Arc<Mutex<Vec<(String, DateTime<Utc>)>>>,
    posts: Arc<Mutex<Vec<PostCall>>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(self, result: Result<RawSearchResult, PlatformError>) -> Self {
        self.searches.lock().unwrap().push_back(result);
        self
    }

    pub fn with_post_result(self, result: Result<String, PlatformError>) -> Self {
        self.post_results.lock().unwrap().push_back(result);
        self
    }

    pub fn queries(&self) -> Vec<(String, DateTime<Utc>)> {
        self.queries.lock().unwrap().clone()
    }

    /// Every `create_post` attempt, including failed ones
    pub fn posts(&self) -> Vec<PostCall> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SocialPlatform for MockPlatform {
    async fn search(
        &self,
        query: &str,
        start_time: DateTime<Utc>,
    ) -> Result<RawSearchResult, PlatformError> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), start_time));
        self.searches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RawSearchResult::default()))
    }

    async fn create_post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        quote_of: Option<&str>,
    ) -> Result<String, PlatformError> {
        let count = {
            let mut posts = self.posts.lock().unwrap();
            posts.push(PostCall {
                text: text.to_string(),
                reply_to: reply_to.map(str::to_string),
                quote_of: quote_of.map(str::to_string),
            });
            posts.len()
        };
        self.post_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("new-{}", count)))
    }
}
