//! Twitter API v2 integration
//!
//! Signed recent search and tweet creation behind the `SocialPlatform` trait,
//! so the agent core can be driven by a mock in tests.

pub mod client;
pub mod oauth;
pub mod query;
pub mod types;

pub use client::TwitterClient;
pub use oauth::TwitterCredentials;
pub use query::build_query;
pub use types::{Post, RawSearchResult, ReferenceKind};

use crate::error::PlatformError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Maximum characters in a standard tweet
pub const TWITTER_MAX_CHARS: usize = 280;

/// Outbound operations the agent needs from the platform
#[async_trait]
pub trait SocialPlatform: Send + Sync {
    /// Recent search for `query` from `start_time` onwards.
    async fn search(
        &self,
        query: &str,
        start_time: DateTime<Utc>,
    ) -> Result<RawSearchResult, PlatformError>;

    /// Create a tweet, optionally as a reply or a quote. Returns the new id.
    async fn create_post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        quote_of: Option<&str>,
    ) -> Result<String, PlatformError>;
}
