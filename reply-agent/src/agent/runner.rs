use super::dispatcher::{DispatchReport, ResponderSettings, ResponseDispatcher};
use super::threads::reconstruct;
use crate::ai::LanguageModel;
use crate::error::{AgentError, ConfigError};
use crate::retry::RetryPolicy;
use crate::twitter::{SocialPlatform, build_query};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Summary of one reply run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: usize,
    pub conversations: usize,
    pub dispatch: DispatchReport,
}

impl RunReport {
    pub fn posted(&self) -> usize {
        self.dispatch.posted()
    }
}

/// Search → reconstruct → dispatch, once per call.
pub struct ReplyRunner {
    query: String,
    lookback: Duration,
    cap: usize,
    platform: Arc<dyn SocialPlatform>,
    retry: RetryPolicy,
    dispatcher: ResponseDispatcher,
}

impl ReplyRunner {
    pub fn new(
        settings: ResponderSettings,
        model: Arc<dyn LanguageModel>,
        platform: Arc<dyn SocialPlatform>,
        retry: RetryPolicy,
    ) -> Result<Self, ConfigError> {
        let query = build_query(
            settings.key_users.as_slice(),
            settings.key_phrase.as_deref(),
            true,
            settings.quote_mode,
        )?;
        log::debug!("[AGENT] Search query: {}", query);

        let lookback = Duration::hours(settings.lookback_hours);
        let cap = settings.responses_per_run;
        let dispatcher = ResponseDispatcher::new(settings, model, platform.clone(), retry)?;

        Ok(Self {
            query,
            lookback,
            cap,
            platform,
            retry,
            dispatcher,
        })
    }

    pub async fn run_once(&self) -> Result<RunReport, AgentError> {
        self.run_at(Utc::now()).await
    }

    /// One run with the search window ending at `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunReport, AgentError> {
        let start_time = now - self.lookback;
        log::info!("[AGENT] Responding to key users (since {})", start_time.to_rfc3339());

        let (platform, query) = (&self.platform, self.query.as_str());
        let result = self
            .retry
            .run("search recent tweets", move || platform.search(query, start_time))
            .await?;

        if result.is_empty() {
            log::info!("[AGENT] No conversations to respond to.");
            return Ok(RunReport::default());
        }

        let index = reconstruct(&result);
        log::info!(
            "[AGENT] Fetched {} tweets, {} conversation(s) from {} author(s)",
            result.len(),
            index.conversation_count(),
            index.author_count()
        );
        for author in index.authors() {
            log::debug!(
                "[AGENT] Author {}: {} conversation(s)",
                author.author_id,
                author.conversations.len()
            );
        }

        let dispatch = self.dispatcher.dispatch(&index, self.cap).await;
        log::info!(
            "[AGENT] Run complete: {} posted, {} failed, {} skipped",
            dispatch.posted(),
            dispatch.failed(),
            dispatch.skipped
        );

        Ok(RunReport {
            fetched: result.len(),
            conversations: index.conversation_count(),
            dispatch,
        })
    }
}
