use crate::ai::LanguageModel;
use crate::config::AgentConfig;
use crate::retry::RetryPolicy;
use crate::twitter::SocialPlatform;
use std::sync::Arc;

/// Shared clients and configuration handed to tool constructors
#[derive(Clone)]
pub struct ToolContext {
    pub config: Arc<AgentConfig>,
    pub model: Arc<dyn LanguageModel>,
    pub platform: Arc<dyn SocialPlatform>,
}

impl ToolContext {
    pub fn new(
        config: Arc<AgentConfig>,
        model: Arc<dyn LanguageModel>,
        platform: Arc<dyn SocialPlatform>,
    ) -> Self {
        ToolContext {
            config,
            model,
            platform,
        }
    }

    /// Retry policy for Twitter calls made by tools
    pub fn twitter_retry(&self) -> RetryPolicy {
        RetryPolicy::twitter(self.config.retry_max, self.config.retry_base_secs)
    }
}
