use super::dispatcher::clean_reply;
use crate::ai::LanguageModel;
use crate::error::AgentError;
use crate::retry::RetryPolicy;
use crate::twitter::SocialPlatform;
use std::sync::Arc;

/// Writes a fresh thread from a standing prompt.
pub struct ThreadComposer {
    prompt: String,
    model: Arc<dyn LanguageModel>,
    platform: Arc<dyn SocialPlatform>,
    retry: RetryPolicy,
}

impl ThreadComposer {
    pub fn new(
        prompt: String,
        model: Arc<dyn LanguageModel>,
        platform: Arc<dyn SocialPlatform>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            prompt,
            model,
            platform,
            retry,
        }
    }

    /// Generate a thread and post it. Returns the ids in posting order.
    pub async fn compose_and_post(&self) -> Result<Vec<String>, AgentError> {
        log::info!("[AGENT] Composing new thread...");
        let raw = self.model.query(&self.prompt).await?;
        let lines = split_thread(&raw);

        if lines.is_empty() {
            log::warn!("[AGENT] Model returned nothing to post");
            return Ok(Vec::new());
        }

        let mut posted: Vec<String> = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            let reply_to = posted.last().map(String::as_str);
            let text = line.as_str();
            let id = self
                .retry
                .run("create tweet", move || self.platform.create_post(text, reply_to, None))
                .await
                .inspect_err(|e| {
                    log::error!(
                        "[AGENT] Thread stopped at tweet {}/{} ({} posted): {}",
                        i + 1,
                        lines.len(),
                        i,
                        e
                    )
                })?;
            log::info!("[AGENT] Posted thread tweet {}/{}: {}", i + 1, lines.len(), id);
            posted.push(id);
        }

        Ok(posted)
    }
}

/// One tweet per non-blank line, with wrapping quotes removed.
pub fn split_thread(raw: &str) -> Vec<String> {
    raw.lines().filter_map(clean_reply).collect()
}
