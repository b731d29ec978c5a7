use super::threads::{Conversation, ConversationIndex};
use crate::ai::LanguageModel;
use crate::config::AgentConfig;
use crate::error::{AgentError, ConfigError, ModelError};
use crate::retry::RetryPolicy;
use crate::twitter::{SocialPlatform, TWITTER_MAX_CHARS};
use std::sync::Arc;

/// Settings for the key-user reply flow, taken from `AgentConfig`
#[derive(Debug, Clone)]
pub struct ResponderSettings {
    pub key_users: Vec<String>,
    pub key_phrase: Option<String>,
    pub quote_mode: bool,
    pub response_prompt: String,
    pub responses_per_run: usize,
    pub lookback_hours: i64,
}

impl ResponderSettings {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            key_users: config.key_users.clone(),
            key_phrase: config.key_phrase.clone(),
            quote_mode: config.quote_mode,
            response_prompt: config.response_prompt.clone(),
            responses_per_run: config.responses_per_run,
            lookback_hours: config.lookback_hours,
        }
    }
}

/// Where a response lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostTarget {
    /// Reply to the newest tweet of the thread
    Reply(String),
    /// Quote the thread root
    Quote(String),
}

impl PostTarget {
    fn reply_to(&self) -> Option<&str> {
        match self {
            PostTarget::Reply(id) => Some(id),
            PostTarget::Quote(_) => None,
        }
    }

    fn quote_of(&self) -> Option<&str> {
        match self {
            PostTarget::Reply(_) => None,
            PostTarget::Quote(id) => Some(id),
        }
    }
}

/// Terminal state of an attempted conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    Responded { post_id: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub author_id: String,
    pub conversation_id: String,
    pub status: DispatchStatus,
}

impl DispatchOutcome {
    pub fn posted(&self) -> bool {
        matches!(self.status, DispatchStatus::Responded { .. })
    }

    pub fn new_post_id(&self) -> Option<&str> {
        match &self.status {
            DispatchStatus::Responded { post_id } => Some(post_id),
            DispatchStatus::Failed { .. } => None,
        }
    }
}

/// Result of one dispatch pass. Conversations past the cap are not attempted
/// and only show up in `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcomes: Vec<DispatchOutcome>,
    pub skipped: usize,
}

impl DispatchReport {
    pub fn posted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.posted()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.posted()
    }
}

/// Generates and posts one response per conversation, up to a global cap.
pub struct ResponseDispatcher {
    settings: ResponderSettings,
    model: Arc<dyn LanguageModel>,
    platform: Arc<dyn SocialPlatform>,
    retry: RetryPolicy,
}

impl ResponseDispatcher {
    pub fn new(
        settings: ResponderSettings,
        model: Arc<dyn LanguageModel>,
        platform: Arc<dyn SocialPlatform>,
        retry: RetryPolicy,
    ) -> Result<Self, ConfigError> {
        if settings.key_users.is_empty() {
            return Err(ConfigError::new(
                "KEY_USERS is empty, no accounts to respond to",
            ));
        }
        Ok(Self {
            settings,
            model,
            platform,
            retry,
        })
    }

    pub fn target_for(&self, conversation: &Conversation) -> PostTarget {
        if self.settings.quote_mode {
            PostTarget::Quote(conversation.first().id.clone())
        } else {
            PostTarget::Reply(conversation.last().id.clone())
        }
    }

    pub fn build_prompt(&self, conversation: &Conversation) -> String {
        format!("{}\n\n{}", self.settings.response_prompt, conversation.render())
    }

    /// Walk the index in insertion order and respond until `cap` posts succeed.
    pub async fn dispatch(&self, index: &ConversationIndex, cap: usize) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut posted = 0usize;
        let total = index.conversation_count();

        for conversation in index.conversations() {
            if posted >= cap {
                report.skipped = total - report.outcomes.len();
                log::info!(
                    "[AGENT] Responded to max responses ({}), skipping {} conversation(s)",
                    cap,
                    report.skipped
                );
                break;
            }

            log::info!(
                "[AGENT] Responding to conversation {} by @{} ({} tweets)",
                conversation.conversation_id,
                conversation.author_name(),
                conversation.len()
            );

            let status = match self.respond(conversation).await {
                Ok(post_id) => {
                    posted += 1;
                    log::info!(
                        "[AGENT] Posted {} for conversation {}",
                        post_id,
                        conversation.conversation_id
                    );
                    DispatchStatus::Responded { post_id }
                }
                Err(e) => {
                    log::error!(
                        "[AGENT] Error responding to conversation {}: {}",
                        conversation.conversation_id,
                        e
                    );
                    DispatchStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };

            report.outcomes.push(DispatchOutcome {
                author_id: conversation.author_id.clone(),
                conversation_id: conversation.conversation_id.clone(),
                status,
            });
        }

        report
    }

    async fn respond(&self, conversation: &Conversation) -> Result<String, AgentError> {
        let raw = self.model.query(&self.build_prompt(conversation)).await?;
        let text = clean_reply(&raw).ok_or_else(|| ModelError::new("model returned an empty response"))?;
        log::info!("[AGENT] Response: {}", text);

        let target = self.target_for(conversation);
        let (text, reply_to, quote_of) = (text.as_str(), target.reply_to(), target.quote_of());
        let post_id = self
            .retry
            .run("create tweet", move || {
                self.platform.create_post(text, reply_to, quote_of)
            })
            .await?;

        Ok(post_id)
    }
}

/// Trim model output and drop one pair of wrapping quotes. `None` when nothing is left.
pub fn clean_reply(raw: &str) -> Option<String> {
    let mut text = raw.trim();
    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}')] {
        if text.len() >= 2 && text.starts_with(open) && text.ends_with(close) {
            text = text[open.len_utf8()..text.len() - close.len_utf8()].trim();
            break;
        }
    }

    if text.is_empty() {
        return None;
    }
    if text.chars().count() > TWITTER_MAX_CHARS {
        log::warn!(
            "[AGENT] Response is {} characters, over the {} limit",
            text.chars().count(),
            TWITTER_MAX_CHARS
        );
    }
    Some(text.to_string())
}
