//! The two built-in tools: key-user replies and thread posting.

use crate::agent::{ReplyRunner, ResponderSettings, ThreadComposer};
use crate::config::env_vars;
use crate::error::{AgentError, ConfigError};
use crate::tools::registry::{Tool, ToolSpec};
use crate::tools::types::ToolContext;
use async_trait::async_trait;
use std::sync::Arc;

pub const TWITTER_REPLY: &str = "twitter_reply";
pub const TWITTER_POST: &str = "twitter_post";

pub const REPLY_SPEC: ToolSpec = ToolSpec {
    name: TWITTER_REPLY,
    description: "reply to recent threads from key users",
    required_env: &[
        &[env_vars::KEY_USERS],
        env_vars::TWITTER_CONSUMER_KEY,
        env_vars::TWITTER_CONSUMER_SECRET,
        env_vars::TWITTER_ACCESS_TOKEN,
        env_vars::TWITTER_ACCESS_TOKEN_SECRET,
        &[env_vars::MODEL_API_KEY, env_vars::MODEL_URL],
    ],
    constructor: build_reply_tool,
};

pub const POST_SPEC: ToolSpec = ToolSpec {
    name: TWITTER_POST,
    description: "post a new thread written by the model",
    required_env: &[
        env_vars::TWITTER_CONSUMER_KEY,
        env_vars::TWITTER_CONSUMER_SECRET,
        env_vars::TWITTER_ACCESS_TOKEN,
        env_vars::TWITTER_ACCESS_TOKEN_SECRET,
        &[env_vars::MODEL_API_KEY, env_vars::MODEL_URL],
    ],
    constructor: build_post_tool,
};

fn build_reply_tool(context: &ToolContext) -> Result<Arc<dyn Tool>, ConfigError> {
    let runner = ReplyRunner::new(
        ResponderSettings::from_config(&context.config),
        context.model.clone(),
        context.platform.clone(),
        context.twitter_retry(),
    )?;
    Ok(Arc::new(runner))
}

fn build_post_tool(context: &ToolContext) -> Result<Arc<dyn Tool>, ConfigError> {
    Ok(Arc::new(ThreadComposer::new(
        context.config.post_prompt.clone(),
        context.model.clone(),
        context.platform.clone(),
        context.twitter_retry(),
    )))
}

#[async_trait]
impl Tool for ReplyRunner {
    fn name(&self) -> &'static str {
        TWITTER_REPLY
    }

    async fn run(&self) -> Result<String, AgentError> {
        let report = self.run_once().await?;
        let new_ids: Vec<&str> = report
            .dispatch
            .outcomes
            .iter()
            .filter_map(|o| o.new_post_id())
            .collect();
        Ok(format!(
            "{} tweets, {} conversations, {} posted [{}], {} failed, {} skipped",
            report.fetched,
            report.conversations,
            report.posted(),
            new_ids.join(", "),
            report.dispatch.failed(),
            report.dispatch.skipped
        ))
    }
}

#[async_trait]
impl Tool for ThreadComposer {
    fn name(&self) -> &'static str {
        TWITTER_POST
    }

    async fn run(&self) -> Result<String, AgentError> {
        let ids = self.compose_and_post().await?;
        Ok(format!("posted a thread of {} tweet(s)", ids.len()))
    }
}
