//! Reply agent: answers recent threads from configured Twitter accounts
//! with language-model replies, on a fixed daily schedule.
//!
//! `reply-agent --once` runs every selected tool a single time and exits.

mod agent;
mod ai;
mod config;
mod error;
mod http;
mod retry;
mod scheduler;
mod tools;
mod twitter;

#[cfg(test)]
mod testing;

use ai::{LanguageModel, OpenAIClient};
use config::AgentConfig;
use error::{AgentError, ConfigError};
use scheduler::{Scheduler, SchedulerConfig};
use std::sync::Arc;
use tokio::sync::oneshot;
use tools::ToolContext;
use twitter::{SocialPlatform, TwitterClient};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("[AGENT] {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AgentError> {
    let run_once = std::env::args().skip(1).any(|arg| arg == "--once");

    let config = Arc::new(AgentConfig::from_env()?);
    let registry = tools::create_default_registry();
    let specs = registry.validate(&config.tools, |key| std::env::var(key).ok())?;

    let credentials = config
        .twitter_credentials
        .clone()
        .ok_or_else(|| ConfigError::new("Twitter credentials are not configured"))?;
    let twitter = TwitterClient::new(credentials).with_max_results(config.search_max_results);

    let model = OpenAIClient::new(
        &config.model.api_key,
        config.model.url.as_deref(),
        config.model.name.as_deref(),
    )
    .map_err(|e| ConfigError::new(e.message))?
    .with_max_tokens(config.model.max_tokens)
    .with_temperature(config.model.temperature)
    .with_system_prompt(config.model.system_prompt.as_deref());
    log::info!("[AGENT] Using model {}", model.model());

    // Tool construction finishes config validation before any network call
    let model: Arc<dyn LanguageModel> = Arc::new(model);
    let platform: Arc<dyn SocialPlatform> = Arc::new(twitter.clone());
    let context = ToolContext::new(config.clone(), model, platform);
    let tools = tools::build_tools(&specs, &context)?;

    let me = twitter.verify_credentials().await?;
    log::info!("[AGENT] Authenticated as @{} ({})", me.username, me.id);

    let scheduler = Arc::new(Scheduler::new(
        tools,
        SchedulerConfig {
            interval_secs: config.run_interval_secs(),
            run_once,
        },
    ));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("[AGENT] Ctrl-C received, shutting down"),
            Err(e) => log::error!("[AGENT] Failed to listen for Ctrl-C: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    scheduler.start(shutdown_rx).await;
    Ok(())
}
