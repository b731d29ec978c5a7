use crate::error::ConfigError;
use crate::twitter::TwitterCredentials;
use std::env;
use std::path::Path;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const KEY_USERS: &str = "KEY_USERS";
    pub const KEY_PHRASE: &str = "KEY_PHRASE";
    pub const QUOTE_MODE: &str = "QUOTE_MODE";
    pub const RESPONSES_PER_RUN: &str = "RESPONSES_PER_RUN";
    pub const RUNS_PER_DAY: &str = "RUNS_PER_DAY";
    pub const LOOKBACK_HOURS: &str = "LOOKBACK_HOURS";
    pub const SEARCH_MAX_RESULTS: &str = "SEARCH_MAX_RESULTS";
    pub const RESPONSE_PROMPT: &str = "RESPONSE_PROMPT";
    pub const RESPONSE_PROMPT_FILE: &str = "RESPONSE_PROMPT_FILE";
    pub const POST_PROMPT: &str = "POST_PROMPT";
    pub const POST_PROMPT_FILE: &str = "POST_PROMPT_FILE";
    pub const SYSTEM_PROMPT: &str = "SYSTEM_PROMPT";
    pub const AGENT_TOOLS: &str = "AGENT_TOOLS";
    // Retry wrapper around Twitter calls
    pub const TWITTER_RETRY_MAX: &str = "TWITTER_RETRY_MAX";
    pub const TWITTER_RETRY_BASE_SECS: &str = "TWITTER_RETRY_BASE_SECS";
    // Twitter OAuth 1.0a (the *_API_* names are accepted as fallbacks)
    pub const TWITTER_CONSUMER_KEY: &[&str] = &["TWITTER_CONSUMER_KEY", "TWITTER_API_KEY"];
    pub const TWITTER_CONSUMER_SECRET: &[&str] = &["TWITTER_CONSUMER_SECRET", "TWITTER_API_SECRET"];
    pub const TWITTER_ACCESS_TOKEN: &[&str] = &["TWITTER_ACCESS_TOKEN"];
    pub const TWITTER_ACCESS_TOKEN_SECRET: &[&str] = &["TWITTER_ACCESS_TOKEN_SECRET"];
    // Language model
    pub const MODEL_API_KEY: &str = "MODEL_API_KEY";
    pub const MODEL_URL: &str = "MODEL_URL";
    pub const MODEL_NAME: &str = "MODEL_NAME";
    pub const MODEL_MAX_TOKENS: &str = "MODEL_MAX_TOKENS";
    pub const MODEL_TEMPERATURE: &str = "MODEL_TEMPERATURE";
}

/// Default values
pub mod defaults {
    pub const RESPONSES_PER_RUN: usize = 1;
    pub const RUNS_PER_DAY: u32 = 12;
    /// Recent search only reaches back seven days
    pub const MAX_LOOKBACK_HOURS: i64 = 168;
    pub const RESPONSE_PROMPT: &str =
        "Respond to this twitter conversation using less than 280 characters. Do not use hashtags.";
    pub const POST_PROMPT: &str = "Write a short tweet thread about what you find most interesting today. \
         Put each tweet on its own line. Do not use hashtags.";
    pub const AGENT_TOOLS: &str = "twitter_reply";
    pub const MODEL_TEMPERATURE: f32 = 0.0;
}

/// Language model connection settings
#[derive(Debug, Clone, Default)]
pub struct ModelConfig {
    pub api_key: String,
    pub url: Option<String>,
    pub name: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: f32,
    pub system_prompt: Option<String>,
}

/// Immutable agent configuration, validated once at startup
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Agent responds to tweets from these users
    pub key_users: Vec<String>,
    /// Agent only responds to tweets containing this phrase
    pub key_phrase: Option<String>,
    /// Quote the thread root instead of replying to the newest tweet
    pub quote_mode: bool,
    pub responses_per_run: usize,
    pub runs_per_day: u32,
    pub lookback_hours: i64,
    pub search_max_results: Option<u32>,
    pub response_prompt: String,
    pub post_prompt: String,
    pub retry_max: u32,
    pub retry_base_secs: u64,
    pub tools: Vec<String>,
    pub twitter_credentials: Option<TwitterCredentials>,
    pub model: ModelConfig,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key → value source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get_any = |keys: &[&str]| keys.iter().find_map(|&key| get(key));

        let key_users = get(env_vars::KEY_USERS)
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let runs_per_day: u32 = parse_or(&get, env_vars::RUNS_PER_DAY, defaults::RUNS_PER_DAY)?;
        if runs_per_day == 0 || runs_per_day > 24 * 60 {
            return Err(ConfigError::new(format!(
                "{} must be between 1 and 1440, got {}",
                env_vars::RUNS_PER_DAY,
                runs_per_day
            )));
        }

        let default_lookback = (24 / runs_per_day as i64).max(1);
        let lookback_hours: i64 = parse_or(&get, env_vars::LOOKBACK_HOURS, default_lookback)?;
        let lookback_hours = lookback_hours.clamp(1, defaults::MAX_LOOKBACK_HOURS);

        let response_prompt = prompt(
            &get,
            env_vars::RESPONSE_PROMPT_FILE,
            env_vars::RESPONSE_PROMPT,
            defaults::RESPONSE_PROMPT,
        )?;
        let post_prompt = prompt(
            &get,
            env_vars::POST_PROMPT_FILE,
            env_vars::POST_PROMPT,
            defaults::POST_PROMPT,
        )?;

        let twitter_credentials = match (
            get_any(env_vars::TWITTER_CONSUMER_KEY),
            get_any(env_vars::TWITTER_CONSUMER_SECRET),
            get_any(env_vars::TWITTER_ACCESS_TOKEN),
            get_any(env_vars::TWITTER_ACCESS_TOKEN_SECRET),
        ) {
            (Some(ck), Some(cs), Some(at), Some(ats)) => {
                Some(TwitterCredentials::new(ck, cs, at, ats))
            }
            _ => None,
        };

        let model = ModelConfig {
            api_key: get(env_vars::MODEL_API_KEY).unwrap_or_default(),
            url: get(env_vars::MODEL_URL),
            name: get(env_vars::MODEL_NAME),
            max_tokens: get(env_vars::MODEL_MAX_TOKENS).and_then(|v| v.parse().ok()),
            temperature: parse_or(&get, env_vars::MODEL_TEMPERATURE, defaults::MODEL_TEMPERATURE)?,
            system_prompt: get(env_vars::SYSTEM_PROMPT),
        };

        Ok(Self {
            key_users,
            key_phrase: get(env_vars::KEY_PHRASE),
            quote_mode: get(env_vars::QUOTE_MODE)
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
            responses_per_run: parse_or(&get, env_vars::RESPONSES_PER_RUN, defaults::RESPONSES_PER_RUN)?,
            runs_per_day,
            lookback_hours,
            search_max_results: get(env_vars::SEARCH_MAX_RESULTS).and_then(|v| v.parse().ok()),
            response_prompt,
            post_prompt,
            retry_max: parse_or(&get, env_vars::TWITTER_RETRY_MAX, crate::retry::DEFAULT_MAX_RETRIES)?,
            retry_base_secs: parse_or(
                &get,
                env_vars::TWITTER_RETRY_BASE_SECS,
                crate::retry::DEFAULT_BASE_WAIT_SECS,
            )?,
            tools: split_list(&get(env_vars::AGENT_TOOLS).unwrap_or_else(|| defaults::AGENT_TOOLS.to_string())),
            twitter_credentials,
            model,
        })
    }

    /// Seconds between scheduled runs
    pub fn run_interval_secs(&self) -> u64 {
        (24 * 60 * 60) / self.runs_per_day.max(1) as u64
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_start_matches('@').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::new(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}

/// Prompt text from a file (wins), an inline variable, or the default.
fn prompt<G>(get: &G, file_key: &str, inline_key: &str, default: &str) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    if let Some(path) = get(file_key) {
        return load_prompt_file(Path::new(&path));
    }
    Ok(get(inline_key).unwrap_or_else(|| default.to_string()))
}

pub fn load_prompt_file(path: &Path) -> Result<String, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::new(format!("failed to read prompt file {:?}: {}", path, e)))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ConfigError::new(format!("prompt file {:?} is empty", path)));
    }
    Ok(text.to_string())
}
