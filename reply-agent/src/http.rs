//! Process-wide HTTP client.

use once_cell::sync::Lazy;
use std::time::Duration;

static SHARED_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(120))
        .user_agent(concat!("reply-agent/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Failed to build configured HTTP client ({}), using defaults", e);
            reqwest::Client::new()
        })
});

/// Shared connection-pooled client. Clone it; clones share the pool.
pub fn shared_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}
