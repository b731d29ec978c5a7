use crate::tools::Tool;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{Duration, MissedTickBehavior, interval};

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Seconds between ticks (24h / RUNS_PER_DAY)
    pub interval_secs: u64,
    /// Run a single tick and return
    pub run_once: bool,
}

/// Runs every configured tool once per tick, strictly one after another.
pub struct Scheduler {
    tools: Vec<Arc<dyn Tool>>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(tools: Vec<Arc<dyn Tool>>, config: SchedulerConfig) -> Self {
        Scheduler { tools, config }
    }

    /// Tick immediately, then every `interval_secs` until shutdown.
    pub async fn start(self: Arc<Self>, mut shutdown_rx: oneshot::Receiver<()>) {
        if self.config.run_once {
            self.tick().await;
            return;
        }

        log::info!(
            "[SCHEDULER] Started ({} tool(s), every {}s)",
            self.tools.len(),
            self.config.interval_secs
        );

        let mut run_interval = interval(Duration::from_secs(self.config.interval_secs.max(1)));
        // A slow run pushes the next one back instead of bunching ticks
        run_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    log::info!("[SCHEDULER] Received shutdown signal");
                    break;
                }
                _ = run_interval.tick() => {
                    self.tick().await;
                }
            }
        }

        log::info!("[SCHEDULER] Stopped");
    }

    /// Run every tool once. Returns how many failed.
    pub async fn tick(&self) -> usize {
        let mut failures = 0;
        for tool in &self.tools {
            log::info!("[SCHEDULER] Running {}", tool.name());
            match tool.run().await {
                Ok(summary) => log::info!("[SCHEDULER] {} finished: {}", tool.name(), summary),
                Err(e) => {
                    failures += 1;
                    log::error!("[SCHEDULER] {} failed: {}", tool.name(), e);
                }
            }
        }
        failures
    }
}
