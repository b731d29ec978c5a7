use crate::error::{AgentError, ConfigError};
use crate::tools::types::ToolContext;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait that all scheduled tools implement
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run once. Returns a one-line summary for the scheduler log.
    async fn run(&self) -> Result<String, AgentError>;
}

pub type ToolConstructor = fn(&ToolContext) -> Result<Arc<dyn Tool>, ConfigError>;

/// Static description of a tool: its name, what it needs, how to build it
#[derive(Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Each entry is a set of alternative variable names; one must be set
    pub required_env: &'static [&'static [&'static str]],
    pub constructor: ToolConstructor,
}

impl ToolSpec {
    /// First name of every requirement with no value in `lookup`
    pub fn missing_env<F>(&self, lookup: &F) -> Vec<&'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.required_env
            .iter()
            .filter(|alternatives| {
                !alternatives
                    .iter()
                    .any(|&key| lookup(key).is_some_and(|v| !v.trim().is_empty()))
            })
            .filter_map(|alternatives| alternatives.first().copied())
            .collect()
    }
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("required_env", &self.required_env)
            .finish()
    }
}

/// Registry of every tool the agent can be configured to run
pub struct ToolRegistry {
    specs: HashMap<&'static str, ToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry {
            specs: HashMap::new(),
        }
    }

    pub fn register(&mut self, spec: ToolSpec) {
        self.specs.insert(spec.name, spec);
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.specs.get(name)
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.specs.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Resolve the selected names and check their environment requirements.
    ///
    /// Duplicates are dropped; the first occurrence keeps its position.
    pub fn validate<F>(&self, selected: &[String], lookup: F) -> Result<Vec<ToolSpec>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if selected.is_empty() {
            return Err(ConfigError::new("AGENT_TOOLS selects no tools"));
        }

        let mut specs: Vec<ToolSpec> = Vec::new();
        for name in selected {
            let spec = self.get(name).ok_or_else(|| {
                ConfigError::new(format!(
                    "unknown tool '{}' (available: {})",
                    name,
                    self.names().join(", ")
                ))
            })?;

            let missing = spec.missing_env(&lookup);
            if !missing.is_empty() {
                return Err(ConfigError::new(format!(
                    "tool '{}' requires {}",
                    spec.name,
                    missing.join(", ")
                )));
            }

            if !specs.iter().any(|s| s.name == spec.name) {
                specs.push(*spec);
            }
        }

        log::info!(
            "[REGISTRY] Selected tools: {}",
            specs.iter().map(|s| s.name).collect::<Vec<_>>().join(", ")
        );
        Ok(specs)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Construct every validated tool against shared clients.
pub fn build_tools(specs: &[ToolSpec], context: &ToolContext) -> Result<Vec<Arc<dyn Tool>>, ConfigError> {
    specs
        .iter()
        .map(|spec| {
            log::debug!("[REGISTRY] Building {} ({})", spec.name, spec.description);
            (spec.constructor)(context)
        })
        .collect()
}
