pub mod builtin;
pub mod registry;
pub mod types;

pub use registry::{Tool, ToolRegistry, build_tools};
pub use types::ToolContext;

/// Register all built-in tools to a registry
fn register_all_tools(registry: &mut ToolRegistry) {
    registry.register(builtin::REPLY_SPEC);
    registry.register(builtin::POST_SPEC);
}

/// Create a new ToolRegistry with all built-in tools registered
pub fn create_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_all_tools(&mut registry);
    registry
}
