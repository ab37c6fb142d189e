mod executor;
mod registry;
mod selector;

pub use executor::{AgentExecutor, AgentRun, CANCELLATION_NOTICE};
pub use registry::ToolRegistry;
pub use selector::ToolSelector;
