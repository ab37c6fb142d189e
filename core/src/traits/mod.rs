pub mod provider;
pub mod tool;

pub use provider::{ChatMessage, ChatRequest, ImageProvider, Provider};
pub use tool::{ExecuteOptions, Tool, ToolArgs, ToolId, ToolOutput};
