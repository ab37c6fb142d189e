pub mod agent;
pub mod config;
pub mod error;
pub mod memory;
pub mod providers;
pub mod tools;
pub mod traits;

pub use agent::{AgentExecutor, AgentRun, CANCELLATION_NOTICE, ToolRegistry, ToolSelector};
pub use config::*;
pub use error::AgentError;
pub use memory::*;
pub use providers::*;
pub use tools::*;
pub use traits::*;
