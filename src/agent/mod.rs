//! Agent handles: stateful proxies for conversational roles.

pub mod handle;

pub use handle::{AgentError, AgentHandle, AgentOptions};
