//! Built-in agent kinds
//!
//! These differ only in how they `execute`: through a model backend,
//! through a tool executor, or through a host-supplied closure.

mod func;
mod llm;
mod tool;

pub use func::FnAgent;
pub use llm::{LlmAgent, LlmAgentBuilder};
pub use tool::ToolAgent;

fn to_tags<I, S>(capabilities: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    capabilities.into_iter().map(Into::into).collect()
}
