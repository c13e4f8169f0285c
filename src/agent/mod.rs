//! The agent tree: a shared `Agent` capability (C4's "dynamic dispatch on
//! agent kind maps to a tagged variant with a shared run capability",
//! design note §9) plus the base lifecycle, the single-flow LLM agent,
//! the composite agents, and the transfer controller.

pub mod base;
pub mod graph;
pub mod llm_agent;
pub mod loop_agent;
pub mod parallel;
pub mod sequential;
pub mod transfer;

use crate::context::InvocationContext;
use crate::error::Result;
use crate::event::{Content, Event};
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<Event>> + Send>>;

/// Callback arrays of heterogeneous arity collapse to one uniform
/// signature, per design note §9: `(callback-context) -> optional
/// content`.
pub type Callback = Arc<dyn Fn(&InvocationContext) -> Result<Option<Content>> + Send + Sync>;

/// Shared capability every agent kind implements. `run_async_impl` is the
/// agent-specific body the base lifecycle (`base::run_async`) wraps with
/// before/after-callback handling; it is not itself `async fn` because it
/// returns a lazy stream rather than a single future — the agent-specific
/// work happens as the stream is polled.
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn before_callbacks(&self) -> &[Callback] {
        &[]
    }

    fn after_callbacks(&self) -> &[Callback] {
        &[]
    }

    fn run_async_impl(&self, ctx: InvocationContext) -> EventStream;
}

/// Builds the flat name→agent registry the transfer controller and
/// composite agents use, by walking a caller-supplied tree description.
/// Agent trees are immutable after construction (spec.md §5), so this is
/// a one-time build at invocation-runner setup, not a runtime operation.
pub fn build_registry(agents: Vec<Arc<dyn Agent>>) -> std::collections::HashMap<String, Arc<dyn Agent>> {
    agents.into_iter().map(|a| (a.name().to_string(), a)).collect()
}
