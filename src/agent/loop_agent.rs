//! Loop composite agent (C8, spec.md §4.5): runs its sub-agents
//! sequentially up to `max_iterations` times, exiting early on
//! `endInvocation`, an `exit_loop` tool response, or `max_iterations`.

use super::{base, Agent, Callback, EventStream};
use crate::context::InvocationContext;
use crate::event::Part;
use async_stream::stream;
use futures::StreamExt;
use std::sync::Arc;

pub const EXIT_LOOP_TOOL_NAME: &str = "exit_loop";

pub struct LoopAgent {
    name: String,
    description: String,
    sub_agents: Vec<Arc<dyn Agent>>,
    max_iterations: u32,
    before_callbacks: Vec<Callback>,
    after_callbacks: Vec<Callback>,
}

impl LoopAgent {
    pub fn new(name: impl Into<String>, sub_agents: Vec<Arc<dyn Agent>>, max_iterations: u32) -> Self {
        LoopAgent {
            name: name.into(),
            description: String::new(),
            sub_agents,
            max_iterations,
            before_callbacks: Vec::new(),
            after_callbacks: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

fn requests_exit(event: &crate::event::Event) -> bool {
    event
        .content
        .as_ref()
        .map(|c| c.parts.iter().any(|p| matches!(p, Part::FunctionResponse { name, .. } if name == EXIT_LOOP_TOOL_NAME)))
        .unwrap_or(false)
}

impl Agent for LoopAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn before_callbacks(&self) -> &[Callback] {
        &self.before_callbacks
    }

    fn after_callbacks(&self) -> &[Callback] {
        &self.after_callbacks
    }

    fn run_async_impl(&self, ctx: InvocationContext) -> EventStream {
        let sub_agents = self.sub_agents.clone();
        let max_iterations = self.max_iterations;

        let s = stream! {
            if max_iterations == 0 {
                return;
            }
            let mut remaining = max_iterations;

            'outer: loop {
                for sub_agent in &sub_agents {
                    let mut inner = base::run_async(sub_agent.clone(), &ctx);
                    let mut should_exit = false;
                    while let Some(item) = inner.next().await {
                        match item {
                            Ok(event) => {
                                if requests_exit(&event) {
                                    should_exit = true;
                                }
                                yield Ok(event);
                            }
                            Err(e) => { yield Err(e); return; }
                        }
                    }
                    if should_exit || ctx.is_end_invocation() {
                        break 'outer;
                    }
                }

                remaining -= 1;
                if remaining == 0 {
                    break;
                }
            }
        };

        Box::pin(s)
    }
}
