//! LangGraph-style directed-graph executor (C8, spec.md §4.5). Each node
//! wraps one sub-agent; after a node's agent finishes, control follows
//! the node's declared `targets`. Cycles are permitted; termination
//! relies on a `max_steps` bound or an `endInvocation` signal.
//!
//! Open gap in spec.md: a node's `targets` is a list, but the rule for
//! picking among multiple targets when more than one is declared is not
//! specified. This implementation always follows the first declared
//! target — see DESIGN.md.

use super::{base, Agent, Callback, EventStream};
use crate::context::InvocationContext;
use async_stream::stream;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;

pub struct GraphNode {
    pub agent: Arc<dyn Agent>,
    pub targets: Vec<String>,
}

pub struct GraphAgent {
    name: String,
    description: String,
    root: String,
    nodes: HashMap<String, GraphNode>,
    max_steps: u32,
    before_callbacks: Vec<Callback>,
    after_callbacks: Vec<Callback>,
}

impl GraphAgent {
    pub fn new(name: impl Into<String>, root: impl Into<String>, nodes: HashMap<String, GraphNode>, max_steps: u32) -> Self {
        GraphAgent {
            name: name.into(),
            description: String::new(),
            root: root.into(),
            nodes,
            max_steps,
            before_callbacks: Vec::new(),
            after_callbacks: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Agent for GraphAgent {
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
        let nodes: HashMap<String, (Arc<dyn Agent>, Vec<String>)> = self
            .nodes
            .iter()
            .map(|(k, v)| (k.clone(), (v.agent.clone(), v.targets.clone())))
            .collect();
        let mut current = Some(self.root.clone());
        let max_steps = self.max_steps;

        let s = stream! {
            let mut steps = 0u32;

            while let Some(node_name) = current.take() {
                steps += 1;
                if steps > max_steps {
                    log::warn!("graph agent exceeded max_steps ({max_steps}) at node '{node_name}'");
                    break;
                }

                let Some((agent, targets)) = nodes.get(&node_name) else {
                    yield Err(crate::error::AgentError::Internal(format!("unknown graph node '{node_name}'")));
                    return;
                };

                let mut inner = base::run_async(agent.clone(), &ctx);
                while let Some(item) = inner.next().await {
                    match item {
                        Ok(event) => yield Ok(event),
                        Err(e) => { yield Err(e); return; }
                    }
                }

                if ctx.is_end_invocation() {
                    break;
                }

                current = targets.first().cloned();
            }
        };

        Box::pin(s)
    }
}
