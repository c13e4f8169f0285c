//! Parallel composite agent (C8, spec.md §4.5): isolated branch per
//! sub-agent, merged with the bounded-fairness merge.

use super::{base, Agent, Callback, EventStream};
use crate::context::InvocationContext;
use crate::event::{Content, Event, Role};
use futures::Stream;
use jsonschema::validator_for;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

/// Always yields exactly one event at a time: on each poll, streams are
/// checked in declaration order and the first one with a ready item wins;
/// a stream is never advanced again until the caller polls for the next
/// item (spec.md §4.5, §5(iii)) — this guarantees per-stream ordering and
/// at most one event buffered at a time.
struct BoundedFairMerge {
    streams: Vec<Option<EventStream>>,
}

impl Stream for BoundedFairMerge {
    type Item = crate::error::Result<Event>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        for slot in this.streams.iter_mut() {
            if let Some(stream) = slot {
                match stream.as_mut().poll_next(cx) {
                    Poll::Ready(Some(item)) => return Poll::Ready(Some(item)),
                    Poll::Ready(None) => *slot = None,
                    Poll::Pending => {}
                }
            }
        }
        if this.streams.iter().all(|s| s.is_none()) {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}

pub struct ParallelAgent {
    name: String,
    description: String,
    sub_agents: Vec<Arc<dyn Agent>>,
    /// Sub-agent name → state-delta key, for the trailing consolidation
    /// event (spec.md §4.5's "if any sub-agent declares an outputKey").
    output_keys: HashMap<String, String>,
    output_schema: Option<serde_json::Value>,
    before_callbacks: Vec<Callback>,
    after_callbacks: Vec<Callback>,
}

impl ParallelAgent {
    pub fn new(name: impl Into<String>, sub_agents: Vec<Arc<dyn Agent>>) -> Self {
        ParallelAgent {
            name: name.into(),
            description: String::new(),
            sub_agents,
            output_keys: HashMap::new(),
            output_schema: None,
            before_callbacks: Vec::new(),
            after_callbacks: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_output_key(mut self, sub_agent_name: impl Into<String>, key: impl Into<String>) -> Self {
        self.output_keys.insert(sub_agent_name.into(), key.into());
        self
    }

    pub fn with_output_schema(mut self, schema: serde_json::Value) -> Self {
        self.output_schema = Some(schema);
        self
    }
}

impl Agent for ParallelAgent {
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
        let output_keys = self.output_keys.clone();
        let output_schema = self.output_schema.clone();
        let name = self.name.clone();
        let sub_agent_order: Vec<String> = self.sub_agents.iter().map(|a| a.name().to_string()).collect();

        let s = async_stream::stream! {
            use futures::StreamExt;

            let streams: Vec<Option<EventStream>> = sub_agents
                .iter()
                .map(|sub_agent| {
                    let branch_ctx = ctx.isolated_branch(sub_agent.name());
                    Some(base::run_async(sub_agent.clone(), &branch_ctx))
                })
                .collect();
            let mut merged = BoundedFairMerge { streams };

            let mut last_final_by_agent: HashMap<String, String> = HashMap::new();
            let mut last_emitted_final_text: Option<String> = None;

            while let Some(item) = merged.next().await {
                match item {
                    Ok(event) => {
                        if event.is_final_response() {
                            if let Some(content) = &event.content {
                                let text = content.text();
                                last_final_by_agent.insert(event.author.clone(), text.clone());
                                last_emitted_final_text = Some(text);
                            }
                        }
                        yield Ok(event);
                    }
                    Err(e) => { yield Err(e); return; }
                }
                if ctx.is_end_invocation() {
                    return;
                }
            }

            if !output_keys.is_empty() {
                let mut state_delta = HashMap::new();
                for (agent_name, key) in &output_keys {
                    if let Some(text) = last_final_by_agent.get(agent_name) {
                        state_delta.insert(key.clone(), serde_json::Value::String(text.clone()));
                    }
                }
                let mut event = Event::new(ctx.invocation_id.as_ref(), &name, &ctx.branch);
                event.actions.state_delta = state_delta;
                yield Ok(event);
            }

            if let Some(schema) = &output_schema {
                let concatenated = sub_agent_order
                    .iter()
                    .filter_map(|n| last_final_by_agent.get(n))
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("\n");

                let candidates = [last_emitted_final_text.clone(), Some(concatenated)];
                let mut validated = None;
                if let Ok(validator) = validator_for(schema) {
                    for candidate in candidates.iter().flatten() {
                        if let Ok(value) = serde_json::from_str::<serde_json::Value>(candidate) {
                            if validator.is_valid(&value) {
                                validated = Some(candidate.clone());
                                break;
                            }
                        }
                    }
                }

                let has_validated = validated.is_some();
                match validated.or(last_emitted_final_text.clone()) {
                    Some(text) if has_validated => {
                        yield Ok(Event::new(ctx.invocation_id.as_ref(), &name, &ctx.branch)
                            .with_content(Content { role: Role::Model, parts: vec![crate::event::Part::text(text)] }));
                    }
                    Some(text) => {
                        log::warn!("parallel agent '{name}' output failed schema validation; emitting raw text");
                        yield Ok(Event::new(ctx.invocation_id.as_ref(), &name, &ctx.branch)
                            .with_content(Content { role: Role::Model, parts: vec![crate::event::Part::text(text)] }));
                    }
                    None => {}
                }
            }
        };

        Box::pin(s)
    }
}
