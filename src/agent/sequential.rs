//! Sequential composite agent (C8, spec.md §4.5).

use super::{base, Agent, Callback, EventStream};
use crate::context::InvocationContext;
use crate::event::{Content, Event, Role};
use async_stream::stream;
use futures::StreamExt;
use jsonschema::validator_for;
use std::sync::Arc;

pub struct SequentialAgent {
    name: String,
    description: String,
    sub_agents: Vec<Arc<dyn Agent>>,
    output_schema: Option<serde_json::Value>,
    before_callbacks: Vec<Callback>,
    after_callbacks: Vec<Callback>,
}

impl SequentialAgent {
    pub fn new(name: impl Into<String>, sub_agents: Vec<Arc<dyn Agent>>) -> Self {
        SequentialAgent {
            name: name.into(),
            description: String::new(),
            sub_agents,
            output_schema: None,
            before_callbacks: Vec::new(),
            after_callbacks: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_output_schema(mut self, schema: serde_json::Value) -> Self {
        self.output_schema = Some(schema);
        self
    }
}

impl Agent for SequentialAgent {
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
        let output_schema = self.output_schema.clone();
        let name = self.name.clone();

        let s = stream! {
            let mut last_final_text: Option<String> = None;

            for sub_agent in &sub_agents {
                let mut inner = base::run_async(sub_agent.clone(), &ctx);
                while let Some(item) = inner.next().await {
                    match item {
                        Ok(event) => {
                            if event.is_final_response() {
                                if let Some(content) = &event.content {
                                    last_final_text = Some(content.text());
                                }
                            }
                            yield Ok(event);
                        }
                        Err(e) => { yield Err(e); return; }
                    }
                }
                if ctx.is_end_invocation() {
                    return;
                }
            }

            let Some(schema) = &output_schema else { return };
            let Some(text) = last_final_text else { return };

            let validated = validator_for(schema)
                .ok()
                .filter(|v| serde_json::from_str::<serde_json::Value>(&text).map(|value| v.is_valid(&value)).unwrap_or(false));

            match validated {
                Some(_) => {
                    yield Ok(Event::new(ctx.invocation_id.as_ref(), &name, &ctx.branch)
                        .with_content(Content { role: Role::Model, parts: vec![crate::event::Part::text(text)] }));
                }
                None => {
                    log::warn!("sequential agent '{name}' output failed schema validation; emitting raw text");
                    yield Ok(Event::new(ctx.invocation_id.as_ref(), &name, &ctx.branch)
                        .with_content(Content { role: Role::Model, parts: vec![crate::event::Part::text(text)] }));
                }
            }
        };

        Box::pin(s)
    }
}
