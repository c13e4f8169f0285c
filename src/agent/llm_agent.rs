//! Single-flow LLM agent (C5, spec.md §4.2): request pre-processors →
//! model call → response post-processors → tool dispatch → loop.

use super::{transfer, Agent, Callback, EventStream};
use crate::context::InvocationContext;
use crate::error::{AgentError, ErrorCode};
use crate::event::Event;
use crate::model::{LlmRequest, Model, ToolDeclaration};
use crate::processors::Pipeline;
use crate::run_config::ContextCacheConfig;
use crate::tools::dispatcher::{self, FunctionCall, ToolCallbacks};
use crate::tools::Tool;
use async_stream::stream;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Instrument;

pub struct LlmAgent {
    name: String,
    description: String,
    model: Arc<dyn Model>,
    instruction: Option<String>,
    output_schema: Option<serde_json::Value>,
    tools: HashMap<String, Arc<dyn Tool>>,
    tool_callbacks: ToolCallbacks,
    cache_config: ContextCacheConfig,
    before_callbacks: Vec<Callback>,
    after_callbacks: Vec<Callback>,
}

pub struct LlmAgentBuilder {
    agent: LlmAgent,
}

impl LlmAgentBuilder {
    pub fn new(name: impl Into<String>, model: Arc<dyn Model>) -> Self {
        LlmAgentBuilder {
            agent: LlmAgent {
                name: name.into(),
                description: String::new(),
                model,
                instruction: None,
                output_schema: None,
                tools: HashMap::new(),
                tool_callbacks: ToolCallbacks::default(),
                cache_config: ContextCacheConfig::default(),
                before_callbacks: Vec::new(),
                after_callbacks: Vec::new(),
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.agent.description = description.into();
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.agent.instruction = Some(instruction.into());
        self
    }

    pub fn output_schema(mut self, schema: serde_json::Value) -> Self {
        self.agent.output_schema = Some(schema);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.agent.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn cache_config(mut self, cache_config: ContextCacheConfig) -> Self {
        self.agent.cache_config = cache_config;
        self
    }

    pub fn before_callback(mut self, callback: Callback) -> Self {
        self.agent.before_callbacks.push(callback);
        self
    }

    pub fn after_callback(mut self, callback: Callback) -> Self {
        self.agent.after_callbacks.push(callback);
        self
    }

    pub fn build(self) -> LlmAgent {
        self.agent
    }
}

impl Agent for LlmAgent {
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
        let model = self.model.clone();
        let tools = self.tools.clone();
        let tool_callbacks = self.tool_callbacks.clone();
        let tool_decls: Vec<ToolDeclaration> = self
            .tools
            .values()
            .map(|t| ToolDeclaration {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters_schema: t.parameters_schema(),
            })
            .collect();
        let output_schema = self.output_schema.clone();
        let pipeline = Pipeline::canonical(
            self.instruction.clone(),
            self.name.clone(),
            self.description.clone(),
            self.output_schema.clone(),
            self.cache_config.clone(),
        );

        let s = stream! {
            loop {
                if let Err(e) = ctx.cost_counter.try_increment(ctx.run_config.max_llm_calls) {
                    yield Ok(Event::new(ctx.invocation_id.as_ref(), &ctx.current_agent, &ctx.branch)
                        .with_error(ErrorCode::LlmCallsLimitExceeded, e.to_string()));
                    ctx.set_end_invocation();
                    return;
                }

                let mut request = LlmRequest::new(model.name(), Vec::new());
                request.config.tools = tool_decls.clone();
                request.config.response_schema = output_schema.clone();

                match pipeline.run_request(&ctx, &mut request).await {
                    Ok(events) => for e in events { yield Ok(e); },
                    Err(e) => { yield Err(e); return; }
                }

                let span = ctx.services.telemetry.model_span(&request.model, ctx.invocation_id.as_ref());

                let mut response_stream = match model.generate_content(request, false).instrument(span).await {
                    Ok(s) => s,
                    Err(e) => {
                        match ctx.services.plugin_manager.on_model_error(&ctx, &e).await {
                            Ok(Some(overridden)) => {
                                Box::pin(futures::stream::once(async move { Ok::<_, AgentError>(overridden) }))
                                    as crate::model::ResponseStream
                            }
                            _ => {
                                yield Ok(Event::new(ctx.invocation_id.as_ref(), &ctx.current_agent, &ctx.branch)
                                    .with_error(e.code(), e.to_string()));
                                ctx.set_end_invocation();
                                return;
                            }
                        }
                    }
                };

                let mut response = match response_stream.next().await {
                    Some(Ok(r)) => r,
                    Some(Err(e)) => {
                        yield Ok(Event::new(ctx.invocation_id.as_ref(), &ctx.current_agent, &ctx.branch)
                            .with_error(e.code(), e.to_string()));
                        ctx.set_end_invocation();
                        return;
                    }
                    None => {
                        yield Err(AgentError::ModelCall("model returned no response".to_string()));
                        return;
                    }
                };
                while !response.turn_complete {
                    match response_stream.next().await {
                        Some(Ok(next)) => response = next,
                        Some(Err(e)) => {
                            yield Ok(Event::new(ctx.invocation_id.as_ref(), &ctx.current_agent, &ctx.branch)
                                .with_error(e.code(), e.to_string()));
                            ctx.set_end_invocation();
                            return;
                        }
                        None => break,
                    }
                }

                ctx.services.telemetry.record_model_call(
                    model.name(),
                    response.finish_reason,
                    response.usage_metadata.as_ref().and_then(|u| u.prompt_token_count).unwrap_or(0),
                    response.usage_metadata.as_ref().and_then(|u| u.candidates_token_count).unwrap_or(0),
                );

                // Run response processors (e.g. output-schema validation) before
                // emitting anything, but yield the model's own event first and
                // any processor-raised events (e.g. a schema-failure error)
                // after it — the caller sees the original model event, then
                // what the pipeline made of it.
                let response_events = match pipeline.run_response(&ctx, &mut response).await {
                    Ok(events) => events,
                    Err(e) => { yield Err(e); return; }
                };

                let cache_decision = pipeline.context_cache.last_decision();
                let mut model_event = Event::new(ctx.invocation_id.as_ref(), &ctx.current_agent, &ctx.branch);
                model_event.usage_metadata = response.usage_metadata.clone();
                model_event.cache_metadata = cache_decision.metadata;
                if let Some(content) = response.content.clone() {
                    model_event = model_event.with_content(content);
                }
                yield Ok(model_event.clone());

                for e in response_events { yield Ok(e); }

                let has_function_calls = model_event.content.as_ref().map(|c| c.has_function_calls()).unwrap_or(false);
                if !has_function_calls {
                    return;
                }

                let calls: Vec<FunctionCall> = model_event
                    .content
                    .as_ref()
                    .map(|c| {
                        c.function_calls()
                            .into_iter()
                            .map(|(id, name, args)| FunctionCall { id: id.to_string(), name: name.to_string(), arguments: args.clone() })
                            .collect()
                    })
                    .unwrap_or_default();

                let responses = dispatcher::dispatch(
                    calls,
                    &tools,
                    &ctx,
                    &ctx.services.plugin_manager,
                    &tool_callbacks,
                    &ctx.services.telemetry,
                )
                .await;

                let mut transfer_target = None;
                for event in &responses {
                    if transfer_target.is_none() {
                        transfer_target = event.actions.transfer_to_agent.clone();
                    }
                    yield Ok(event.clone());
                }

                if let Some(target) = transfer_target {
                    match transfer::resolve(&ctx, &target) {
                        Ok(target_agent) => {
                            let child_ctx = ctx.child(target.clone());
                            let mut inner = super::base::run_async(target_agent, &child_ctx);
                            while let Some(item) = inner.next().await {
                                match item {
                                    Ok(event) => yield Ok(event),
                                    Err(e) => { yield Err(e); return; }
                                }
                            }
                            return;
                        }
                        Err(e) => {
                            yield Ok(Event::new(ctx.invocation_id.as_ref(), &ctx.current_agent, &ctx.branch)
                                .with_error(e.code(), e.to_string()));
                            ctx.set_end_invocation();
                            return;
                        }
                    }
                }
            }
        };

        Box::pin(s)
    }
}
