//! Request/response processor pipeline (C6, spec.md §4.4).
//!
//! Each processor exposes `runAsync(ctx, request|response) -> lazy event
//! sequence` while mutating its argument in place, organized as an ordered
//! phase list rather than a fixed struct of named fields. Emitted events
//! are returned to the caller so the step machine can forward them before
//! the pipeline continues.

pub mod auth;
pub mod basic;
pub mod code_execution;
pub mod context_cache;
pub mod contents;
pub mod identity;
pub mod instructions;
pub mod nl_planning;
pub mod output_schema;
pub mod shared_memory;

use crate::context::InvocationContext;
use crate::error::Result;
use crate::event::Event;
use crate::model::{LlmRequest, LlmResponse};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait RequestProcessor: Send + Sync {
    async fn process(&self, ctx: &InvocationContext, request: &mut LlmRequest) -> Result<Vec<Event>>;
}

#[async_trait]
pub trait ResponseProcessor: Send + Sync {
    async fn process(&self, ctx: &InvocationContext, response: &mut LlmResponse) -> Result<Vec<Event>>;
}

/// An ordered, composable pipeline — "data, not subclasses" per design
/// note §9: a custom single-flow is the default list plus/minus named
/// entries, so stages are stored as a plain `Vec` rather than a fixed
/// struct of fields.
#[derive(Clone)]
pub struct Pipeline {
    pub request_stages: Vec<Arc<dyn RequestProcessor>>,
    pub response_stages: Vec<Arc<dyn ResponseProcessor>>,
    /// Kept as a concrete handle (not just inside `request_stages`) so the
    /// step machine can read back the cache decision it made (C10) after
    /// the request phase runs, to stamp the model event's `cacheMetadata`.
    pub context_cache: Arc<context_cache::ContextCacheProcessor>,
}

impl Pipeline {
    /// The canonical order from spec.md §4.4: basic → auth → instructions
    /// → identity → contents → shared-memory → context-cache →
    /// NL-planning → code-execution (pre); NL-planning → output-schema →
    /// code-execution (post).
    pub fn canonical(
        instruction: Option<String>,
        agent_name: impl Into<String>,
        agent_description: impl Into<String>,
        output_schema: Option<serde_json::Value>,
        cache_config: crate::run_config::ContextCacheConfig,
    ) -> Self {
        let context_cache = Arc::new(context_cache::ContextCacheProcessor::new(cache_config));
        Pipeline {
            request_stages: vec![
                Arc::new(basic::BasicProcessor),
                Arc::new(auth::AuthProcessor),
                Arc::new(instructions::InstructionsProcessor::new(instruction)),
                Arc::new(identity::IdentityProcessor::new(agent_name, agent_description)),
                Arc::new(contents::ContentsProcessor),
                Arc::new(shared_memory::SharedMemoryProcessor),
                context_cache.clone() as Arc<dyn RequestProcessor>,
                Arc::new(nl_planning::NlPlanningPreProcessor),
                Arc::new(code_execution::CodeExecutionPreProcessor),
            ],
            response_stages: vec![
                Arc::new(nl_planning::NlPlanningPostProcessor),
                Arc::new(output_schema::OutputSchemaProcessor::new(output_schema)),
                Arc::new(code_execution::CodeExecutionPostProcessor),
            ],
            context_cache,
        }
    }

    pub async fn run_request(&self, ctx: &InvocationContext, request: &mut LlmRequest) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        for stage in &self.request_stages {
            events.extend(stage.process(ctx, request).await?);
        }
        Ok(events)
    }

    pub async fn run_response(&self, ctx: &InvocationContext, response: &mut LlmResponse) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        for stage in &self.response_stages {
            events.extend(stage.process(ctx, response).await?);
        }
        Ok(events)
    }
}
