//! The model adapter external interface (spec.md §6). Concrete provider
//! wire protocols are explicitly out of scope (spec.md §1) — this module
//! only defines the trait the step machine (C5) calls through.

use crate::error::Result;
use crate::event::{Content, UsageMetadata};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<LlmResponse>> + Send>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    ContentFilter,
    ToolCall,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmRequestConfig {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
    pub stop_sequences: Vec<String>,
    pub candidate_count: Option<u32>,
    pub response_schema: Option<serde_json::Value>,
    pub tools: Vec<ToolDeclaration>,
    pub system_instruction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub config: LlmRequestConfig,
    /// Provider-side cache handle, set by the context-cache processor
    /// (C10) when an active cache exists for this agent.
    pub cache_name: Option<String>,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, contents: Vec<Content>) -> Self {
        LlmRequest { model: model.into(), contents, config: LlmRequestConfig::default(), cache_name: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: Option<Content>,
    pub usage_metadata: Option<UsageMetadata>,
    pub finish_reason: Option<FinishReason>,
    pub id: Option<String>,
    /// `false` on the final chunk of a streaming response; always `true`
    /// for a non-streaming call's single response.
    #[serde(default = "default_true")]
    pub turn_complete: bool,
    /// Set by a response processor (e.g. output-schema validation) that
    /// fails without discarding the underlying model event (spec.md §4.4:
    /// "leave the model event in place so the caller sees both").
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

fn default_true() -> bool {
    true
}

impl LlmResponse {
    pub fn final_(content: Content, usage: Option<UsageMetadata>, finish_reason: FinishReason) -> Self {
        LlmResponse {
            content: Some(content),
            usage_metadata: usage,
            finish_reason: Some(finish_reason),
            id: None,
            turn_complete: true,
            error_code: None,
            error_message: None,
        }
    }
}

/// External collaborator (§6): `generateContent(request, streaming?) ->
/// lazy sequence of LlmResponse`.
#[async_trait::async_trait]
pub trait Model: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_content(&self, request: LlmRequest, streaming: bool) -> Result<ResponseStream>;
}
