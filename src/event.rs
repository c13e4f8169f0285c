//! The immutable event record (C2) and its associated value types.
//!
//! An `Event` is one step in an invocation: a message turn, a model
//! response, a tool call/response, a transfer, or a pure state mutation.
//! Events are append-only once handed to a `SessionService` — nothing in
//! this module mutates a constructed `Event` in place from the outside;
//! builders return a new value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved author name for events originated by the end user.
pub const USER_AUTHOR: &str = "user";

/// One piece of message content: text, a function call, a function
/// response, or an inline blob (e.g. an image).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text { text: String },
    FunctionCall { id: String, name: String, arguments: serde_json::Value },
    FunctionResponse { id: String, name: String, response: serde_json::Value, is_error: bool },
    InlineData { mime_type: String, data: Vec<u8> },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn function_call(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Part::FunctionCall { id: id.into(), name: name.into(), arguments }
    }

    pub fn function_response(
        id: impl Into<String>,
        name: impl Into<String>,
        response: serde_json::Value,
        is_error: bool,
    ) -> Self {
        Part::FunctionResponse { id: id.into(), name: name.into(), response, is_error }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_function_call(&self) -> Option<(&str, &str, &serde_json::Value)> {
        match self {
            Part::FunctionCall { id, name, arguments } => Some((id, name, arguments)),
            _ => None,
        }
    }
}

/// Role of the speaker for a `Content` block, following the common
/// user/model/tool three-way split used by chat-completion APIs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Content { role: Role::User, parts: vec![Part::text(text)] }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Content { role: Role::Model, parts: vec![Part::text(text)] }
    }

    /// Concatenation of all text parts, in order, with no separator beyond
    /// what the parts themselves carry.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(|p| p.as_text()).collect::<Vec<_>>().join("")
    }

    pub fn function_calls(&self) -> Vec<(&str, &str, &serde_json::Value)> {
        self.parts.iter().filter_map(|p| p.as_function_call()).collect()
    }

    pub fn has_function_calls(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::FunctionCall { .. }))
    }
}

/// Opaque pass-through for the underspecified session-compaction action
/// (design note §9). The runtime carries this field end to end but never
/// interprets it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompactionAction {
    pub compacted_content: serde_json::Value,
    pub start_ts: i64,
    pub end_ts: i64,
}

/// Side effects an event carries besides its content.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EventActions {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub state_delta: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_to_agent: Option<String>,
    #[serde(default)]
    pub end_invocation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compaction: Option<CompactionAction>,
}

impl EventActions {
    pub fn is_empty(&self) -> bool {
        self.state_delta.is_empty()
            && self.transfer_to_agent.is_none()
            && !self.end_invocation
            && self.compaction.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u64>,
    pub candidates_token_count: Option<u64>,
}

/// Bookkeeping for reusing a provider-side prompt cache across invocations
/// (C10's unit of work — see `processors::context_cache`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheMetadata {
    pub cache_name: Option<String>,
    pub expire_time: Option<chrono::DateTime<chrono::Utc>>,
    pub fingerprint: String,
    pub invocations_used: u32,
    pub contents_count: usize,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl CacheMetadata {
    /// A cache is active when it has a provider-side handle, has not
    /// expired, and has not exhausted its configured interval budget.
    pub fn is_active(&self, now: chrono::DateTime<chrono::Utc>, cache_intervals: u32) -> bool {
        self.cache_name.is_some()
            && self.expire_time.map(|t| t > now).unwrap_or(false)
            && self.invocations_used < cache_intervals
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

/// One immutable step in an invocation (C2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: String,
    pub invocation_id: String,
    pub author: String,
    pub branch: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default)]
    pub actions: EventActions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_metadata: Option<CacheMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl Event {
    /// Builds an event stamped with a fresh id and the given invocation
    /// id/author/branch; `timestamp` is left to the `SessionService` to
    /// assign on append (invariant: monotonically increasing per session).
    pub fn new(invocation_id: impl Into<String>, author: impl Into<String>, branch: impl Into<String>) -> Self {
        Event {
            id: uuid::Uuid::new_v4().to_string(),
            invocation_id: invocation_id.into(),
            author: author.into(),
            branch: branch.into(),
            timestamp: chrono::Utc::now(),
            content: None,
            actions: EventActions::default(),
            usage_metadata: None,
            cache_metadata: None,
            grounding_metadata: None,
            error: None,
        }
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_actions(mut self, actions: EventActions) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_error(mut self, code: crate::error::ErrorCode, message: impl Into<String>) -> Self {
        self.error = Some(ErrorInfo { code: code.as_str().to_string(), message: message.into() });
        self
    }

    /// Invariant: an event is a final response iff it has content, no
    /// pending function-calls, and no transfer action (spec.md §3).
    pub fn is_final_response(&self) -> bool {
        self.actions.transfer_to_agent.is_none()
            && match &self.content {
                Some(c) => !c.has_function_calls(),
                None => false,
            }
    }
}
