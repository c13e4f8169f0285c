//! Tool external interface (§6) and the dispatcher (C7).

pub mod dispatcher;

use crate::context::InvocationContext;
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

/// Per-call context handed to a tool's `run`: lets the tool append state
/// deltas without reaching back into the invocation's session directly
/// (§6: "A tool may append events via the tool-context").
pub struct ToolContext {
    pub invocation: InvocationContext,
    pub function_call_id: String,
    state_delta: Mutex<HashMap<String, Value>>,
}

impl ToolContext {
    pub fn new(invocation: InvocationContext, function_call_id: impl Into<String>) -> Self {
        ToolContext {
            invocation,
            function_call_id: function_call_id.into(),
            state_delta: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_state(&self, key: impl Into<String>, value: Value) {
        self.state_delta.lock().insert(key.into(), value);
    }

    pub fn take_state_delta(&self) -> HashMap<String, Value> {
        std::mem::take(&mut *self.state_delta.lock())
    }
}

/// `{name, description, parametersSchema, isLongRunning?, runAsync(args,
/// toolContext) -> value | error}` (§6). Individual tool implementations
/// are out of scope; this crate ships the trait, the dispatcher, and the
/// reserved `transfer_to_agent` tool (agent::transfer).
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({ "type": "object" })
    }

    fn is_long_running(&self) -> bool {
        false
    }

    async fn run(&self, args: Value, ctx: &ToolContext) -> Result<Value>;
}

/// A tool built from a plain async closure — handy for tests and for
/// quickly wiring up simple deterministic tools (`add(a, b) = a + b`).
pub struct FnTool<F> {
    name: String,
    description: String,
    schema: Value,
    f: F,
}

impl<F> FnTool<F>
where
    F: Fn(Value) -> Result<Value> + Send + Sync,
{
    pub fn new(name: impl Into<String>, schema: Value, f: F) -> Self {
        FnTool { name: name.into(), description: String::new(), schema, f }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(Value) -> Result<Value> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn run(&self, args: Value, _ctx: &ToolContext) -> Result<Value> {
        (self.f)(args)
    }
}
