//! Plugin manager (§6): lifecycle hooks that run before the equivalent
//! agent-supplied callback and whose first non-empty return value
//! overrides default behavior, exactly as agent-supplied before/after
//! callbacks do in the base agent lifecycle (§4.1).
//!
//! Ships a `NoopPluginManager` and a `CallbackPluginManager` so embedders
//! are not forced to implement every hook to get started, grounded in the
//! teacher's `plugin_manager: Option<Arc<PluginManager>>` pattern.

use crate::context::InvocationContext;
use crate::error::{AgentError, Result};
use crate::event::{Content, Event};
use crate::model::{LlmRequest, LlmResponse};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait PluginManager: Send + Sync {
    async fn before_agent(&self, _ctx: &InvocationContext) -> Result<Option<Content>> {
        Ok(None)
    }

    async fn after_agent(&self, _ctx: &InvocationContext) -> Result<Option<Content>> {
        Ok(None)
    }

    /// Returning `Some(response)` short-circuits the model call entirely.
    async fn before_model(
        &self,
        _ctx: &InvocationContext,
        _request: &mut LlmRequest,
    ) -> Result<Option<LlmResponse>> {
        Ok(None)
    }

    async fn after_model(&self, _ctx: &InvocationContext, _response: &mut LlmResponse) -> Result<()> {
        Ok(())
    }

    /// Returning `Some(value)` short-circuits the tool call and is used as
    /// its result directly.
    async fn before_tool(
        &self,
        _ctx: &InvocationContext,
        _tool_name: &str,
        _args: &mut Value,
    ) -> Result<Option<Value>> {
        Ok(None)
    }

    async fn after_tool(&self, _ctx: &InvocationContext, _tool_name: &str, _result: &mut Value) -> Result<()> {
        Ok(())
    }

    async fn on_event(&self, _ctx: &InvocationContext, _event: &Event) -> Result<()> {
        Ok(())
    }

    async fn on_user_message(&self, _ctx: &InvocationContext, _content: &Content) -> Result<()> {
        Ok(())
    }

    /// Returning `Some(response)` lets the invocation continue with an
    /// override response instead of failing (spec.md §7).
    async fn on_model_error(
        &self,
        _ctx: &InvocationContext,
        _error: &AgentError,
    ) -> Result<Option<LlmResponse>> {
        Ok(None)
    }

    async fn on_tool_error(
        &self,
        _ctx: &InvocationContext,
        _tool_name: &str,
        _error: &AgentError,
    ) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// Default plugin manager: every hook is a no-op.
pub struct NoopPluginManager;

impl PluginManager for NoopPluginManager {}

type BeforeAgentHook = Box<dyn Fn(&InvocationContext) -> Result<Option<Content>> + Send + Sync>;
type OnEventHook = Box<dyn Fn(&InvocationContext, &Event) -> Result<()> + Send + Sync>;

/// A `PluginManager` built by registering closures per hook rather than
/// implementing the trait. Only `before_agent`/`after_agent`/`on_event`
/// are exposed this way — the remaining hooks touch `LlmRequest`/
/// `LlmResponse` by mutable reference and are easier to implement by hand
/// via the trait directly.
#[derive(Default)]
pub struct CallbackPluginManager {
    before_agent_hooks: Vec<BeforeAgentHook>,
    after_agent_hooks: Vec<BeforeAgentHook>,
    on_event_hooks: Vec<OnEventHook>,
}

impl CallbackPluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_before_agent(
        mut self,
        hook: impl Fn(&InvocationContext) -> Result<Option<Content>> + Send + Sync + 'static,
    ) -> Self {
        self.before_agent_hooks.push(Box::new(hook));
        self
    }

    pub fn with_after_agent(
        mut self,
        hook: impl Fn(&InvocationContext) -> Result<Option<Content>> + Send + Sync + 'static,
    ) -> Self {
        self.after_agent_hooks.push(Box::new(hook));
        self
    }

    pub fn with_on_event(
        mut self,
        hook: impl Fn(&InvocationContext, &Event) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_event_hooks.push(Box::new(hook));
        self
    }
}

#[async_trait]
impl PluginManager for CallbackPluginManager {
    async fn before_agent(&self, ctx: &InvocationContext) -> Result<Option<Content>> {
        for hook in &self.before_agent_hooks {
            if let Some(content) = hook(ctx)? {
                return Ok(Some(content));
            }
        }
        Ok(None)
    }

    async fn after_agent(&self, ctx: &InvocationContext) -> Result<Option<Content>> {
        for hook in &self.after_agent_hooks {
            if let Some(content) = hook(ctx)? {
                return Ok(Some(content));
            }
        }
        Ok(None)
    }

    async fn on_event(&self, ctx: &InvocationContext, event: &Event) -> Result<()> {
        for hook in &self.on_event_hooks {
            hook(ctx, event)?;
        }
        Ok(())
    }
}
