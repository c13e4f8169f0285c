//! Tool dispatcher (C7): finds a tool by name, validates arguments, runs
//! it, wraps errors, produces function-response events. All calls within
//! one step dispatch concurrently; the *emitted* events preserve the
//! order of call ids in the request regardless of completion order
//! (spec.md §4.3, §5).

use super::{Tool, ToolContext};
use crate::context::InvocationContext;
use crate::error::ErrorCode;
use crate::event::{Event, Part};
use crate::plugin::PluginManager;
use crate::telemetry::Telemetry;
use jsonschema::validator_for;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Reserved tool name that carries a transfer-of-control action instead of
/// an ordinary result (§4.3, §4.6).
pub const TRANSFER_TOOL_NAME: &str = "transfer_to_agent";

pub struct FunctionCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Agent-level before/after tool callbacks — run in addition to, and
/// after, the plugin manager's hooks (§4.1's "plugin callbacks always run
/// before user-supplied callbacks").
pub type BeforeToolCallback =
    Arc<dyn Fn(&str, &mut Value) -> crate::error::Result<Option<Value>> + Send + Sync>;
pub type AfterToolCallback = Arc<dyn Fn(&str, &mut Value) -> crate::error::Result<()> + Send + Sync>;

#[derive(Default, Clone)]
pub struct ToolCallbacks {
    pub before: Option<BeforeToolCallback>,
    pub after: Option<AfterToolCallback>,
}

fn validate_args(tool: &dyn Tool, args: &Value) -> Result<(), String> {
    let schema = tool.parameters_schema();
    match validator_for(&schema) {
        Ok(validator) => {
            let errors: Vec<String> = validator.iter_errors(args).map(|e| e.to_string()).collect();
            if errors.is_empty() {
                Ok(())
            } else {
                Err(errors.join("; "))
            }
        }
        // A malformed declared schema should not crash dispatch; treat as
        // unvalidated rather than a hard failure.
        Err(_) => Ok(()),
    }
}

async fn run_one(
    call: FunctionCall,
    tools: &HashMap<String, Arc<dyn Tool>>,
    invocation: &InvocationContext,
    plugin_manager: &Arc<dyn PluginManager>,
    callbacks: &ToolCallbacks,
    telemetry: &Arc<dyn Telemetry>,
) -> Event {
    let span = telemetry.tool_span(&call.name, &call.id, &invocation.invocation_id);
    run_one_inner(call, tools, invocation, plugin_manager, callbacks, telemetry)
        .instrument(span)
        .await
}

/// Body of `run_one`, instrumented from the outside rather than via
/// `span.enter()` — an `Entered` guard is `!Send` and this function awaits
/// across several `.await` points, which would make the whole dispatch
/// future `!Send`.
async fn run_one_inner(
    call: FunctionCall,
    tools: &HashMap<String, Arc<dyn Tool>>,
    invocation: &InvocationContext,
    plugin_manager: &Arc<dyn PluginManager>,
    callbacks: &ToolCallbacks,
    telemetry: &Arc<dyn Telemetry>,
) -> Event {
    let agent = invocation.current_agent.clone();
    let started = Instant::now();

    if call.name == TRANSFER_TOOL_NAME {
        let target = call
            .arguments
            .get("agent_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let mut event = Event::new(invocation.invocation_id.as_ref(), &agent, &invocation.branch).with_content(
            crate::event::Content {
                role: crate::event::Role::Tool,
                parts: vec![Part::function_response(
                    call.id.clone(),
                    call.name.clone(),
                    serde_json::json!({ "status": "transferring", "target": target }),
                    false,
                )],
            },
        );
        event.actions.transfer_to_agent = Some(target);
        telemetry.record_tool_call(&call.name, started.elapsed(), false);
        return event;
    }

    let mut args = call.arguments.clone();

    if let Some(before) = &callbacks.before {
        match before(&call.name, &mut args) {
            Ok(Some(override_value)) => {
                telemetry.record_tool_call(&call.name, started.elapsed(), false);
                return response_event(invocation, &agent, &call, override_value, false);
            }
            Ok(None) => {}
            Err(e) => {
                telemetry.record_tool_call(&call.name, started.elapsed(), true);
                return response_event(
                    invocation,
                    &agent,
                    &call,
                    serde_json::json!({ "error": e.to_string() }),
                    true,
                );
            }
        }
    }

    match plugin_manager.before_tool(invocation, &call.name, &mut args).await {
        Ok(Some(override_value)) => {
            telemetry.record_tool_call(&call.name, started.elapsed(), false);
            return response_event(invocation, &agent, &call, override_value, false);
        }
        Ok(None) => {}
        Err(e) => {
            telemetry.record_tool_call(&call.name, started.elapsed(), true);
            return response_event(
                invocation,
                &agent,
                &call,
                serde_json::json!({ "error": e.to_string() }),
                true,
            );
        }
    }

    let Some(tool) = tools.get(&call.name) else {
        telemetry.record_tool_call(&call.name, started.elapsed(), true);
        return response_event(
            invocation,
            &agent,
            &call,
            serde_json::json!({ "error": format!("tool '{}' not found", call.name), "code": ErrorCode::ToolExecution.as_str() }),
            true,
        );
    };

    if let Err(validation_error) = validate_args(tool.as_ref(), &args) {
        telemetry.record_tool_call(&call.name, started.elapsed(), true);
        return response_event(
            invocation,
            &agent,
            &call,
            serde_json::json!({ "error": validation_error, "code": ErrorCode::Validation.as_str() }),
            true,
        );
    }

    let tool_ctx = ToolContext::new(invocation.clone(), call.id.clone());
    let mut result = match tool.run(args, &tool_ctx).await {
        Ok(value) => value,
        Err(e) => {
            let overridden = plugin_manager.on_tool_error(invocation, &call.name, &e).await;
            match overridden {
                Ok(Some(value)) => value,
                _ => {
                    telemetry.record_tool_call(&call.name, started.elapsed(), true);
                    return response_event(
                        invocation,
                        &agent,
                        &call,
                        serde_json::json!({ "error": e.to_string(), "code": e.code().as_str() }),
                        true,
                    );
                }
            }
        }
    };

    if let Some(after) = &callbacks.after {
        let _ = after(&call.name, &mut result);
    }
    let _ = plugin_manager.after_tool(invocation, &call.name, &mut result).await;

    let mut event = response_event(invocation, &agent, &call, result, false);
    event.actions.state_delta = tool_ctx.take_state_delta();
    telemetry.record_tool_call(&call.name, started.elapsed(), false);
    event
}

fn response_event(
    invocation: &InvocationContext,
    agent: &str,
    call: &FunctionCall,
    response: Value,
    is_error: bool,
) -> Event {
    Event::new(invocation.invocation_id.as_ref(), agent, &invocation.branch).with_content(
        crate::event::Content {
            role: crate::event::Role::Tool,
            parts: vec![Part::function_response(call.id.clone(), call.name.clone(), response, is_error)],
        },
    )
}

/// Dispatches every call concurrently and returns function-response
/// events in the same order as `calls`.
pub async fn dispatch(
    calls: Vec<FunctionCall>,
    tools: &HashMap<String, Arc<dyn Tool>>,
    invocation: &InvocationContext,
    plugin_manager: &Arc<dyn PluginManager>,
    callbacks: &ToolCallbacks,
    telemetry: &Arc<dyn Telemetry>,
) -> Vec<Event> {
    let futures = calls
        .into_iter()
        .map(|call| run_one(call, tools, invocation, plugin_manager, callbacks, telemetry));
    futures::future::join_all(futures).await
}
