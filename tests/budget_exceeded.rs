//! §8 scenario: `maxLlmCalls` is exhausted mid-loop. The agent dispatches
//! one tool call (consuming its single allotted LLM call), then on the next
//! iteration of the step machine the budget check fails before a second
//! model call is made, and the invocation ends with a budget-exceeded error
//! event instead of hanging or panicking.

mod common;

use agentflow::agent::llm_agent::LlmAgentBuilder;
use agentflow::event::{Content, Part, Role};
use agentflow::model::{FinishReason, LlmResponse};
use agentflow::run_config::RunConfig;
use agentflow::tools::FnTool;
use common::{user_message, Harness, ScriptedModel};
use std::sync::Arc;

#[tokio::test]
async fn ends_the_invocation_once_the_llm_call_budget_is_exhausted() {
    let harness = Harness::new().await;

    let call_content = Content {
        role: Role::Model,
        parts: vec![Part::function_call("call-1", "noop", serde_json::json!({}))],
    };
    let model = Arc::new(ScriptedModel::new(
        "budget-model",
        vec![LlmResponse::final_(call_content, None, FinishReason::ToolCall)],
    ));

    let noop_tool = Arc::new(FnTool::new("noop", serde_json::json!({"type": "object"}), |_args| {
        Ok(serde_json::json!({"ok": true}))
    }));

    let agent = Arc::new(LlmAgentBuilder::new("budget-limited", model).tool(noop_tool).build());

    let run_config = RunConfig { max_llm_calls: 1, ..Default::default() };

    let events = agentflow::run_invocation(
        agent.clone(),
        vec![agent],
        harness.session_service.clone(),
        harness.plugin_manager(),
        harness.telemetry(),
        harness.session_key.clone(),
        user_message("keep going forever"),
        run_config,
    )
    .await
    .unwrap();

    let error_event = events.last().expect("at least one event");
    assert!(error_event.error.is_some(), "expected the final event to carry the budget error");
    assert_eq!(error_event.error.as_ref().unwrap().code, "LLM_CALLS_LIMIT_EXCEEDED");
}
