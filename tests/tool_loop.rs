//! §8 scenario: the model calls a tool, the dispatcher runs it, the tool's
//! result is fed back, and a second model call produces the final answer.

mod common;

use agentflow::agent::llm_agent::LlmAgentBuilder;
use agentflow::event::{Content, Part, Role};
use agentflow::model::{FinishReason, LlmResponse};
use agentflow::tools::FnTool;
use common::{run_config, user_message, Harness, ScriptedModel};
use std::sync::Arc;

#[tokio::test]
async fn dispatches_a_tool_call_and_resumes_with_its_result() {
    let harness = Harness::new().await;

    let call_content = Content {
        role: Role::Model,
        parts: vec![Part::function_call("call-1", "add", serde_json::json!({"a": 2, "b": 3}))],
    };
    let model = Arc::new(ScriptedModel::new(
        "tool-model",
        vec![
            LlmResponse::final_(call_content, None, FinishReason::ToolCall),
            LlmResponse::final_(Content::model_text("the sum is 5"), None, FinishReason::Stop),
        ],
    ));

    let add_tool = Arc::new(
        FnTool::new("add", serde_json::json!({"type": "object"}), |args| {
            let a = args.get("a").and_then(|v| v.as_i64()).unwrap_or(0);
            let b = args.get("b").and_then(|v| v.as_i64()).unwrap_or(0);
            Ok(serde_json::json!({"sum": a + b}))
        })
        .with_description("adds two integers"),
    );

    let agent = Arc::new(LlmAgentBuilder::new("calculator", model).tool(add_tool).build());

    let events = agentflow::run_invocation(
        agent.clone(),
        vec![agent],
        harness.session_service.clone(),
        harness.plugin_manager(),
        harness.telemetry(),
        harness.session_key.clone(),
        user_message("what is 2 + 3?"),
        run_config(),
    )
    .await
    .unwrap();

    // user, model(call), tool(response), model(final).
    assert_eq!(events.len(), 4);
    let call_event = &events[1];
    assert!(call_event.content.as_ref().unwrap().has_function_calls());

    let tool_event = &events[2];
    let (_, name, response, is_error) = match &tool_event.content.as_ref().unwrap().parts[0] {
        Part::FunctionResponse { id, name, response, is_error } => (id, name, response, *is_error),
        other => panic!("expected a function response part, got {other:?}"),
    };
    assert_eq!(name, "add");
    assert!(!is_error);
    assert_eq!(response["sum"], 5);

    let final_event = &events[3];
    assert_eq!(final_event.content.as_ref().unwrap().text(), "the sum is 5");
    assert!(final_event.is_final_response());
}
