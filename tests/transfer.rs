//! §8 scenario: a router agent calls `transfer_to_agent`, control passes to
//! the named specialist, and the specialist's final response is what the
//! invocation ends with.

mod common;

use agentflow::agent::llm_agent::LlmAgentBuilder;
use agentflow::event::{Content, Part, Role};
use agentflow::model::{FinishReason, LlmResponse};
use common::{run_config, user_message, Harness, ScriptedModel};
use std::sync::Arc;

#[tokio::test]
async fn transfers_control_to_the_named_specialist() {
    let harness = Harness::new().await;

    let transfer_content = Content {
        role: Role::Model,
        parts: vec![Part::function_call(
            "call-1",
            "transfer_to_agent",
            serde_json::json!({"agent_name": "specialist"}),
        )],
    };
    let router_model = Arc::new(ScriptedModel::new(
        "router-model",
        vec![LlmResponse::final_(transfer_content, None, FinishReason::ToolCall)],
    ));
    let specialist_model = Arc::new(ScriptedModel::new(
        "specialist-model",
        vec![LlmResponse::final_(Content::model_text("handled by the specialist"), None, FinishReason::Stop)],
    ));

    let router = Arc::new(LlmAgentBuilder::new("router", router_model).description("routes to specialists").build());
    let specialist = Arc::new(LlmAgentBuilder::new("specialist", specialist_model).build());

    let events = agentflow::run_invocation(
        router.clone(),
        vec![router, specialist],
        harness.session_service.clone(),
        harness.plugin_manager(),
        harness.telemetry(),
        harness.session_key.clone(),
        user_message("I need a specialist"),
        run_config(),
    )
    .await
    .unwrap();

    let transfer_event = events.iter().find(|e| e.actions.transfer_to_agent.is_some()).expect("a transfer event");
    assert_eq!(transfer_event.actions.transfer_to_agent.as_deref(), Some("specialist"));

    let final_event = events.last().unwrap();
    assert_eq!(final_event.content.as_ref().unwrap().text(), "handled by the specialist");
    assert_eq!(final_event.author, "specialist");
}

#[tokio::test]
async fn rejects_a_transfer_to_an_unregistered_agent() {
    let harness = Harness::new().await;

    let transfer_content = Content {
        role: Role::Model,
        parts: vec![Part::function_call(
            "call-1",
            "transfer_to_agent",
            serde_json::json!({"agent_name": "nobody"}),
        )],
    };
    let router_model = Arc::new(ScriptedModel::new(
        "router-model",
        vec![LlmResponse::final_(transfer_content, None, FinishReason::ToolCall)],
    ));
    let router = Arc::new(LlmAgentBuilder::new("router", router_model).build());

    let events = agentflow::run_invocation(
        router.clone(),
        vec![router],
        harness.session_service.clone(),
        harness.plugin_manager(),
        harness.telemetry(),
        harness.session_key.clone(),
        user_message("go somewhere invalid"),
        run_config(),
    )
    .await
    .unwrap();

    let error_event = events.last().unwrap();
    assert!(error_event.error.is_some());
    assert_eq!(error_event.error.as_ref().unwrap().code, "INVALID_TRANSFER_TARGET");
}
