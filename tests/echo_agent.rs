//! §8 scenario: a single `LlmAgent` with no tools answers directly — the
//! simplest possible invocation (user message in, one model event out, no
//! function calls, invocation ends naturally).

mod common;

use agentflow::agent::llm_agent::LlmAgentBuilder;
use agentflow::event::Content;
use agentflow::model::{FinishReason, LlmResponse};
use common::{run_config, user_message, Harness, ScriptedModel};
use std::sync::Arc;

#[tokio::test]
async fn echoes_the_model_reply_and_ends_the_invocation() {
    let harness = Harness::new().await;
    let model = Arc::new(ScriptedModel::new(
        "echo-model",
        vec![LlmResponse::final_(Content::model_text("hello there"), None, FinishReason::Stop)],
    ));
    let agent = Arc::new(LlmAgentBuilder::new("echo", model).description("repeats what it hears").build());

    let events = agentflow::run_invocation(
        agent.clone(),
        vec![agent],
        harness.session_service.clone(),
        harness.plugin_manager(),
        harness.telemetry(),
        harness.session_key.clone(),
        user_message("hi"),
        run_config(),
    )
    .await
    .unwrap();

    // user event + one model event, nothing else.
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].author, "user");
    let model_event = &events[1];
    assert_eq!(model_event.content.as_ref().unwrap().text(), "hello there");
    assert!(model_event.is_final_response());
    assert!(model_event.error.is_none());
}
