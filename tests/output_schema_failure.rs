//! §8 scenario: the agent declares an output schema, the model replies with
//! text that doesn't parse as matching JSON, and the invocation surfaces a
//! schema-validation-failure error event *alongside* the untouched model
//! event rather than discarding it.

mod common;

use agentflow::agent::llm_agent::LlmAgentBuilder;
use agentflow::event::Content;
use agentflow::model::{FinishReason, LlmResponse};
use common::{run_config, user_message, Harness, ScriptedModel};
use std::sync::Arc;

#[tokio::test]
async fn surfaces_a_validation_error_without_discarding_the_model_event() {
    let harness = Harness::new().await;

    let model = Arc::new(ScriptedModel::new(
        "schema-model",
        vec![LlmResponse::final_(Content::model_text("not json at all"), None, FinishReason::Stop)],
    ));

    let schema = serde_json::json!({
        "type": "object",
        "required": ["answer"],
        "properties": { "answer": { "type": "string" } }
    });
    let agent = Arc::new(LlmAgentBuilder::new("structured", model).output_schema(schema).build());

    let events = agentflow::run_invocation(
        agent.clone(),
        vec![agent],
        harness.session_service.clone(),
        harness.plugin_manager(),
        harness.telemetry(),
        harness.session_key.clone(),
        user_message("give me structured json"),
        run_config(),
    )
    .await
    .unwrap();

    // user, model (raw, untouched), then the schema-failure error — in that
    // order: the caller must see the original model event before the error
    // the pipeline raised about it.
    assert_eq!(events.len(), 3);
    assert_eq!(events[1].content.as_ref().unwrap().text(), "not json at all");
    assert!(events[1].error.is_none());
    assert_eq!(events[2].error.as_ref().unwrap().code, "OUTPUT_SCHEMA_VALIDATION_FAILED");
}
