//! §8 scenario: two sub-agents run in parallel on isolated branches; the
//! consolidation event carries both `outputKey` results in its state delta.

mod common;

use agentflow::agent::llm_agent::LlmAgentBuilder;
use agentflow::agent::parallel::ParallelAgent;
use agentflow::event::Content;
use agentflow::model::{FinishReason, LlmResponse};
use common::{run_config, user_message, Harness, ScriptedModel};
use std::sync::Arc;

#[tokio::test]
async fn consolidates_both_branches_output_keys_into_one_state_delta() {
    let harness = Harness::new().await;

    let left_model = Arc::new(ScriptedModel::new(
        "left-model",
        vec![LlmResponse::final_(Content::model_text("left answer"), None, FinishReason::Stop)],
    ));
    let right_model = Arc::new(ScriptedModel::new(
        "right-model",
        vec![LlmResponse::final_(Content::model_text("right answer"), None, FinishReason::Stop)],
    ));

    let left = Arc::new(LlmAgentBuilder::new("left", left_model).build());
    let right = Arc::new(LlmAgentBuilder::new("right", right_model).build());

    let parallel = Arc::new(
        ParallelAgent::new("fan-out", vec![left, right])
            .with_output_key("left", "left_result")
            .with_output_key("right", "right_result"),
    );

    let events = agentflow::run_invocation(
        parallel.clone(),
        vec![parallel],
        harness.session_service.clone(),
        harness.plugin_manager(),
        harness.telemetry(),
        harness.session_key.clone(),
        user_message("ask both"),
        run_config(),
    )
    .await
    .unwrap();

    let consolidation = events
        .iter()
        .find(|e| !e.actions.state_delta.is_empty())
        .expect("a consolidation event with a state delta");

    assert_eq!(consolidation.actions.state_delta.get("left_result").unwrap(), "left answer");
    assert_eq!(consolidation.actions.state_delta.get("right_result").unwrap(), "right answer");

    // Both branches' final responses are present somewhere in the merged stream.
    let texts: Vec<String> = events
        .iter()
        .filter_map(|e| e.content.as_ref())
        .map(|c| c.text())
        .collect();
    assert!(texts.contains(&"left answer".to_string()));
    assert!(texts.contains(&"right answer".to_string()));
}
