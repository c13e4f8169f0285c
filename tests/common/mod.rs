//! Shared fakes for the end-to-end scenario tests (spec.md §8): a scripted
//! model that replays a fixed response sequence, plus small helpers for
//! wiring up a session and a default run config.

use agentflow::event::Content;
use agentflow::model::{LlmRequest, LlmResponse, Model, ResponseStream};
use agentflow::plugin::{NoopPluginManager, PluginManager};
use agentflow::run_config::RunConfig;
use agentflow::session::{InMemorySessionService, SessionKey, SessionService};
use agentflow::telemetry::{NoopTelemetry, Telemetry};
use agentflow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A `Model` that replays a fixed queue of responses, one per call to
/// `generate_content`, ignoring the request it is given. Each response is
/// handed back as a single-chunk stream (`turn_complete: true`); scenarios
/// that need multiple LLM calls (tool loops, transfers) just queue one
/// response per expected call.
pub struct ScriptedModel {
    name: String,
    responses: Mutex<VecDeque<LlmResponse>>,
}

impl ScriptedModel {
    pub fn new(name: impl Into<String>, responses: Vec<LlmResponse>) -> Self {
        ScriptedModel { name: name.into(), responses: Mutex::new(responses.into_iter().collect()) }
    }
}

#[async_trait]
impl Model for ScriptedModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_content(&self, _request: LlmRequest, _streaming: bool) -> Result<ResponseStream> {
        let response = self
            .responses
            .lock()
            .pop_front()
            .ok_or_else(|| agentflow::AgentError::ModelCall(format!("{} exhausted its scripted responses", self.name)))?;
        Ok(Box::pin(futures::stream::once(async move { Ok(response) })))
    }
}

/// Wires up an in-memory session, a no-op plugin manager, and no-op
/// telemetry — everything a scenario needs besides the agents and model(s)
/// under test.
pub struct Harness {
    pub session_service: Arc<InMemorySessionService>,
    pub session_key: SessionKey,
}

impl Harness {
    pub async fn new() -> Self {
        let session_service = Arc::new(InMemorySessionService::new());
        let session = session_service.create_session("test-app", "test-user", None, None).await.unwrap();
        Harness { session_service, session_key: session.key }
    }

    pub fn plugin_manager(&self) -> Arc<dyn PluginManager> {
        Arc::new(NoopPluginManager)
    }

    pub fn telemetry(&self) -> Arc<dyn Telemetry> {
        Arc::new(NoopTelemetry)
    }
}

pub fn run_config() -> RunConfig {
    RunConfig::default()
}

pub fn user_message(text: &str) -> Content {
    Content::user_text(text)
}
