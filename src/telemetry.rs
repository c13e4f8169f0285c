//! Telemetry adapter (C11): wraps event streams in spans, records
//! counters and histograms. No semantic behavior — a telemetry failure
//! never changes what the runtime does.
//!
//! Rather than a global provider registry, telemetry is an explicit
//! service passed on the `InvocationContext`. Concrete exporters are an
//! external collaborator; this module only defines the attribute-naming
//! contract from spec.md §6 and a `tracing`-based default.

use crate::model::FinishReason;
use std::time::Duration;
use tracing::{field, info_span, Span};

/// Standardized span/attribute names (spec.md §6).
pub mod attr {
    pub const SYSTEM: &str = "agentflow";
    pub const OPERATION_AGENT_RUN: &str = "agent.run";
    pub const OPERATION_MODEL_CALL: &str = "model.call";
    pub const OPERATION_TOOL_CALL: &str = "tool.call";
}

pub trait Telemetry: Send + Sync {
    fn agent_span(&self, agent_name: &str, invocation_id: &str, branch: &str) -> Span;

    fn model_span(&self, model: &str, invocation_id: &str) -> Span;

    fn tool_span(&self, tool_name: &str, call_id: &str, invocation_id: &str) -> Span;

    fn record_model_call(
        &self,
        model: &str,
        finish_reason: Option<FinishReason>,
        input_tokens: u64,
        output_tokens: u64,
    );

    fn record_tool_call(&self, tool_name: &str, duration: Duration, is_error: bool);
}

/// Default telemetry: opens `tracing` spans carrying the attribute names
/// from §6 and logs counters/durations via `log`. Content capture (full
/// message text on spans) is opt-in and defaults off.
pub struct TracingTelemetry {
    pub capture_content: bool,
}

impl Default for TracingTelemetry {
    fn default() -> Self {
        TracingTelemetry { capture_content: false }
    }
}

impl Telemetry for TracingTelemetry {
    fn agent_span(&self, agent_name: &str, invocation_id: &str, branch: &str) -> Span {
        info_span!(
            "agent.run",
            system = attr::SYSTEM,
            operation = attr::OPERATION_AGENT_RUN,
            agent.name = agent_name,
            invocation_id = invocation_id,
            branch = branch,
        )
    }

    fn model_span(&self, model: &str, invocation_id: &str) -> Span {
        info_span!(
            "model.call",
            system = attr::SYSTEM,
            operation = attr::OPERATION_MODEL_CALL,
            request.model = model,
            invocation_id = invocation_id,
            finish_reason = field::Empty,
            input_tokens = field::Empty,
            output_tokens = field::Empty,
        )
    }

    fn tool_span(&self, tool_name: &str, call_id: &str, invocation_id: &str) -> Span {
        info_span!(
            "tool.call",
            system = attr::SYSTEM,
            operation = attr::OPERATION_TOOL_CALL,
            tool.name = tool_name,
            tool.call_id = call_id,
            invocation_id = invocation_id,
        )
    }

    fn record_model_call(
        &self,
        model: &str,
        finish_reason: Option<FinishReason>,
        input_tokens: u64,
        output_tokens: u64,
    ) {
        log::debug!(
            "model={model} finish_reason={finish_reason:?} input_tokens={input_tokens} output_tokens={output_tokens}"
        );
    }

    fn record_tool_call(&self, tool_name: &str, duration: Duration, is_error: bool) {
        log::debug!(
            "tool={tool_name} duration_ms={} is_error={is_error}",
            duration.as_millis()
        );
    }
}

pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn agent_span(&self, _agent_name: &str, _invocation_id: &str, _branch: &str) -> Span {
        Span::none()
    }

    fn model_span(&self, _model: &str, _invocation_id: &str) -> Span {
        Span::none()
    }

    fn tool_span(&self, _tool_name: &str, _call_id: &str, _invocation_id: &str) -> Span {
        Span::none()
    }

    fn record_model_call(&self, _: &str, _: Option<FinishReason>, _: u64, _: u64) {}

    fn record_tool_call(&self, _: &str, _: Duration, _: bool) {}
}
