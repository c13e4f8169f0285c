//! Output-schema response processor (spec.md §4.4): when the agent
//! declares a schema, strips code fences, parses JSON (with a repair
//! fallback, spec.md §11), validates against the schema, and normalizes
//! the content. On failure it leaves the model's content untouched and
//! emits an error event with code `OUTPUT_SCHEMA_VALIDATION_FAILED`
//! instead (§7: "leave the model event in place so the caller sees
//! both").

use super::ResponseProcessor;
use crate::context::InvocationContext;
use crate::error::{ErrorCode, Result};
use crate::event::{Content, Event, Role};
use crate::model::LlmResponse;
use async_trait::async_trait;
use jsonschema::validator_for;
use serde_json::Value;

pub struct OutputSchemaProcessor {
    schema: Option<Value>,
}

impl OutputSchemaProcessor {
    pub fn new(schema: Option<Value>) -> Self {
        OutputSchemaProcessor { schema }
    }
}

/// Strips a single leading/trailing ``` fenced block, including an
/// optional language tag on the opening fence.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else { return trimmed };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    match rest.split_once('\n') {
        Some((tag, body)) if tag.chars().all(|c| c.is_ascii_alphanumeric()) => body.trim(),
        _ => rest.trim(),
    }
}

/// Best-effort repair for near-miss JSON: strips trailing commas before a
/// closing bracket/brace and appends whatever closing brackets/braces are
/// missing, tracked via a simple depth stack. Not a JSON5 parser — just
/// enough to recover truncated or comma-sloppy LLM output (spec.md §11).
fn repair_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut stack = Vec::new();
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' | '[' => {
                stack.push(c);
                out.push(c);
            }
            '}' | ']' => {
                stack.pop();
                out.push(c);
            }
            ',' => {
                let next_non_ws = chars.clone().find(|c| !c.is_whitespace());
                if matches!(next_non_ws, Some('}') | Some(']')) {
                    // drop trailing comma
                } else {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    while let Some(open) = stack.pop() {
        out.push(if open == '{' { '}' } else { ']' });
    }
    out
}

fn parse_with_repair(text: &str) -> std::result::Result<Value, String> {
    serde_json::from_str(text)
        .or_else(|_| serde_json::from_str(&repair_json(text)))
        .map_err(|e| e.to_string())
}

fn normalize(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(_) | Value::Bool(_) | Value::Null => value.to_string(),
        _ => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
    }
}

#[async_trait]
impl ResponseProcessor for OutputSchemaProcessor {
    async fn process(&self, ctx: &InvocationContext, response: &mut LlmResponse) -> Result<Vec<Event>> {
        let Some(schema) = &self.schema else { return Ok(Vec::new()) };
        let Some(content) = &response.content else { return Ok(Vec::new()) };
        let text = content.text();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let stripped = strip_code_fences(&text);
        let parsed = match parse_with_repair(stripped) {
            Ok(v) => v,
            Err(reason) => return Ok(vec![schema_failure_event(ctx, response, &reason)]),
        };

        let validator = match validator_for(schema) {
            Ok(v) => v,
            Err(e) => return Ok(vec![schema_failure_event(ctx, response, &e.to_string())]),
        };
        let errors: Vec<String> = validator.iter_errors(&parsed).map(|e| e.to_string()).collect();
        if !errors.is_empty() {
            return Ok(vec![schema_failure_event(ctx, response, &errors.join("; "))]);
        }

        response.content = Some(Content { role: Role::Model, parts: vec![crate::event::Part::text(normalize(&parsed))] });
        Ok(Vec::new())
    }
}

fn schema_failure_event(ctx: &InvocationContext, response: &mut LlmResponse, reason: &str) -> Event {
    response.error_code = Some(ErrorCode::OutputSchemaValidationFailed.as_str().to_string());
    response.error_message = Some(reason.to_string());
    Event::new(ctx.invocation_id.as_ref(), &ctx.current_agent, &ctx.branch)
        .with_error(ErrorCode::OutputSchemaValidationFailed, reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fenced_json_with_language_tag() {
        let text = "```json\n{\"n\": 1}\n```";
        assert_eq!(strip_code_fences(text), "{\"n\": 1}");
    }

    #[test]
    fn repairs_trailing_comma_and_missing_brace() {
        let repaired = repair_json("{\"n\": 1,");
        let value: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["n"], 1);
    }

    #[test]
    fn normalizes_primitive_to_string() {
        assert_eq!(normalize(&Value::from(42)), "42");
    }

    #[test]
    fn idempotent_on_already_valid_output() {
        let value = serde_json::json!({"n": 1});
        let once = normalize(&value);
        let twice = normalize(&serde_json::from_str::<Value>(&once).unwrap());
        assert_eq!(once, twice);
    }
}
