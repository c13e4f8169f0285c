//! Identity request processor: prepends the agent's name/description to
//! `system_instruction` so the model knows which agent it is playing,
//! stamped ahead of the free-form instructions in the assembled prompt.

use super::RequestProcessor;
use crate::context::InvocationContext;
use crate::error::Result;
use crate::event::Event;
use crate::model::LlmRequest;
use async_trait::async_trait;

pub struct IdentityProcessor {
    name: String,
    description: String,
}

impl IdentityProcessor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        IdentityProcessor { name: name.into(), description: description.into() }
    }
}

#[async_trait]
impl RequestProcessor for IdentityProcessor {
    async fn process(&self, _ctx: &InvocationContext, request: &mut LlmRequest) -> Result<Vec<Event>> {
        if self.description.is_empty() {
            return Ok(Vec::new());
        }
        let preamble = format!("You are agent '{}'. {}", self.name, self.description);
        request.config.system_instruction = Some(match request.config.system_instruction.take() {
            Some(existing) => format!("{preamble}\n\n{existing}"),
            None => preamble,
        });
        Ok(Vec::new())
    }
}
