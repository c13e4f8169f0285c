//! Instructions request processor: seeds `system_instruction` from the
//! agent's static instruction text.

use super::RequestProcessor;
use crate::context::InvocationContext;
use crate::error::Result;
use crate::event::Event;
use crate::model::LlmRequest;
use async_trait::async_trait;

pub struct InstructionsProcessor {
    instruction: Option<String>,
}

impl InstructionsProcessor {
    pub fn new(instruction: Option<String>) -> Self {
        InstructionsProcessor { instruction }
    }
}

#[async_trait]
impl RequestProcessor for InstructionsProcessor {
    async fn process(&self, _ctx: &InvocationContext, request: &mut LlmRequest) -> Result<Vec<Event>> {
        if let Some(instruction) = &self.instruction {
            request.config.system_instruction = Some(instruction.clone());
        }
        Ok(Vec::new())
    }
}
