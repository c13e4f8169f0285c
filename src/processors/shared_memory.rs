//! Shared-memory request processor. Long-term memory providers are an
//! external collaborator (spec.md §1, §6 "Artifact & memory services");
//! the runtime does not touch them except via tools, so this stage holds
//! its canonical slot as a pass-through.

use super::RequestProcessor;
use crate::context::InvocationContext;
use crate::error::Result;
use crate::event::Event;
use crate::model::LlmRequest;
use async_trait::async_trait;

pub struct SharedMemoryProcessor;

#[async_trait]
impl RequestProcessor for SharedMemoryProcessor {
    async fn process(&self, _ctx: &InvocationContext, _request: &mut LlmRequest) -> Result<Vec<Event>> {
        Ok(Vec::new())
    }
}
