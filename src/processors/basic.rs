//! Basic-config request processor: fills sampling defaults the step
//! machine otherwise leaves unset. First stage in the canonical pipeline.

use super::RequestProcessor;
use crate::context::InvocationContext;
use crate::error::Result;
use crate::event::Event;
use crate::model::LlmRequest;
use async_trait::async_trait;

pub struct BasicProcessor;

#[async_trait]
impl RequestProcessor for BasicProcessor {
    async fn process(&self, _ctx: &InvocationContext, request: &mut LlmRequest) -> Result<Vec<Event>> {
        if request.config.candidate_count.is_none() {
            request.config.candidate_count = Some(1);
        }
        Ok(Vec::new())
    }
}
