//! Code-execution processors. The container-based code executor is an
//! external collaborator (spec.md §1); both stages are pass-throughs that
//! hold their canonical pipeline slots so an embedder can splice a real
//! sandboxed executor in at either end without reordering the rest.

use super::{RequestProcessor, ResponseProcessor};
use crate::context::InvocationContext;
use crate::error::Result;
use crate::event::Event;
use crate::model::{LlmRequest, LlmResponse};
use async_trait::async_trait;

pub struct CodeExecutionPreProcessor;

#[async_trait]
impl RequestProcessor for CodeExecutionPreProcessor {
    async fn process(&self, _ctx: &InvocationContext, _request: &mut LlmRequest) -> Result<Vec<Event>> {
        Ok(Vec::new())
    }
}

pub struct CodeExecutionPostProcessor;

#[async_trait]
impl ResponseProcessor for CodeExecutionPostProcessor {
    async fn process(&self, _ctx: &InvocationContext, _response: &mut LlmResponse) -> Result<Vec<Event>> {
        Ok(Vec::new())
    }
}
