//! NL-planning processors. Natural-language planning (re-writing the
//! request to elicit a reasoning plan, parsing a plan back out of the
//! response) is not specified beyond its pipeline position; both stages
//! are pass-throughs that hold their canonical slots.

use super::{RequestProcessor, ResponseProcessor};
use crate::context::InvocationContext;
use crate::error::Result;
use crate::event::Event;
use crate::model::{LlmRequest, LlmResponse};
use async_trait::async_trait;

pub struct NlPlanningPreProcessor;

#[async_trait]
impl RequestProcessor for NlPlanningPreProcessor {
    async fn process(&self, _ctx: &InvocationContext, _request: &mut LlmRequest) -> Result<Vec<Event>> {
        Ok(Vec::new())
    }
}

pub struct NlPlanningPostProcessor;

#[async_trait]
impl ResponseProcessor for NlPlanningPostProcessor {
    async fn process(&self, _ctx: &InvocationContext, _response: &mut LlmResponse) -> Result<Vec<Event>> {
        Ok(Vec::new())
    }
}
