//! Auth request processor. Credential/token backends are an external
//! collaborator (spec.md §1); this stage is a pass-through placeholder
//! that still occupies its canonical slot so a custom pipeline can splice
//! a real implementation in without reordering the rest.

use super::RequestProcessor;
use crate::context::InvocationContext;
use crate::error::Result;
use crate::event::Event;
use crate::model::LlmRequest;
use async_trait::async_trait;

pub struct AuthProcessor;

#[async_trait]
impl RequestProcessor for AuthProcessor {
    async fn process(&self, _ctx: &InvocationContext, _request: &mut LlmRequest) -> Result<Vec<Event>> {
        Ok(Vec::new())
    }
}
