//! Contents request processor: rebuilds the conversation `contents` list
//! from session history for the branch the current invocation is on, so
//! every step sees the full causal history rather than only the latest
//! turn.

use super::RequestProcessor;
use crate::context::InvocationContext;
use crate::error::Result;
use crate::event::Event;
use crate::model::LlmRequest;
use async_trait::async_trait;

pub struct ContentsProcessor;

#[async_trait]
impl RequestProcessor for ContentsProcessor {
    async fn process(&self, ctx: &InvocationContext, request: &mut LlmRequest) -> Result<Vec<Event>> {
        let session = ctx.services.session_service.get_session(&ctx.session_key, None).await?;
        let contents = session
            .events
            .iter()
            .filter(|e| ctx.branch.starts_with(&e.branch) || e.branch.starts_with(&ctx.branch))
            .filter_map(|e| e.content.clone())
            .collect();
        request.contents = contents;
        Ok(Vec::new())
    }
}
