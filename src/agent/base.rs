//! Base agent lifecycle (C4, spec.md §4.1): before-callback → run →
//! after-callback wrapper shared by every agent kind.

use super::{Agent, EventStream};
use crate::context::InvocationContext;
use crate::event::Event;
use async_stream::stream;
use futures::StreamExt;
use std::sync::Arc;

/// Creates a child context for `agent`, then in order: (1) runs the
/// before-agent plugin callback, then the agent's before-callbacks until
/// one returns non-empty content; (2) if a callback produced content,
/// emits one event carrying it and ends the invocation; (3) otherwise
/// runs `agent.run_async_impl`; (4) unless ended, runs after-callbacks
/// the same way. Plugin callbacks always run first; the first callback
/// in a phase returning non-empty content wins and further callbacks in
/// that phase are skipped. Errors from a callback are recorded and
/// re-raised — the agent emits no further events for that phase.
pub fn run_async(agent: Arc<dyn Agent>, parent_ctx: &InvocationContext) -> EventStream {
    let ctx = parent_ctx.child(agent.name());

    let s = stream! {
        let plugin = ctx.services.plugin_manager.clone();

        let before_result = match plugin.before_agent(&ctx).await {
            Ok(Some(content)) => Ok(Some(content)),
            Ok(None) => {
                let mut produced = None;
                let mut err = None;
                for cb in agent.before_callbacks() {
                    match cb(&ctx) {
                        Ok(Some(content)) => { produced = Some(content); break; }
                        Ok(None) => continue,
                        Err(e) => { err = Some(e); break; }
                    }
                }
                match err {
                    Some(e) => Err(e),
                    None => Ok(produced),
                }
            }
            Err(e) => Err(e),
        };

        match before_result {
            Err(e) => {
                yield Err(e);
                return;
            }
            Ok(Some(content)) => {
                yield Ok(Event::new(ctx.invocation_id.as_ref(), &ctx.current_agent, &ctx.branch).with_content(content));
                ctx.set_end_invocation();
            }
            Ok(None) => {
                let mut inner = agent.run_async_impl(ctx.clone());
                while let Some(item) = inner.next().await {
                    match item {
                        Ok(event) => yield Ok(event),
                        Err(e) => { yield Err(e); return; }
                    }
                }
            }
        }

        if !ctx.is_end_invocation() {
            let after_result = match plugin.after_agent(&ctx).await {
                Ok(Some(content)) => Ok(Some(content)),
                Ok(None) => {
                    let mut produced = None;
                    let mut err = None;
                    for cb in agent.after_callbacks() {
                        match cb(&ctx) {
                            Ok(Some(content)) => { produced = Some(content); break; }
                            Ok(None) => continue,
                            Err(e) => { err = Some(e); break; }
                        }
                    }
                    match err {
                        Some(e) => Err(e),
                        None => Ok(produced),
                    }
                }
                Err(e) => Err(e),
            };

            match after_result {
                Err(e) => yield Err(e),
                Ok(Some(content)) => {
                    yield Ok(Event::new(ctx.invocation_id.as_ref(), &ctx.current_agent, &ctx.branch).with_content(content));
                }
                Ok(None) => {}
            }
        }
    };

    Box::pin(s)
}
