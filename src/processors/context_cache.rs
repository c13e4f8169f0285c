//! Context-cache processor (C10, spec.md §4.7): walks session events
//! newest→oldest for the current agent only, adopts the most recent
//! reusable `CacheMetadata`, and decides whether to reuse it on the
//! outgoing request.

use super::RequestProcessor;
use crate::context::InvocationContext;
use crate::error::Result;
use crate::event::{CacheMetadata, Event};
use crate::model::LlmRequest;
use crate::run_config::ContextCacheConfig;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Outcome of one replay pass, readable back by the step machine so the
/// emitted model event can carry the same `cacheMetadata` the request
/// used (spec.md §3: events carry optional `cacheMetadata`).
#[derive(Debug, Clone, Default)]
pub struct CacheDecision {
    pub metadata: Option<CacheMetadata>,
    pub last_prompt_tokens: Option<u64>,
}

pub struct ContextCacheProcessor {
    config: ContextCacheConfig,
    last_decision: Mutex<CacheDecision>,
}

impl ContextCacheProcessor {
    pub fn new(config: ContextCacheConfig) -> Self {
        ContextCacheProcessor { config, last_decision: Mutex::new(CacheDecision::default()) }
    }

    pub fn last_decision(&self) -> CacheDecision {
        self.last_decision.lock().clone()
    }

    /// Rules 1–5 from spec.md §4.7, applied to the given agent's events in
    /// newest-to-oldest order (the caller is expected to already hold
    /// events ordered oldest-first, as a `Session` does, hence the
    /// `.rev()`).
    fn replay(&self, events: &[Event], agent: &str, current_invocation_id: &str) -> CacheDecision {
        let mut metadata = None;
        let mut last_prompt_tokens = None;

        for event in events.iter().rev().filter(|e| e.author == agent) {
            if metadata.is_none() {
                if let Some(candidate) = &event.cache_metadata {
                    metadata = Some(if event.invocation_id != current_invocation_id && candidate.cache_name.is_some() {
                        CacheMetadata { invocations_used: candidate.invocations_used + 1, ..candidate.clone() }
                    } else {
                        candidate.clone()
                    });
                }
            }
            if last_prompt_tokens.is_none() {
                if let Some(usage) = &event.usage_metadata {
                    if let Some(count) = usage.prompt_token_count {
                        last_prompt_tokens = Some(count);
                    }
                }
            }
            if metadata.is_some() && last_prompt_tokens.is_some() {
                break;
            }
        }

        CacheDecision { metadata, last_prompt_tokens }
    }
}

#[async_trait]
impl RequestProcessor for ContextCacheProcessor {
    async fn process(&self, ctx: &InvocationContext, request: &mut LlmRequest) -> Result<Vec<Event>> {
        let session = ctx.services.session_service.get_session(&ctx.session_key, None).await?;
        let decision = self.replay(&session.events, &ctx.current_agent, ctx.invocation_id.as_ref());

        if let Some(metadata) = &decision.metadata {
            let now = chrono::Utc::now();
            if metadata.is_active(now, self.config.cache_intervals) {
                request.cache_name = metadata.cache_name.clone();
            }
        }

        *self.last_decision.lock() = decision;
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with_cache(agent: &str, invocation_id: &str, cache: CacheMetadata) -> Event {
        let mut event = Event::new(invocation_id, agent, agent);
        event.cache_metadata = Some(cache);
        event
    }

    fn cache(name: &str, invocations_used: u32) -> CacheMetadata {
        CacheMetadata {
            cache_name: Some(name.to_string()),
            expire_time: Some(chrono::Utc::now() + chrono::Duration::hours(1)),
            fingerprint: "fp".to_string(),
            invocations_used,
            contents_count: 3,
            created_at: Some(chrono::Utc::now()),
        }
    }

    #[test]
    fn increments_invocations_used_for_prior_invocation() {
        let processor = ContextCacheProcessor::new(ContextCacheConfig::default());
        let events = vec![event_with_cache("math", "inv-1", cache("c1", 2))];
        let decision = processor.replay(&events, "math", "inv-2");
        assert_eq!(decision.metadata.unwrap().invocations_used, 3);
    }

    #[test]
    fn keeps_as_is_for_same_invocation() {
        let processor = ContextCacheProcessor::new(ContextCacheConfig::default());
        let events = vec![event_with_cache("math", "inv-1", cache("c1", 2))];
        let decision = processor.replay(&events, "math", "inv-1");
        assert_eq!(decision.metadata.unwrap().invocations_used, 2);
    }

    #[test]
    fn ignores_events_from_other_agents() {
        let processor = ContextCacheProcessor::new(ContextCacheConfig::default());
        let events = vec![event_with_cache("router", "inv-1", cache("c1", 2))];
        let decision = processor.replay(&events, "math", "inv-1");
        assert!(decision.metadata.is_none());
    }
}
