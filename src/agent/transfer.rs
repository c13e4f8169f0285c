//! Transfer controller (C9, spec.md §4.6): resolves `transfer_to_agent`
//! targets, enforces the depth bound, and updates the transfer chain.

use super::Agent;
use crate::context::InvocationContext;
use crate::error::{AgentError, Result};
use crate::event::USER_AUTHOR;
use std::sync::Arc;

/// Resolves `target` within the tree rooted at the invocation's root
/// agent, bumps `transferContext` (`chain`, `depth`), and enforces
/// `transferMaxDepth`. Returns the resolved agent on success.
pub fn resolve(ctx: &InvocationContext, target: &str) -> Result<Arc<dyn Agent>> {
    if target == USER_AUTHOR {
        return Err(AgentError::InvalidTransferTarget(target.to_string()));
    }
    let agent = ctx
        .services
        .agents
        .get(target)
        .cloned()
        .ok_or_else(|| AgentError::InvalidTransferTarget(target.to_string()))?;

    let mut transfer = ctx.transfer_context.lock();
    let next_depth = transfer.depth + 1;
    if next_depth > ctx.run_config.transfer_max_depth {
        return Err(AgentError::TransferLimit { depth: next_depth, max: ctx.run_config.transfer_max_depth });
    }
    transfer.chain.push(target.to_string());
    transfer.depth = next_depth;

    Ok(agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, EventStream};
    use crate::context::Services;
    use crate::event::Content;
    use crate::plugin::NoopPluginManager;
    use crate::run_config::RunConfig;
    use crate::session::{InMemorySessionService, SessionKey};
    use crate::telemetry::NoopTelemetry;
    use std::collections::HashMap;

    struct StubAgent(&'static str);
    impl Agent for StubAgent {
        fn name(&self) -> &str {
            self.0
        }
        fn run_async_impl(&self, _ctx: InvocationContext) -> EventStream {
            Box::pin(futures::stream::empty())
        }
    }

    fn ctx_with_agents(agents: Vec<(&'static str, Arc<dyn Agent>)>, max_depth: u32) -> InvocationContext {
        let registry: HashMap<String, Arc<dyn Agent>> =
            agents.into_iter().map(|(n, a)| (n.to_string(), a)).collect();
        let services = Services {
            session_service: Arc::new(InMemorySessionService::new()),
            plugin_manager: Arc::new(NoopPluginManager),
            telemetry: Arc::new(NoopTelemetry),
            agents: Arc::new(registry),
        };
        InvocationContext::new_root(
            "router",
            SessionKey::new("app", "user", "s1"),
            Content::user_text("hi"),
            RunConfig { transfer_max_depth: max_depth, ..Default::default() },
            services,
        )
        .unwrap()
    }

    #[test]
    fn rejects_user_as_target() {
        let ctx = ctx_with_agents(vec![], 5);
        assert!(matches!(resolve(&ctx, "user"), Err(AgentError::InvalidTransferTarget(_))));
    }

    #[test]
    fn rejects_unknown_target() {
        let ctx = ctx_with_agents(vec![], 5);
        assert!(matches!(resolve(&ctx, "math"), Err(AgentError::InvalidTransferTarget(_))));
    }

    #[test]
    fn resolves_known_target_and_updates_chain() {
        let math: Arc<dyn Agent> = Arc::new(StubAgent("math"));
        let ctx = ctx_with_agents(vec![("math", math)], 5);
        let resolved = resolve(&ctx, "math").unwrap();
        assert_eq!(resolved.name(), "math");
        let transfer = ctx.transfer_context.lock();
        assert_eq!(transfer.chain, vec!["router".to_string(), "math".to_string()]);
        assert_eq!(transfer.depth, 1);
    }

    #[test]
    fn enforces_max_depth() {
        let math: Arc<dyn Agent> = Arc::new(StubAgent("math"));
        let ctx = ctx_with_agents(vec![("math", math)], 1);
        assert!(resolve(&ctx, "math").is_ok());
        assert!(matches!(resolve(&ctx, "math"), Err(AgentError::TransferLimit { .. })));
    }
}
