//! Agent runtime: orchestrates LLM-driven conversational agents that call
//! tools, delegate to sub-agents, compose into sequential/parallel/loop/
//! graph workflows, and emit a stream of structured events.
//!
//! The crate ships the runtime that executes one *invocation* of an agent
//! tree — the single-flow step machine, the tool dispatcher, the
//! composite agents, the transfer controller, and the session/event data
//! model — while leaving concrete LLM providers, persistence backends,
//! and tool implementations as external collaborators behind narrow
//! traits (see [`model::Model`], [`session::SessionService`],
//! [`tools::Tool`]).

pub mod agent;
pub mod context;
pub mod error;
pub mod event;
pub mod model;
pub mod plugin;
pub mod processors;
pub mod run_config;
pub mod session;
pub mod telemetry;
pub mod tools;

pub use error::{AgentError, Result};

use agent::Agent;
use context::{InvocationContext, Services};
use event::{Content, Event, USER_AUTHOR};
use futures::StreamExt;
use plugin::PluginManager;
use run_config::RunConfig;
use session::{SessionKey, SessionService};
use std::collections::HashMap;
use std::sync::Arc;
use telemetry::Telemetry;

/// Runs one invocation end to end (spec.md §2's data flow): builds an
/// `InvocationContext`, appends the user message to the session, invokes
/// the root agent, and persists + collects every emitted event in order.
///
/// `agents` must include every agent reachable via `transfer_to_agent`
/// from any point in the tree (spec.md §4.6 resolves transfer targets by
/// name against this flat registry, not by walking parent/child links).
#[allow(clippy::too_many_arguments)]
pub async fn run_invocation(
    root_agent: Arc<dyn Agent>,
    agents: Vec<Arc<dyn Agent>>,
    session_service: Arc<dyn SessionService>,
    plugin_manager: Arc<dyn PluginManager>,
    telemetry: Arc<dyn Telemetry>,
    session_key: SessionKey,
    user_message: Content,
    run_config: RunConfig,
) -> Result<Vec<Event>> {
    let registry: HashMap<String, Arc<dyn Agent>> = agent::build_registry(agents);
    let services = Services {
        session_service: session_service.clone(),
        plugin_manager,
        telemetry,
        agents: Arc::new(registry),
    };

    let root_name = root_agent.name().to_string();
    let ctx = InvocationContext::new_root(root_name, session_key.clone(), user_message.clone(), run_config, services)?;

    ctx.services.plugin_manager.on_user_message(&ctx, &user_message).await?;
    let user_event = Event::new(ctx.invocation_id.as_ref(), USER_AUTHOR, &ctx.branch).with_content(user_message);
    let appended_user_event = session_service.append_event(&session_key, user_event).await?;

    let mut out = vec![appended_user_event];
    let mut stream = agent::base::run_async(root_agent, &ctx);
    while let Some(item) = stream.next().await {
        let event = item?;
        let appended = session_service.append_event(&session_key, event).await?;
        ctx.services.plugin_manager.on_event(&ctx, &appended).await?;
        out.push(appended);
    }
    Ok(out)
}
