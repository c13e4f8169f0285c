//! `InvocationContext` (C3) and `TransferContext` — the per-invocation
//! mutable bundle threaded through the agent tree. Child contexts inherit
//! everything except `current_agent` and `branch`; `branch` is extended by
//! `.child_name` (spec.md §3).

use crate::error::{AgentError, Result};
use crate::event::Content;
use crate::plugin::PluginManager;
use crate::run_config::RunConfig;
use crate::session::{SessionKey, SessionService};
use crate::telemetry::Telemetry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Ordered list of agent names the invocation has traversed via
/// `transfer_to_agent`, plus the depth bound used to terminate runaway
/// transfer chains. Seeded with the root agent so the chain reads
/// `[root, ...targets]` once transfers start (spec.md §4.6's `chain ←
/// chain + [target]` assumes `chain` already names where the invocation
/// started).
#[derive(Debug, Clone)]
pub struct TransferContext {
    pub chain: Vec<String>,
    pub depth: u32,
    pub root_agent_name: String,
}

impl TransferContext {
    pub fn new(root_agent_name: impl Into<String>) -> Self {
        let root_agent_name = root_agent_name.into();
        TransferContext { chain: vec![root_agent_name.clone()], depth: 0, root_agent_name }
    }
}

/// Shared, atomically-enforced LLM-call budget (costCounter.llmCalls <=
/// runConfig.maxLlmCalls, spec.md §8).
#[derive(Debug, Default)]
pub struct CostCounter {
    llm_calls: AtomicU32,
}

impl CostCounter {
    pub fn llm_calls(&self) -> u32 {
        self.llm_calls.load(Ordering::SeqCst)
    }

    /// Atomically checks the budget and increments on success, so two
    /// concurrent branches racing for the last call cannot both succeed.
    pub fn try_increment(&self, max: u32) -> Result<u32> {
        loop {
            let current = self.llm_calls.load(Ordering::SeqCst);
            if current >= max {
                return Err(AgentError::LlmCallsLimitExceeded { used: current, max });
            }
            if self
                .llm_calls
                .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Ok(current + 1);
            }
        }
    }
}

/// Services shared read-mostly across an invocation and its children
/// (C3: "shared services").
#[derive(Clone)]
pub struct Services {
    pub session_service: Arc<dyn SessionService>,
    pub plugin_manager: Arc<dyn PluginManager>,
    pub telemetry: Arc<dyn Telemetry>,
    /// Flat name → agent lookup over the whole tree rooted at the
    /// invocation's root agent, built once at invocation start. The
    /// transfer controller (C9) resolves `transfer_to_agent` targets
    /// against this rather than walking parent/child links, since those
    /// links are weak back-references only (design note §9).
    pub agents: Arc<HashMap<String, Arc<dyn crate::agent::Agent>>>,
}

/// Per-invocation mutable bundle (C3). Cheaply `Clone`: the fields that
/// must be shared across the whole invocation (cost counter, transfer
/// context, end-invocation flag, services) are `Arc`-wrapped; the fields
/// that vary per branch (`current_agent`, `branch`) are owned values reset
/// by `child()`.
#[derive(Clone)]
pub struct InvocationContext {
    pub invocation_id: Arc<str>,
    pub branch: String,
    pub current_agent: String,
    pub session_key: SessionKey,
    pub user_content: Content,
    pub run_config: Arc<RunConfig>,
    pub cost_counter: Arc<CostCounter>,
    pub transfer_context: Arc<Mutex<TransferContext>>,
    end_invocation: Arc<AtomicBool>,
    pub services: Services,
}

impl InvocationContext {
    pub fn new_root(
        root_agent: impl Into<String>,
        session_key: SessionKey,
        user_content: Content,
        run_config: RunConfig,
        services: Services,
    ) -> Result<Self> {
        run_config.validate()?;
        let root_agent = root_agent.into();
        Ok(InvocationContext {
            invocation_id: Arc::from(format!("inv-{}", uuid::Uuid::new_v4())),
            branch: root_agent.clone(),
            transfer_context: Arc::new(Mutex::new(TransferContext::new(root_agent.clone()))),
            current_agent: root_agent,
            session_key,
            user_content,
            run_config: Arc::new(run_config),
            cost_counter: Arc::new(CostCounter::default()),
            end_invocation: Arc::new(AtomicBool::new(false)),
            services,
        })
    }

    /// Creates a child context for `child_name`: same invocation id, cost
    /// counter, transfer context, end-invocation flag, and services;
    /// `current_agent` becomes `child_name` and `branch` is extended with
    /// `.child_name`.
    pub fn child(&self, child_name: impl Into<String>) -> Self {
        let child_name = child_name.into();
        let mut child = self.clone();
        child.branch = format!("{}.{}", self.branch, child_name);
        child.current_agent = child_name;
        child
    }

    /// A branch context for Parallel composition: same rule as `child`,
    /// isolation comes from each sub-agent getting its own branch string,
    /// not from any data duplication beyond that.
    pub fn isolated_branch(&self, child_name: impl Into<String>) -> Self {
        self.child(child_name)
    }

    pub fn is_end_invocation(&self) -> bool {
        self.end_invocation.load(Ordering::SeqCst)
    }

    pub fn set_end_invocation(&self) {
        self.end_invocation.store(true, Ordering::SeqCst);
    }
}
