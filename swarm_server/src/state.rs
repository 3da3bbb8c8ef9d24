use std::sync::Arc;

use swarm_capabilities::Policy;
use swarm_coordinator::Coordinator;
use swarm_dedupe::Deduper;

/// Shared, request-independent state the router and middleware close over. Built once at
/// startup and handed to every connection as an `Arc` (spec §9 "Global mutable state": no
/// process-wide singletons, everything request-path code needs arrives via this handle).
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub policy: Arc<dyn Policy>,
    pub deduper: Arc<Deduper>,
    /// Soft RSS ceiling in bytes, if configured (spec §6 `memory_limit`).
    pub memory_limit: Option<u64>,
}

impl AppState {
    pub fn new(
        coordinator: Arc<Coordinator>,
        policy: Arc<dyn Policy>,
        deduper: Arc<Deduper>,
        memory_limit: Option<u64>,
    ) -> Self {
        Self {
            coordinator,
            policy,
            deduper,
            memory_limit,
        }
    }
}
