use std::path::{Path, PathBuf};
use std::sync::Arc;

use observability_deps::tracing::info;
use swarm_capabilities::object_store::InMemory;
use swarm_capabilities::testing::{MemoryPubSub, MemoryWarehouse, StaticPolicy};
use swarm_dedupe::{Deduper, MemoryStateStore};
use swarm_server::AppState;
use swarm_types::IngestError;

use crate::config::Resolved;

/// Wires every component and serves the HTTP surface plus any configured pull-worker loops,
/// until the process receives a shutdown signal.
///
/// The four external capabilities (`ObjectStore`, `Warehouse`, `Policy`, `Publisher`/
/// `Subscriber`) are spec §1's declared out-of-scope collaborators: their production backends
/// (a real bucket-backed GCS client, BigQuery, a Rego evaluator, a real Pub/Sub transport) are
/// not part of this crate. This entry point wires the in-memory reference implementations
/// already built for the test suites -- real, working implementations of each trait, just not
/// connected to an external service.
pub async fn run(resolved: Resolved) -> Result<(), IngestError> {
    let object_store = Arc::new(InMemory::new());
    let policy = Arc::new(StaticPolicy::new());
    seed_policy_from_dirs(&policy, &resolved.policy_dir)?;
    let warehouse = Arc::new(MemoryWarehouse::new());

    let state_store = resolved
        .state_backend
        .as_ref()
        .map(|_| Arc::new(MemoryStateStore::new()) as Arc<dyn swarm_dedupe::StateStore>);
    let deduper = Arc::new(Deduper::new(state_store, resolved.state_timeout, resolved.state_ttl));

    let coordinator_config = swarm_coordinator::Config {
        read_concurrency: resolved.read_concurrency,
        ingest_table_concurrency: resolved.ingest_table_concurrency,
        ingest_record_concurrency: resolved.ingest_record_concurrency,
    };
    let mut coordinator = swarm_coordinator::Coordinator::new(
        object_store,
        policy.clone(),
        warehouse,
        coordinator_config,
    );
    if let Some((dataset, table)) = &resolved.audit_destination {
        coordinator = coordinator.with_audit_destination(dataset.clone(), table.clone());
    }

    let app_state = Arc::new(AppState::new(
        Arc::new(coordinator),
        policy,
        deduper,
        resolved.memory_limit,
    ));

    let mut workers = Vec::new();
    if !resolved.subscriptions.is_empty() {
        let subscriber = Arc::new(MemoryPubSub::new());
        workers = swarm_server::spawn_pull_workers(app_state.clone(), subscriber, resolved.subscriptions);
    }

    info!(bind_addr = %resolved.bind_addr, "swarm_ingest ready");
    swarm_server::serve(resolved.bind_addr, app_state)
        .await
        .map_err(|e| IngestError::Assertion { message: e.to_string() })?;

    for worker in workers {
        worker.abort();
    }
    Ok(())
}

/// Registers one `StaticPolicy` decision per `<query-name>.json` file found directly under each
/// configured policy directory, e.g. `source.json`, `schema.cloudtrail.json`, `auth.json`
/// (spec §6's `policy_dir` option: "Directories containing policy modules"). `StaticPolicy` has
/// no Rego evaluator behind it, so a "module" here is just the fixed decision it always returns
/// for that query name.
fn seed_policy_from_dirs(policy: &StaticPolicy, dirs: &[PathBuf]) -> Result<(), IngestError> {
    for dir in dirs {
        let entries = std::fs::read_dir(dir).map_err(|e| IngestError::ConfigInvalid {
            message: format!("failed to read policy_dir {}: {e}", dir.display()),
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| IngestError::ConfigInvalid {
                message: format!("failed to read policy_dir {}: {e}", dir.display()),
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let query = query_name_from_path(&path)?;
            let raw = std::fs::read_to_string(&path).map_err(|e| IngestError::ConfigInvalid {
                message: format!("failed to read policy module {}: {e}", path.display()),
            })?;
            let decision: serde_json::Value =
                serde_json::from_str(&raw).map_err(|e| IngestError::ConfigInvalid {
                    message: format!("invalid policy module {}: {e}", path.display()),
                })?;
            info!(query, path = %path.display(), "loaded policy module");
            policy.set(query, decision);
        }
    }
    Ok(())
}

fn query_name_from_path(path: &Path) -> Result<String, IngestError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(".json"))
        .map(str::to_string)
        .ok_or_else(|| IngestError::ConfigInvalid {
            message: format!("invalid policy module filename {}", path.display()),
        })
}
