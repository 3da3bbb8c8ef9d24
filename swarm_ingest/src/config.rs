use std::path::PathBuf;
use std::time::Duration;

use bytesize::ByteSize;
use swarm_types::IngestError;

/// Process configuration, covering exactly the options table in spec §6. Parsed by `clap`'s
/// derive API with the `env` feature, the way `garbage_collector`/`clap_blocks` do (SPEC_FULL
/// §10.4).
#[derive(Debug, clap::Parser)]
pub struct Config {
    /// HTTP listen address.
    #[clap(long, env = "SWARM_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// Warehouse tenant.
    #[clap(long, env = "SWARM_WAREHOUSE_PROJECT_ID")]
    pub warehouse_project_id: String,

    /// Directories containing policy modules (repeatable).
    #[clap(long = "policy-dir", env = "SWARM_POLICY_DIR")]
    pub policy_dir: Vec<PathBuf>,

    /// Audit destination dataset (both or neither of this and `meta_table`).
    #[clap(long, env = "SWARM_META_DATASET")]
    pub meta_dataset: Option<String>,

    /// Audit destination table.
    #[clap(long, env = "SWARM_META_TABLE")]
    pub meta_table: Option<String>,

    /// KV store project for the Deduper (both or neither of this and `state_database`).
    #[clap(long, env = "SWARM_STATE_PROJECT")]
    pub state_project: Option<String>,

    /// KV store database for the Deduper.
    #[clap(long, env = "SWARM_STATE_DATABASE")]
    pub state_database: Option<String>,

    /// Stage A (Source Importer) pool size.
    #[clap(long, env = "SWARM_READ_CONCURRENCY", default_value = "32")]
    pub read_concurrency: usize,

    /// Stage B outer (per-destination) pool size.
    #[clap(long, env = "SWARM_INGEST_TABLE_CONCURRENCY", default_value = "16")]
    pub ingest_table_concurrency: usize,

    /// Stage B inner (per-chunk) pool size.
    #[clap(long, env = "SWARM_INGEST_RECORD_CONCURRENCY", default_value = "16")]
    pub ingest_record_concurrency: usize,

    /// Deduper lease duration.
    #[clap(long, env = "SWARM_STATE_TIMEOUT", default_value = "30min")]
    pub state_timeout: String,

    /// Deduper state retention.
    #[clap(long, env = "SWARM_STATE_TTL", default_value = "7days")]
    pub state_ttl: String,

    /// Soft RSS cap, e.g. "1GiB". Unset disables the memory-limit gate.
    #[clap(long, env = "SWARM_MEMORY_LIMIT")]
    pub memory_limit: Option<String>,

    /// Pull-mode subscription names (repeatable).
    #[clap(long = "subscription", env = "SWARM_SUBSCRIPTIONS")]
    pub subscriptions: Vec<String>,
}

/// Validated, type-converted form of [`Config`]. Construction is the single point where
/// cross-field validation (spec §7 `ConfigInvalid`) happens.
pub struct Resolved {
    pub bind_addr: std::net::SocketAddr,
    pub warehouse_project_id: String,
    pub policy_dir: Vec<PathBuf>,
    pub audit_destination: Option<(String, String)>,
    pub state_backend: Option<(String, String)>,
    pub read_concurrency: usize,
    pub ingest_table_concurrency: usize,
    pub ingest_record_concurrency: usize,
    pub state_timeout: Duration,
    pub state_ttl: Duration,
    pub memory_limit: Option<u64>,
    pub subscriptions: Vec<String>,
}

impl Config {
    pub fn resolve(self) -> Result<Resolved, IngestError> {
        let bind_addr = self.bind_addr.parse().map_err(|e| IngestError::ConfigInvalid {
            message: format!("invalid bind_addr {:?}: {e}", self.bind_addr),
        })?;

        let audit_destination = match (self.meta_dataset, self.meta_table) {
            (Some(dataset), Some(table)) => Some((dataset, table)),
            (None, None) => None,
            _ => {
                return Err(IngestError::ConfigInvalid {
                    message: "meta_dataset and meta_table must both be set or both unset".to_string(),
                })
            }
        };

        let state_backend = match (self.state_project, self.state_database) {
            (Some(project), Some(database)) => Some((project, database)),
            (None, None) => None,
            _ => {
                return Err(IngestError::ConfigInvalid {
                    message: "state_project and state_database must both be set or both unset".to_string(),
                })
            }
        };

        let state_timeout = parse_duration(&self.state_timeout)?;
        let state_ttl = parse_duration(&self.state_ttl)?;
        let memory_limit = self
            .memory_limit
            .as_deref()
            .map(|s| {
                s.parse::<ByteSize>()
                    .map(|b| b.0)
                    .map_err(|e| IngestError::ConfigInvalid {
                        message: format!("invalid memory_limit {s:?}: {e}"),
                    })
            })
            .transpose()?;

        Ok(Resolved {
            bind_addr,
            warehouse_project_id: self.warehouse_project_id,
            policy_dir: self.policy_dir,
            audit_destination,
            state_backend,
            read_concurrency: self.read_concurrency,
            ingest_table_concurrency: self.ingest_table_concurrency,
            ingest_record_concurrency: self.ingest_record_concurrency,
            state_timeout,
            state_ttl,
            memory_limit,
            subscriptions: self.subscriptions,
        })
    }
}

fn parse_duration(raw: &str) -> Result<Duration, IngestError> {
    humantime::parse_duration(raw).map_err(|e| IngestError::ConfigInvalid {
        message: format!("invalid duration {raw:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn base_args() -> Vec<&'static str> {
        vec!["swarm_ingest", "--warehouse-project-id", "proj"]
    }

    #[test]
    fn rejects_half_set_audit_destination() {
        let mut args = base_args();
        args.extend(["--meta-dataset", "ds"]);
        let config = Config::parse_from(args);
        assert!(matches!(config.resolve(), Err(IngestError::ConfigInvalid { .. })));
    }

    #[test]
    fn accepts_fully_unset_audit_destination() {
        let config = Config::parse_from(base_args());
        assert!(config.resolve().unwrap().audit_destination.is_none());
    }

    #[test]
    fn parses_memory_limit() {
        let mut args = base_args();
        args.extend(["--memory-limit", "1GiB"]);
        let config = Config::parse_from(args);
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.memory_limit, Some(1024 * 1024 * 1024));
    }
}
