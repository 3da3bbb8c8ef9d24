mod commands;
mod config;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use observability_deps::tracing::error;
use swarm_capabilities::object_store::InMemory;
use swarm_capabilities::testing::{MemoryPubSub, MemoryWarehouse};
use swarm_types::PartitionUnit;

use commands::enqueue::EnqueueArgs;
use commands::migrate::MigrateArgs;
use config::Config;

/// `swarm_ingest` -- see spec §6 for the HTTP surface the `serve` subcommand exposes and
/// §10.6 for `migrate`/`enqueue`. Subcommand layout mirrors
/// `original_source/pkg/controller/cmd`'s `serve`/`migrate`/`enqueue` commands.
#[derive(Debug, clap::Parser)]
#[clap(name = "swarm_ingest")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Run the ingestion HTTP surface and any configured pull workers.
    Serve(Config),
    /// Copy a table's committed schema onto a new or existing destination.
    Migrate {
        #[clap(long)]
        src: String,
        #[clap(long)]
        dst: String,
        #[clap(long, default_value = "day")]
        partition: String,
    },
    /// List objects under a bucket/prefix and republish them as batched load requests.
    Enqueue {
        #[clap(long)]
        bucket: String,
        #[clap(long, default_value = "")]
        prefix: String,
        #[clap(long)]
        topic: String,
        #[clap(long, default_value = "128")]
        count_limit: usize,
        #[clap(long, default_value = "4194304")]
        size_limit_bytes: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Serve(config) => run_serve(config).await,
        Command::Migrate { src, dst, partition } => run_migrate(src, dst, partition).await,
        Command::Enqueue {
            bucket,
            prefix,
            topic,
            count_limit,
            size_limit_bytes,
        } => {
            run_enqueue(bucket, prefix, topic, count_limit, size_limit_bytes).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "swarm_ingest exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run_serve(config: Config) -> Result<(), swarm_types::IngestError> {
    let resolved = config.resolve()?;
    commands::serve::run(resolved).await
}

async fn run_migrate(src: String, dst: String, partition: String) -> Result<(), swarm_types::IngestError> {
    let partition_unit = parse_partition(&partition)?;
    let source = commands::migrate::parse_table_ref(&src, partition_unit)?;
    let destination = commands::migrate::parse_table_ref(&dst, partition_unit)?;

    // No production `Warehouse` backend is wired into this binary (see `commands::serve`'s doc
    // comment); `migrate`/`enqueue` exercise the same in-memory reference implementations.
    let warehouse = MemoryWarehouse::new();
    commands::migrate::run(&warehouse, MigrateArgs { source, destination }).await
}

async fn run_enqueue(
    bucket: String,
    prefix: String,
    topic: String,
    count_limit: usize,
    size_limit_bytes: u64,
) -> Result<(), swarm_types::IngestError> {
    let object_store = InMemory::new();
    let publisher = MemoryPubSub::new();
    let args = EnqueueArgs {
        bucket,
        prefix,
        topic,
        count_limit,
        size_limit_bytes,
    };
    commands::enqueue::run(&object_store, &publisher, args).await?;
    Ok(())
}

fn parse_partition(raw: &str) -> Result<PartitionUnit, swarm_types::IngestError> {
    match raw {
        "none" => Ok(PartitionUnit::None),
        "day" => Ok(PartitionUnit::Day),
        "month" => Ok(PartitionUnit::Month),
        other => Err(swarm_types::IngestError::ConfigInvalid {
            message: format!("invalid partition unit {other:?}, expected none|day|month"),
        }),
    }
}
