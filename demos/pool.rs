//! # Example: worker pool with crash-loop detection
//!
//! Runs a master with three workers. Each worker idles until `SIGTERM`. With
//! `--crash`, worker 0 exits with status 1 shortly after starting, so you can
//! watch it respawn twice and then get disabled.
//!
//! ```text
//! cargo run --example pool --features logging -- --crash
//! kill -USR2 <master pid>   # graceful restart
//! kill -TERM <master pid>   # shutdown
//! ```

use std::sync::Arc;
use std::time::Duration;

use procvisor::{Cluster, ClusterConfig, LogWriter, Role, WorkerHooks};
use tokio::signal::unix::{SignalKind, signal};
use tracing_subscriber::EnvFilter;

struct PrintHooks;

impl WorkerHooks for PrintHooks {
    fn on_exit(&self, worker_id: u8, exit_status: i32, is_crash: bool) {
        if is_crash {
            tracing::warn!(worker_id, exit_status, "hook: worker crashed");
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let crash = std::env::args().any(|a| a == "--crash");
    let cfg = ClusterConfig {
        workers: 3,
        port: 8080,
        respawn: true,
        max_crashes: 3,
        crash_window: Duration::from_secs(5),
        shutdown_timeout: Duration::from_secs(5),
        ..ClusterConfig::default()
    };

    let role = Cluster::builder(cfg)
        .with_subscribers(vec![Arc::new(LogWriter::new())])
        .with_hooks(Arc::new(PrintHooks))
        .build()
        .init(std::env::args_os())
        .await?;

    match role {
        Role::Master(master) => {
            tracing::info!(
                pid = std::process::id(),
                workers = master.worker_count(),
                port = master.port(),
                "master running"
            );
            master.wait().await?;
        }
        Role::Worker(worker) => {
            tracing::info!(id = worker.id(), port = worker.port(), "worker up");
            if crash && worker.id() == 0 {
                tokio::time::sleep(Duration::from_millis(300)).await;
                std::process::exit(1);
            }
            signal(SignalKind::terminate())?.recv().await;
            tracing::info!(id = worker.id(), "worker stopping");
        }
    }
    Ok(())
}
