//! Supervisor
//!
//! Spawns one tokio task per chain worker. Workers share nothing; the
//! supervisor only holds the shutdown channel and each worker's fallback
//! handle. Every task runs inside a `chain` span so log lines carry the
//! chain name and id.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn, Instrument};

use super::chain_worker::{ChainWorker, FallbackHandle, WorkerStatus};

struct WorkerHandle {
    chain: String,
    fallback: FallbackHandle,
    task: JoinHandle<ChainWorker>,
}

/// Owner of all running chain workers
pub struct Supervisor {
    shutdown: watch::Sender<bool>,
    workers: Vec<WorkerHandle>,
}

impl Supervisor {
    /// Start every worker on its own task
    pub fn spawn(workers: Vec<ChainWorker>) -> Self {
        let (shutdown, _) = watch::channel(false);

        let workers = workers
            .into_iter()
            .map(|mut worker| {
                let chain = worker.chain().name.clone();
                let span = info_span!("chain", name = %chain, id = worker.chain().chain_id);
                let fallback = worker.fallback_handle();
                let rx = shutdown.subscribe();

                let task = tokio::spawn(
                    async move {
                        worker.run(rx).await;
                        worker
                    }
                    .instrument(span),
                );

                WorkerHandle {
                    chain,
                    fallback,
                    task,
                }
            })
            .collect::<Vec<_>>();

        info!("Supervisor started {} chain workers", workers.len());
        Self { shutdown, workers }
    }

    pub fn chains(&self) -> Vec<&str> {
        self.workers.iter().map(|w| w.chain.as_str()).collect()
    }

    /// Ask one chain to fall back to stable. Returns false for an unknown chain.
    pub fn request_fallback(&self, chain: &str) -> bool {
        match self.workers.iter().find(|w| w.chain == chain) {
            Some(worker) => {
                info!("Fallback requested for {}", chain);
                worker.fallback.request();
                true
            }
            None => {
                warn!("Fallback requested for unknown chain {}", chain);
                false
            }
        }
    }

    /// Signal shutdown and wait for every worker to stop
    pub async fn shutdown(self) -> Vec<WorkerStatus> {
        info!("Shutdown requested");
        // Receivers may already be gone if every worker exited
        let _ = self.shutdown.send(true);

        let mut statuses = Vec::with_capacity(self.workers.len());
        for handle in self.workers {
            match handle.task.await {
                Ok(worker) => statuses.push(worker.status()),
                Err(e) => warn!("Worker for {} did not stop cleanly: {}", handle.chain, e),
            }
        }
        statuses
    }
}
