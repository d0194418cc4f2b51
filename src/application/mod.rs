pub mod chain_worker;
pub mod supervisor;

pub use chain_worker::{
    ChainSettings, ChainWorker, Collaborators, FallbackHandle, RescoreSummary, WorkerError,
    WorkerSettings, WorkerStatus,
};
pub use supervisor::Supervisor;
