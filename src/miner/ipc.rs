use super::*;

/// Work queue entry, one JSON object per line on the backend's stdin. Every
/// order carries the complete work state so the backend only ever keeps the
/// newest one.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) enum WorkOrder {
    Work {
        job: Job,
        nonce1: NoncePart,
        tag: u8,
    },
}

/// Result queue entry, one JSON object per line on the backend's stdout.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) enum SolverReport {
    Share {
        job_id: String,
        nonce_suffix: NoncePart,
        solution: Solution,
    },
    /// Counters accumulated since the previous report; the frontend folds
    /// them into the worker's stats.
    Stats { stats: MinerStats },
    Fatal { message: String },
}
