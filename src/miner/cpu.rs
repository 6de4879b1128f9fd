use super::*;

/// Thread-backed worker: the solve loop runs on one dedicated OS thread and
/// hands shares back to the cooperative side through the pool's channel.
pub(crate) struct CpuWorker {
    index: usize,
    cpu_id: usize,
    tag: u8,
    work: Arc<Mutex<WorkState>>,
    solver: Option<Box<dyn Solver>>,
    stats: Arc<Mutex<MinerStats>>,
    failed: Arc<AtomicBool>,
    cancel: CancellationToken,
    share_tx: mpsc::Sender<Share>,
    thread: Option<thread::JoinHandle<()>>,
}

#[derive(Default)]
struct WorkState {
    nonce1: Option<NoncePart>,
    job: Option<Arc<Job>>,
}

impl CpuWorker {
    pub(crate) fn new(
        index: usize,
        cpu_id: usize,
        tag: u8,
        solver: Box<dyn Solver>,
        stats: Arc<Mutex<MinerStats>>,
        cancel: CancellationToken,
        share_tx: mpsc::Sender<Share>,
    ) -> Self {
        Self {
            index,
            cpu_id,
            tag,
            work: Arc::new(Mutex::new(WorkState::default())),
            solver: Some(solver),
            stats,
            failed: Arc::new(AtomicBool::new(false)),
            cancel,
            share_tx,
            thread: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_loop(
        label: String,
        index: usize,
        tag: u8,
        work: Arc<Mutex<WorkState>>,
        mut solver: Box<dyn Solver>,
        stats: Arc<Mutex<MinerStats>>,
        failed: Arc<AtomicBool>,
        cancel: CancellationToken,
        share_tx: mpsc::Sender<Share>,
    ) {
        let mut pow = Pow::new(tag);

        info!("{label} waiting for first job");

        while !cancel.is_cancelled() {
            // Fresh snapshot every round; a broadcast mid-round is only
            // picked up at the next boundary.
            let (job, nonce1) = {
                let work = work.lock();
                (work.job.clone(), work.nonce1.clone())
            };

            let (Some(job), Some(nonce1)) = (job, nonce1) else {
                debug!("{label} has no work yet");
                thread::sleep(WORK_POLL_INTERVAL);
                continue;
            };

            match pow.solve_round(&job, &nonce1, solver.as_mut()) {
                Ok(round) => {
                    stats
                        .lock()
                        .record_solutions(round.candidate_count, round.elapsed);

                    for (nonce_suffix, solution) in round.shares {
                        let share = Share {
                            worker: index,
                            job: job.clone(),
                            nonce_suffix,
                            solution,
                        };

                        if share_tx.blocking_send(share).is_err() {
                            debug!("{label} share channel closed");
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!("{label} solver failed: {e:#}");
                    failed.store(true, Ordering::Relaxed);
                    return;
                }
            }
        }

        debug!("{label} stopped");
    }
}

impl Worker for CpuWorker {
    fn label(&self) -> String {
        format!("CPU[{}]", self.cpu_id)
    }

    fn partition_tag(&self) -> u8 {
        self.tag
    }

    fn set_nonce1(&mut self, nonce1: &NoncePart) {
        self.work.lock().nonce1 = Some(nonce1.clone());
    }

    fn receive_job(&mut self, job: &Arc<Job>) {
        self.work.lock().job = Some(job.clone());
    }

    fn start(&mut self) -> Result {
        let solver = self
            .solver
            .take()
            .with_context(|| format!("{} already started", self.label()))?;

        let label = self.label();
        let index = self.index;
        let tag = self.tag;
        let work = self.work.clone();
        let stats = self.stats.clone();
        let failed = self.failed.clone();
        let cancel = self.cancel.clone();
        let share_tx = self.share_tx.clone();

        let handle = thread::Builder::new()
            .name(label.clone())
            .spawn(move || {
                Self::run_loop(
                    label, index, tag, work, solver, stats, failed, cancel, share_tx,
                )
            })
            .with_context(|| format!("failed to spawn thread for {}", self.label()))?;

        self.thread = Some(handle);

        Ok(())
    }

    fn stop(&mut self) {
        self.cancel.cancel();
        // Best effort: an in-flight solver call runs to completion, the
        // thread notices the cancellation at the next round boundary.
        self.thread.take();
    }

    fn stats(&self) -> MinerStats {
        *self.stats.lock()
    }

    fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }
}
