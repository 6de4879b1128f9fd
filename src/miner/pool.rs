use super::*;

/// Owns the ordered set of solver-workers. Partition tags are assigned
/// sequentially at construction, which is what keeps the workers' search
/// spaces disjoint; nonce1 and jobs are fanned out to every worker, shares
/// come back over a single channel.
pub(crate) struct MinerPool {
    workers: Vec<Box<dyn Worker>>,
    stats_cells: Vec<Arc<Mutex<MinerStats>>>,
    cpu_count: usize,
    share_tx: mpsc::Sender<Share>,
    share_rx: Option<mpsc::Receiver<Share>>,
    cancel: CancellationToken,
    started: bool,
}

impl MinerPool {
    pub(crate) fn new(cancel: CancellationToken) -> Self {
        let (share_tx, share_rx) = mpsc::channel(SHARE_CHANNEL_CAPACITY);

        Self {
            workers: Vec::new(),
            stats_cells: Vec::new(),
            cpu_count: 0,
            share_tx,
            share_rx: Some(share_rx),
            cancel,
            started: false,
        }
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn next_tag(&self) -> Result<u8> {
        ensure!(
            self.workers.len() < MAX_WORKERS,
            "a pool holds at most {MAX_WORKERS} workers"
        );
        Ok(self.workers.len() as u8)
    }

    pub(crate) fn add_cpu_worker(&mut self, solver: Box<dyn Solver>) -> Result {
        let tag = self.next_tag()?;
        let stats = Arc::new(Mutex::new(MinerStats::ZERO));

        let worker = CpuWorker::new(
            self.workers.len(),
            self.cpu_count,
            tag,
            solver,
            stats.clone(),
            self.cancel.child_token(),
            self.share_tx.clone(),
        );

        debug!("Added {} with partition tag {tag}", worker.label());

        self.cpu_count += 1;
        self.stats_cells.push(stats);
        self.workers.push(Box::new(worker));

        Ok(())
    }

    pub(crate) fn add_gpu_worker(&mut self, device: DeviceId, instance: u32) -> Result {
        let tag = self.next_tag()?;
        let stats = Arc::new(Mutex::new(MinerStats::ZERO));

        let worker = GpuWorker::new(
            self.workers.len(),
            device,
            instance,
            tag,
            stats.clone(),
            self.cancel.child_token(),
            self.share_tx.clone(),
        );

        debug!("Added {} with partition tag {tag}", worker.label());

        self.stats_cells.push(stats);
        self.workers.push(Box::new(worker));

        Ok(())
    }

    /// Launches every worker. Workers start at most once; repeat calls are
    /// no-ops.
    pub(crate) fn start(&mut self) -> Result {
        if self.started {
            return Ok(());
        }

        for worker in &mut self.workers {
            worker.start()?;
        }

        self.started = true;

        Ok(())
    }

    pub(crate) fn stop(&mut self) {
        info!("Stopping {} workers", self.workers.len());

        self.cancel.cancel();

        for worker in &mut self.workers {
            worker.stop();
        }
    }

    pub(crate) fn set_nonce1(&mut self, nonce1: &NoncePart) {
        for worker in &mut self.workers {
            worker.set_nonce1(nonce1);
        }
    }

    pub(crate) fn receive_job(&mut self, job: Arc<Job>) {
        for worker in &mut self.workers {
            worker.receive_job(&job);
        }
    }

    pub(crate) fn take_shares(&mut self) -> Result<mpsc::Receiver<Share>> {
        self.share_rx.take().context("share stream already taken")
    }

    pub(crate) fn stats_cell(&self, worker: usize) -> Option<Arc<Mutex<MinerStats>>> {
        self.stats_cells.get(worker).cloned()
    }

    pub(crate) fn total(&self) -> MinerStats {
        self.stats_cells.iter().map(|cell| *cell.lock()).sum()
    }

    /// Per-worker and pool-wide report for the periodic display.
    pub(crate) fn format_stats(&self) -> String {
        let mut out = String::from("======== Mining stats ========\n");

        for worker in &self.workers {
            let stats = worker.stats();
            let marker = if worker.is_failed() { "  (failed)" } else { "" };
            out.push_str(&format!(
                "{:<12} {:>14}  accepted {:>5}  rejected {:>5}{}\n",
                worker.label(),
                stats.hash_rate().to_string(),
                stats.accepted_share_count,
                stats.rejected_share_count,
                marker,
            ));
        }

        let total = self.total();
        out.push_str(&format!(
            "{:<12} {:>14}  accepted {:>5}  rejected {:>5}  ({:.1}% rejected)\n",
            "pool",
            total.hash_rate().to_string(),
            total.accepted_share_count,
            total.rejected_share_count,
            total.rejected_ratio() * 100.0,
        ));

        out
    }
}
