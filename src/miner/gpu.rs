use super::*;

/// Process-backed worker: the solve loop runs in a child process (the hidden
/// `solver-backend` subcommand) to isolate device-driver state per instance.
/// Work flows down over the child's stdin, shares and periodic stats
/// snapshots flow back over its stdout.
pub(crate) struct GpuWorker {
    index: usize,
    device: DeviceId,
    instance: u32,
    tag: u8,
    nonce1: Option<NoncePart>,
    latest_job: Arc<Mutex<Option<Arc<Job>>>>,
    stats: Arc<Mutex<MinerStats>>,
    failed: Arc<AtomicBool>,
    cancel: CancellationToken,
    share_tx: mpsc::Sender<Share>,
    orders: Option<mpsc::UnboundedSender<WorkOrder>>,
}

impl GpuWorker {
    pub(crate) fn new(
        index: usize,
        device: DeviceId,
        instance: u32,
        tag: u8,
        stats: Arc<Mutex<MinerStats>>,
        cancel: CancellationToken,
        share_tx: mpsc::Sender<Share>,
    ) -> Self {
        Self {
            index,
            device,
            instance,
            tag,
            nonce1: None,
            latest_job: Arc::new(Mutex::new(None)),
            stats,
            failed: Arc::new(AtomicBool::new(false)),
            cancel,
            share_tx,
            orders: None,
        }
    }

    /// Forwards the current work to the backend once both job and nonce1 are
    /// known; either alone is useless to the solve loop.
    fn push_order(&self) {
        let Some(orders) = &self.orders else {
            return;
        };

        let Some(nonce1) = &self.nonce1 else {
            return;
        };

        let job = self.latest_job.lock().clone();
        let Some(job) = job else {
            return;
        };

        let order = WorkOrder::Work {
            job: (*job).clone(),
            nonce1: nonce1.clone(),
            tag: self.tag,
        };

        if orders.send(order).is_err() {
            debug!("{} backend order channel closed", self.label());
        }
    }

    async fn order_pump(
        mut orders: mpsc::UnboundedReceiver<WorkOrder>,
        mut stdin: tokio::process::ChildStdin,
        label: String,
    ) {
        while let Some(order) = orders.recv().await {
            let line = match serde_json::to_string(&order) {
                Ok(line) => line + "\n",
                Err(e) => {
                    error!("{label} failed to encode work order: {e}");
                    continue;
                }
            };

            if stdin.write_all(line.as_bytes()).await.is_err() || stdin.flush().await.is_err() {
                error!("{label} backend stdin closed");
                break;
            }
        }
        // dropping stdin is the stop signal for the backend
    }

    #[allow(clippy::too_many_arguments)]
    async fn report_loop(
        mut child: tokio::process::Child,
        stdout: tokio::process::ChildStdout,
        latest_job: Arc<Mutex<Option<Arc<Job>>>>,
        stats: Arc<Mutex<MinerStats>>,
        failed: Arc<AtomicBool>,
        share_tx: mpsc::Sender<Share>,
        index: usize,
        label: String,
        cancel: CancellationToken,
    ) {
        let mut lines = BufReader::new(stdout).lines();

        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => line,
            };

            match line {
                Ok(Some(line)) => match serde_json::from_str::<SolverReport>(&line) {
                    Ok(SolverReport::Share {
                        job_id,
                        nonce_suffix,
                        solution,
                    }) => {
                        let job = latest_job.lock().clone();
                        match job {
                            Some(job) if job.job_id() == job_id => {
                                let share = Share {
                                    worker: index,
                                    job,
                                    nonce_suffix,
                                    solution,
                                };
                                if share_tx.send(share).await.is_err() {
                                    break;
                                }
                            }
                            _ => debug!("{label} dropping share for stale job {job_id}"),
                        }
                    }
                    Ok(SolverReport::Stats { stats: delta }) => {
                        *stats.lock() += delta;
                    }
                    Ok(SolverReport::Fatal { message }) => {
                        error!("{label} backend failed: {message}");
                        failed.store(true, Ordering::Relaxed);
                        break;
                    }
                    Err(e) => warn!("{label} unparsable backend report {line:?}: {e}"),
                },
                Ok(None) => {
                    debug!("{label} backend exited");
                    break;
                }
                Err(e) => {
                    error!("{label} backend read error: {e}");
                    break;
                }
            }
        }

        // reap the child so it does not linger as a zombie
        child.start_kill().ok();
        child.wait().await.ok();
    }
}

impl Worker for GpuWorker {
    fn label(&self) -> String {
        format!("GPU[{}]#{}", self.device, self.instance)
    }

    fn partition_tag(&self) -> u8 {
        self.tag
    }

    fn set_nonce1(&mut self, nonce1: &NoncePart) {
        self.nonce1 = Some(nonce1.clone());
        self.push_order();
    }

    fn receive_job(&mut self, job: &Arc<Job>) {
        *self.latest_job.lock() = Some(job.clone());
        self.push_order();
    }

    fn start(&mut self) -> Result {
        if self.orders.is_some() {
            bail!("{} already started", self.label());
        }

        let exe = env::current_exe().context("cannot locate own executable")?;

        let mut command = tokio::process::Command::new(exe);
        command
            .arg("solver-backend")
            .arg("--device")
            .arg(self.device.to_string())
            .stdin(process::Stdio::piped())
            .stdout(process::Stdio::piped())
            .kill_on_drop(true);

        if tracing::enabled!(tracing::Level::DEBUG) {
            command.arg("--verbose");
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to spawn solver backend for {}", self.label()))?;

        let stdin = child.stdin.take().context("backend stdin unavailable")?;
        let stdout = child.stdout.take().context("backend stdout unavailable")?;

        let (orders_tx, orders_rx) = mpsc::unbounded_channel();
        self.orders = Some(orders_tx);

        tokio::spawn(Self::order_pump(orders_rx, stdin, self.label()));

        tokio::spawn(Self::report_loop(
            child,
            stdout,
            self.latest_job.clone(),
            self.stats.clone(),
            self.failed.clone(),
            self.share_tx.clone(),
            self.index,
            self.label(),
            self.cancel.clone(),
        ));

        info!("{} backend started", self.label());

        // Work may already have been broadcast before the backend came up.
        self.push_order();

        Ok(())
    }

    fn stop(&mut self) {
        self.cancel.cancel();
        // Closing the order channel drops the backend's stdin, which it
        // treats as the signal to exit.
        self.orders.take();
    }

    fn stats(&self) -> MinerStats {
        *self.stats.lock()
    }

    fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }
}
