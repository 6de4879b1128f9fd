use {
    super::*,
    crate::miner::{
        ipc::{SolverReport, WorkOrder},
        pow::Pow,
    },
    std::io::{BufRead, Write},
};

/// The out-of-process half of a process-backed worker. Runs a plain
/// synchronous solve loop: drains its stdin work queue without blocking once
/// per round, emits shares and periodic stats deltas on stdout, and exits
/// when the parent closes the pipe.
#[derive(Debug, Parser)]
pub(crate) struct SolverBackend {
    #[arg(long, value_name = "PLATFORM:DEVICE", help = "OpenCL <DEVICE> to drive.")]
    device: DeviceId,
    #[arg(long, help = "Log each solver round.")]
    verbose: bool,
}

impl SolverBackend {
    pub(crate) fn run(self) -> Result {
        info!("Solver backend for device {} starting", self.device);

        let mut solver = IdleSolver::for_device(self.device, self.verbose);

        let (work_tx, work_rx) = std::sync::mpsc::channel();

        // Blocking stdin reads happen on their own thread; the solve loop
        // polls the channel so a job update is at most one round stale.
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };

                match serde_json::from_str::<WorkOrder>(&line) {
                    Ok(order) => {
                        if work_tx.send(order).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Ignoring unparsable work order: {e}"),
                }
            }
            // work_tx drops on EOF, which ends the solve loop below
        });

        let mut pow: Option<Pow> = None;
        let mut work: Option<(Job, NoncePart)> = None;
        let mut stats = MinerStats::ZERO;
        let mut last_flush = Instant::now();

        loop {
            loop {
                match work_rx.try_recv() {
                    Ok(WorkOrder::Work { job, nonce1, tag }) => {
                        info!("Received job {} for partition tag {tag}", job.job_id());

                        if pow.as_ref().map(Pow::tag) != Some(tag) {
                            pow = Some(Pow::new(tag));
                        }

                        work = Some((job, nonce1));
                    }
                    Err(std::sync::mpsc::TryRecvError::Empty) => break,
                    Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                        debug!("Work queue closed, backend exiting");
                        return Ok(());
                    }
                }
            }

            let (Some(pow), Some((job, nonce1))) = (pow.as_mut(), work.as_ref()) else {
                debug!("No job yet, waiting");
                thread::sleep(WORK_POLL_INTERVAL);
                continue;
            };

            match pow.solve_round(job, nonce1, &mut solver) {
                Ok(round) => {
                    stats.record_solutions(round.candidate_count, round.elapsed);

                    for (nonce_suffix, solution) in round.shares {
                        emit(&SolverReport::Share {
                            job_id: job.job_id().to_string(),
                            nonce_suffix,
                            solution,
                        })?;
                    }
                }
                Err(e) => {
                    let _ = emit(&SolverReport::Fatal {
                        message: format!("{e:#}"),
                    });
                    return Err(e);
                }
            }

            if last_flush.elapsed() >= STATS_FLUSH_PERIOD && stats != MinerStats::ZERO {
                emit(&SolverReport::Stats {
                    stats: std::mem::take(&mut stats),
                })?;
                last_flush = Instant::now();
            }
        }
    }
}

fn emit(report: &SolverReport) -> Result {
    let mut line = serde_json::to_string(report)?;
    line.push('\n');

    let mut stdout = io::stdout().lock();
    stdout.write_all(line.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
