use super::*;

/// One connection's lifetime: connect, subscribe, authorize, then route
/// notifications to the pool and shares back to the server until something
/// fails or the run is cancelled. The pool and the share stream outlive the
/// session; only the client is torn down on reconnect.
pub(crate) async fn run(
    server: &Server,
    pool: &mut MinerPool,
    shares: &mut mpsc::Receiver<Share>,
    cancel: CancellationToken,
) -> Result {
    let address = resolve_server(server).await?;

    let mut client = Client::connect(
        address,
        server.username.clone(),
        server.password.clone(),
        REQUEST_TIMEOUT,
    )
    .await?;

    let subscription = client
        .subscribe(USER_AGENT.into(), server.host.clone(), server.port)
        .await?;

    info!("Subscribed to {server}, nonce1 {}", subscription.nonce1);

    pool.set_nonce1(&subscription.nonce1);

    client.authorize().await?;

    info!("Authorized as {}", server.username);

    let submitter = client.submitter();

    // Target and job arrive as separate notifications. Jobs are stamped at
    // delivery time and never mutated: a target update re-delivers the
    // current job as a fresh stamped copy, and a job that arrives before any
    // target is withheld until one shows up.
    let mut target: Option<Target> = None;
    let mut current: Option<Job> = None;

    let mut submissions: JoinSet<Result> = JoinSet::new();

    let mut display = interval(STATS_DISPLAY_PERIOD);
    display.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            event = client.events.recv() => match event {
                Some(Event::Job(notify)) => {
                    let job = Job::from_notify(&notify).context("malformed job notification")?;
                    current = Some(job.clone());

                    match target {
                        Some(target) => {
                            let mut job = job;
                            job.set_target(target);
                            info!("New job {}", job.job_id());
                            pool.receive_job(Arc::new(job));
                        }
                        None => {
                            warn!("Withholding job {} until a target arrives", job.job_id());
                        }
                    }
                }
                Some(Event::Target(new_target)) => {
                    info!("Target set to {new_target}");
                    target = Some(new_target);

                    // The current job goes out again as a fresh copy stamped
                    // with the new target, so no worker keeps validating
                    // against the old one.
                    if let Some(job) = &current {
                        let mut job = job.clone();
                        job.set_target(new_target);
                        info!("Delivering job {} with updated target", job.job_id());
                        pool.receive_job(Arc::new(job));
                    }
                }
                None => {
                    return Err(client.disconnect_error().into());
                }
            },
            Some(share) = shares.recv() => {
                let submitter = submitter.clone();
                let stats = pool.stats_cell(share.worker);
                submissions.spawn(submit_share(submitter, share, stats));
            }
            Some(joined) = submissions.join_next(), if !submissions.is_empty() => {
                joined.context("submission task panicked")??;
            }
            _ = display.tick() => {
                println!("{}", pool.format_stats());
            }
            _ = cancel.cancelled() => {
                info!("Session interrupted");
                return Ok(());
            }
        }
    }
}

/// Runs concurrently with the session loop so a slow submit never stalls
/// notification delivery. `Ok` covers both accepted and rejected shares;
/// transport errors propagate and end the connection.
async fn submit_share(
    submitter: Submitter,
    share: Share,
    stats: Option<Arc<Mutex<MinerStats>>>,
) -> Result {
    let start = Instant::now();

    let accepted = submitter
        .submit(&share.job, share.nonce_suffix, share.solution)
        .await?;

    let elapsed = start.elapsed();

    if accepted {
        info!(
            "Share accepted for job {} in {:.2?}",
            share.job.job_id(),
            elapsed
        );
    } else {
        warn!(
            "Share rejected for job {} in {:.2?}",
            share.job.job_id(),
            elapsed
        );
    }

    if let Some(stats) = stats {
        let mut stats = stats.lock();
        if accepted {
            stats.record_accepted(elapsed);
        } else {
            stats.record_rejected(elapsed);
        }
    }

    Ok(())
}
