use super::*;

/// Round-robins over the configured servers forever. Workers start once and
/// persist across reconnects; every connection failure is logged and followed
/// by a fixed delay before the next server is tried.
pub(crate) struct ServerSwitcher {
    servers: Vec<Server>,
    pool: MinerPool,
}

impl ServerSwitcher {
    pub(crate) fn new(servers: Vec<Server>, pool: MinerPool) -> Self {
        Self { servers, pool }
    }

    pub(crate) async fn run(mut self, cancel: CancellationToken) -> Result {
        ensure!(!self.servers.is_empty(), "no servers configured");

        info!("Starting {} workers", self.pool.worker_count());
        self.pool.start()?;

        let mut shares = self.pool.take_shares()?;

        let mut attempt = 0;
        while !cancel.is_cancelled() {
            let server = &self.servers[attempt % self.servers.len()];
            attempt += 1;

            info!("Connecting to {server}");

            match session::run(server, &mut self.pool, &mut shares, cancel.clone()).await {
                Ok(()) => break,
                Err(err) => error!("Connection to {server} failed: {err:#}"),
            }

            info!("Reconnecting in {}s", RECONNECT_DELAY.as_secs());

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(RECONNECT_DELAY) => {}
            }
        }

        self.pool.stop();

        Ok(())
    }
}
