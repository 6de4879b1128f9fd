use {
    super::*,
    error::{
        ConnectTimeoutSnafu, DisconnectReason, IoSnafu, ProtocolSnafu, RequestTimeoutSnafu,
        SerializationSnafu, UnauthorizedSnafu,
    },
};

mod error;

pub use error::ClientError;

pub type Result<T = (), E = ClientError> = std::result::Result<T, E>;

type Pending = Arc<Mutex<BTreeMap<Id, oneshot::Sender<Result<Message>>>>>;
type Fault = Arc<Mutex<Option<DisconnectReason>>>;

/// Stratum protocol client: owns the socket, the request-id correlation
/// table, and the background reader that routes notifications and fulfills
/// pending calls. Per-connection; the supervisor builds a fresh one for every
/// attempt.
pub struct Client {
    pub events: mpsc::Receiver<Event>,
    requests: Requests,
    listener: tokio::task::JoinHandle<()>,
    username: String,
    password: String,
}

/// The request half, cloneable so submits can run concurrently with the
/// session loop without stalling notification delivery.
#[derive(Clone)]
struct Requests {
    writer: Arc<tokio::sync::Mutex<BufWriter<OwnedWriteHalf>>>,
    pending: Pending,
    fault: Fault,
    id_counter: Arc<AtomicU64>,
    timeout: Duration,
}

impl Client {
    pub async fn connect(
        address: impl tokio::net::ToSocketAddrs,
        username: String,
        password: String,
        timeout: Duration,
    ) -> Result<Self> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(address))
            .await
            .context(ConnectTimeoutSnafu)?
            .context(IoSnafu)?;

        stream.set_nodelay(true).context(IoSnafu)?;

        let (reader, writer) = stream.into_split();
        let writer = Arc::new(tokio::sync::Mutex::new(BufWriter::new(writer)));
        let reader = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_MESSAGE_SIZE));

        let (events_tx, events_rx) = mpsc::channel(32);

        let pending: Pending = Arc::new(Mutex::new(BTreeMap::new()));
        let fault: Fault = Arc::new(Mutex::new(None));

        let listener = {
            let pending = pending.clone();
            let fault = fault.clone();
            tokio::spawn(async move { Self::listener(reader, events_tx, pending, fault).await })
        };

        Ok(Self {
            events: events_rx,
            requests: Requests {
                writer,
                pending,
                fault,
                id_counter: Arc::new(AtomicU64::new(0)),
                timeout,
            },
            listener,
            username,
            password,
        })
    }

    /// The error behind a closed notification stream.
    pub fn disconnect_error(&self) -> ClientError {
        self.requests.disconnect_error()
    }

    pub async fn subscribe(
        &self,
        user_agent: String,
        host: String,
        port: u16,
    ) -> Result<SubscribeResult> {
        let params = serde_json::to_value(Subscribe {
            user_agent,
            session_id: None,
            host,
            port,
        })
        .context(SerializationSnafu)?;

        match self.requests.call("mining.subscribe", params).await? {
            Message::Response {
                result: Some(result),
                error: None,
                ..
            } => serde_json::from_value(result).context(SerializationSnafu),
            Message::Response {
                error: Some(error), ..
            } => ProtocolSnafu {
                message: format!("mining.subscribe failed: {error}"),
            }
            .fail(),
            _ => ProtocolSnafu {
                message: "mining.subscribe returned no result",
            }
            .fail(),
        }
    }

    pub async fn authorize(&self) -> Result {
        let params = serde_json::to_value(Authorize {
            username: self.username.clone(),
            password: self.password.clone(),
        })
        .context(SerializationSnafu)?;

        match self.requests.call("mining.authorize", params).await? {
            Message::Response {
                result: Some(Value::Bool(true)),
                error: None,
                ..
            } => Ok(()),
            Message::Response {
                error: Some(error), ..
            } => UnauthorizedSnafu {
                reason: error.to_string(),
            }
            .fail(),
            _ => UnauthorizedSnafu {
                reason: "authorization refused",
            }
            .fail(),
        }
    }

    pub fn submitter(&self) -> Submitter {
        Submitter {
            requests: self.requests.clone(),
            username: self.username.clone(),
        }
    }

    async fn listener(
        mut reader: FramedRead<OwnedReadHalf, LinesCodec>,
        events: mpsc::Sender<Event>,
        pending: Pending,
        fault: Fault,
    ) {
        let reason = Self::observe(&mut reader, &events, &pending).await;

        debug!("Reader stopped: {reason}");

        *fault.lock() = Some(reason.clone());

        let drained = std::mem::take(&mut *pending.lock());
        for (_, tx) in drained {
            if tx.send(Err(reason.clone().into_error())).is_err() {
                debug!("Disconnect notice dropped: caller gave up");
            }
        }

        // events sender drops here, which closes the notification stream and
        // lets the session observe the failure
    }

    async fn observe(
        reader: &mut FramedRead<OwnedReadHalf, LinesCodec>,
        events: &mpsc::Sender<Event>,
        pending: &Pending,
    ) -> DisconnectReason {
        loop {
            let line = match reader.next().await {
                None => return DisconnectReason::ServerClosed,
                Some(Err(e)) => return DisconnectReason::Read(e.to_string()),
                Some(Ok(line)) => line,
            };

            let msg: Message = match serde_json::from_str(&line) {
                Ok(msg) => msg,
                Err(e) => {
                    return DisconnectReason::Protocol(format!(
                        "unparsable message {line:?}: {e}"
                    ));
                }
            };

            match msg {
                Message::Response { id, result, error } => {
                    let tx = pending.lock().remove(&id);

                    match tx {
                        Some(tx) => {
                            if tx.send(Ok(Message::Response { id, result, error })).is_err() {
                                debug!("Response dropped: caller gave up");
                            }
                        }
                        None => warn!("Unmatched response id={id}, dropping"),
                    }
                }
                Message::Notification { method, params } => match method.as_str() {
                    "mining.notify" => match serde_json::from_value::<Notify>(params) {
                        Ok(notify) => {
                            if events.send(Event::Job(notify)).await.is_err() {
                                return DisconnectReason::Stopped;
                            }
                        }
                        Err(e) => {
                            return DisconnectReason::Protocol(format!(
                                "bad mining.notify params: {e}"
                            ));
                        }
                    },
                    "mining.set_target" => match serde_json::from_value::<SetTarget>(params) {
                        Ok(set_target) => {
                            if events.send(Event::Target(set_target.0)).await.is_err() {
                                return DisconnectReason::Stopped;
                            }
                        }
                        Err(e) => {
                            return DisconnectReason::Protocol(format!(
                                "bad mining.set_target params: {e}"
                            ));
                        }
                    },
                    _ => warn!("Unhandled notification: {method}"),
                },
                Message::Request { id, method, .. } => {
                    warn!("Unexpected request from server: method={method} id={id}");
                }
            }
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

impl Requests {
    fn disconnect_error(&self) -> ClientError {
        self.fault
            .lock()
            .clone()
            .map(DisconnectReason::into_error)
            .unwrap_or(ClientError::ConnectionClosed)
    }

    async fn call(&self, method: &'static str, params: Value) -> Result<Message> {
        let id = Id::Number(self.id_counter.fetch_add(1, Ordering::Relaxed));

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id.clone(), tx);

        let frame = serde_json::to_string(&Message::Request {
            id: id.clone(),
            method: method.to_string(),
            params,
        })
        .context(SerializationSnafu)?
            + "\n";

        let written = {
            let mut writer = self.writer.lock().await;
            match writer.write_all(frame.as_bytes()).await {
                Ok(()) => writer.flush().await,
                Err(e) => Err(e),
            }
        };

        if let Err(source) = written {
            self.pending.lock().remove(&id);
            return Err(ClientError::Io { source });
        }

        match timeout(self.timeout, rx).await {
            Err(_) => {
                self.pending.lock().remove(&id);
                RequestTimeoutSnafu { method }.fail()
            }
            Ok(Err(_)) => Err(self.disconnect_error()),
            Ok(Ok(response)) => response,
        }
    }
}

/// Submit-only handle handed to in-flight submission tasks.
#[derive(Clone)]
pub struct Submitter {
    requests: Requests,
    username: String,
}

impl Submitter {
    /// Submits a validated share. `Ok(true)` is an accepted share, `Ok(false)`
    /// a rejected one; transport failures surface as errors and end the
    /// connection.
    pub async fn submit(
        &self,
        job: &Job,
        nonce_suffix: NoncePart,
        solution: Solution,
    ) -> Result<bool> {
        let params = serde_json::to_value(Submit {
            username: self.username.clone(),
            job_id: job.job_id().to_string(),
            ntime: job.ntime_hex(),
            nonce_suffix,
            solution,
        })
        .context(SerializationSnafu)?;

        match self.requests.call("mining.submit", params).await? {
            Message::Response {
                result: Some(Value::Bool(accepted)),
                error: None,
                ..
            } => Ok(accepted),
            Message::Response {
                error: Some(error), ..
            } => {
                warn!("mining.submit error for job {}: {error}", job.job_id());
                Ok(false)
            }
            _ => Ok(false),
        }
    }
}
