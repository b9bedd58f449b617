use {
    super::*,
    error::ClientError as Error,
    tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf},
};

mod error;

pub use error::ClientError;

pub type Result<T = (), E = ClientError> = std::result::Result<T, E>;

pub type EventReceiver = broadcast::Receiver<Event>;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub address: String,
    pub username: String,
    pub password: Option<String>,
    pub timeout: Duration,
}

enum ClientMessage {
    Connect {
        respond_to: oneshot::Sender<Result>,
    },
    Request {
        method: String,
        params: Value,
        respond_to: oneshot::Sender<Result<Message>>,
    },
    Disconnect,
}

/// Cloneable handle to the connection actor. The actor exclusively owns
/// the socket; everything else talks to it through messages, so writes are
/// naturally serialized.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    tx: mpsc::Sender<ClientMessage>,
    events: broadcast::Sender<Event>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let (tx, rx) = mpsc::channel(32);
        let (events, _) = broadcast::channel(32);

        let actor = ClientActor::new(config.clone(), rx, events.clone());
        tokio::spawn(actor.run());

        Self {
            config: Arc::new(config),
            tx,
            events,
        }
    }

    /// Dials the pool and returns the notification stream. Subscribes to
    /// events before the connection exists so no notification is missed.
    pub async fn connect(&self) -> Result<EventReceiver> {
        let events = self.events.subscribe();

        let (tx, rx) = oneshot::channel();

        self.tx
            .send(ClientMessage::Connect { respond_to: tx })
            .await
            .map_err(|_| Error::NotConnected)?;

        rx.await.map_err(|source| Error::ChannelRecv { source })??;

        Ok(events)
    }

    pub async fn disconnect(&self) {
        let _ = self.tx.send(ClientMessage::Disconnect).await;
    }

    pub fn username(&self) -> &str {
        &self.config.username
    }

    async fn request(&self, method: &str, params: Value) -> Result<Message> {
        let (tx, rx) = oneshot::channel();

        self.tx
            .send(ClientMessage::Request {
                method: method.to_string(),
                params,
                respond_to: tx,
            })
            .await
            .map_err(|_| Error::NotConnected)?;

        rx.await.map_err(|source| Error::ChannelRecv { source })?
    }

    pub async fn subscribe(&self) -> Result<SubscribeResult> {
        let params = serde_json::to_value(Subscribe {
            user_agent: USER_AGENT.into(),
        })
        .map_err(|source| Error::Serialization { source })?;

        match self.request("mining.subscribe", params).await? {
            Message::Response {
                result: Some(result),
                error: None,
                ..
            } => serde_json::from_value(result).map_err(|source| Error::Serialization { source }),
            Message::Response {
                error: Some(err), ..
            } => Err(Error::Protocol {
                message: format!("mining.subscribe error: {err}"),
            }),
            _ => Err(Error::Protocol {
                message: "unexpected mining.subscribe response".to_string(),
            }),
        }
    }

    pub async fn authorize(&self) -> Result {
        let params = serde_json::to_value(Authorize {
            username: self.config.username.clone(),
            password: Some(
                self.config
                    .password
                    .clone()
                    .unwrap_or_else(|| "x".to_string()),
            ),
        })
        .map_err(|source| Error::Serialization { source })?;

        match self.request("mining.authorize", params).await? {
            Message::Response {
                result: Some(result),
                error: None,
                ..
            } => {
                let authorized: bool = serde_json::from_value(result)
                    .map_err(|source| Error::Serialization { source })?;

                if authorized {
                    Ok(())
                } else {
                    Err(Error::Protocol {
                        message: "unauthorized".to_string(),
                    })
                }
            }
            Message::Response {
                error: Some(err), ..
            } => Err(Error::Protocol {
                message: format!("mining.authorize error: {err}"),
            }),
            _ => Err(Error::Protocol {
                message: "unexpected mining.authorize response".to_string(),
            }),
        }
    }

    pub async fn submit(
        &self,
        job_id: JobId,
        extranonce2: Extranonce,
        ntime: Ntime,
        nonce: Nonce,
    ) -> Result<Submit> {
        let submit = Submit {
            username: self.config.username.clone(),
            job_id,
            extranonce2,
            ntime,
            nonce,
        };

        let params = serde_json::to_value(&submit)
            .map_err(|source| Error::Serialization { source })?;

        match self.request("mining.submit", params).await? {
            Message::Response {
                reject_reason: Some(reason),
                ..
            } => Err(Error::Protocol {
                message: format!("share rejected: {reason}"),
            }),
            Message::Response {
                error: Some(err), ..
            } => Err(Error::Protocol {
                message: format!("mining.submit error: {err}"),
            }),
            Message::Response {
                result: Some(result),
                error: None,
                ..
            } => {
                let accepted: bool = serde_json::from_value(result)
                    .map_err(|source| Error::Serialization { source })?;

                if accepted {
                    Ok(submit)
                } else {
                    Err(Error::Protocol {
                        message: "share rejected".to_string(),
                    })
                }
            }
            _ => Err(Error::Protocol {
                message: "unexpected mining.submit response".to_string(),
            }),
        }
    }
}

struct ConnectionState {
    writer: BufWriter<OwnedWriteHalf>,
    reader_handle: task::JoinHandle<()>,
}

enum Incoming {
    Message(Message),
    Disconnected,
    Error(ClientError),
}

struct ClientActor {
    config: ClientConfig,
    rx: mpsc::Receiver<ClientMessage>,
    events: broadcast::Sender<Event>,
    id_counter: u64,
    pending: BTreeMap<Id, oneshot::Sender<Result<Message>>>,
    connection: Option<ConnectionState>,
}

impl ClientActor {
    fn new(
        config: ClientConfig,
        rx: mpsc::Receiver<ClientMessage>,
        events: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            config,
            rx,
            events,
            id_counter: 0,
            pending: BTreeMap::new(),
            connection: None,
        }
    }

    async fn run(mut self) {
        let (incoming_tx, mut incoming_rx) = mpsc::channel::<Incoming>(32);

        loop {
            tokio::select! {
                message = self.rx.recv() => {
                    match message {
                        Some(ClientMessage::Connect { respond_to }) => {
                            let result = self.handle_connect(incoming_tx.clone()).await;
                            let _ = respond_to.send(result);
                        }
                        Some(ClientMessage::Request { method, params, respond_to }) => {
                            let id = self.next_id();
                            self.pending.insert(id.clone(), respond_to);

                            if let Err(err) = self.write_request(id.clone(), method, params).await {
                                if let Some(tx) = self.pending.remove(&id) {
                                    let _ = tx.send(Err(err));
                                }
                                self.handle_disconnect().await;
                            }
                        }
                        Some(ClientMessage::Disconnect) | None => {
                            self.handle_disconnect().await;
                            break;
                        }
                    }
                }
                Some(incoming) = incoming_rx.recv() => {
                    self.handle_incoming(incoming).await;
                }
            }
        }
    }

    fn next_id(&mut self) -> Id {
        let id = self.id_counter;
        self.id_counter += 1;
        Id::Number(id)
    }

    async fn handle_connect(&mut self, incoming_tx: mpsc::Sender<Incoming>) -> Result {
        if self.connection.is_some() {
            self.handle_disconnect().await;
        }

        let stream = tokio::time::timeout(
            self.config.timeout,
            TcpStream::connect(&self.config.address),
        )
        .await
        .map_err(|source| Error::Timeout { source })?
        .map_err(|source| Error::Io { source })?;

        let (reader, writer) = stream.into_split();

        let reader_handle = tokio::spawn(Self::read_lines(BufReader::new(reader), incoming_tx));

        self.connection = Some(ConnectionState {
            writer: BufWriter::new(writer),
            reader_handle,
        });

        debug!("Connected to {}", self.config.address);

        Ok(())
    }

    async fn write_request(&mut self, id: Id, method: String, params: Value) -> Result {
        let connection = self.connection.as_mut().ok_or(Error::NotConnected)?;

        let message = Message::Request { id, method, params };

        let frame = serde_json::to_string(&message)
            .map_err(|source| Error::Serialization { source })?
            + "\n";

        connection
            .writer
            .write_all(frame.as_bytes())
            .await
            .map_err(|source| Error::Io { source })?;

        connection
            .writer
            .flush()
            .await
            .map_err(|source| Error::Io { source })?;

        Ok(())
    }

    async fn handle_disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.reader_handle.abort();
            debug!("Disconnected");
        }

        for (_, tx) in std::mem::take(&mut self.pending) {
            let _ = tx.send(Err(Error::NotConnected));
        }

        let _ = self.events.send(Event::Disconnected);
    }

    async fn handle_incoming(&mut self, incoming: Incoming) {
        match incoming {
            Incoming::Message(Message::Response {
                id,
                result,
                error,
                reject_reason,
            }) => {
                if let Some(tx) = self.pending.remove(&id) {
                    let _ = tx.send(Ok(Message::Response {
                        id,
                        result,
                        error,
                        reject_reason,
                    }));
                } else {
                    warn!("Unmatched response id={id}");
                }
            }
            Incoming::Message(Message::Notification { method, params }) => {
                self.handle_notification(method, params);
            }
            Incoming::Message(message) => {
                warn!("Ignoring unexpected message: {message:?}");
            }
            Incoming::Disconnected => {
                self.handle_disconnect().await;
            }
            Incoming::Error(err) => {
                error!("Reader error: {err}");
                self.handle_disconnect().await;
            }
        }
    }

    fn handle_notification(&self, method: String, params: Value) {
        match method.as_str() {
            "mining.notify" => match serde_json::from_value::<Notify>(params) {
                Ok(notify) => {
                    let _ = self.events.send(Event::Notify(notify));
                }
                Err(err) => warn!("Invalid mining.notify, keeping current job: {err}"),
            },
            "mining.set_difficulty" => match serde_json::from_value::<SetDifficulty>(params) {
                Ok(set_difficulty) => {
                    let _ = self
                        .events
                        .send(Event::SetDifficulty(set_difficulty.difficulty()));
                }
                Err(err) => warn!("Failed to parse mining.set_difficulty: {err}"),
            },
            _ => warn!("Unhandled notification: {method}"),
        }
    }

    async fn read_lines(mut reader: BufReader<OwnedReadHalf>, incoming_tx: mpsc::Sender<Incoming>) {
        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    let _ = incoming_tx.send(Incoming::Disconnected).await;
                    break;
                }
                Ok(_) => {}
                Err(source) => {
                    let _ = incoming_tx
                        .send(Incoming::Error(Error::Io { source }))
                        .await;
                    break;
                }
            }

            match serde_json::from_str::<Message>(&line) {
                Ok(message) => {
                    let _ = incoming_tx.send(Incoming::Message(message)).await;
                }
                Err(err) => warn!("Dropping invalid JSON line {line:?}: {err}"),
            }
        }
    }
}
