use log::*;
use scoreboard_common::{
    InstanceId,
    relay::{FrameError, Relayed, Subscribe, decode_line, encode_line},
};
use std::{collections::HashMap, fmt::Debug, future::Future, net::SocketAddr, pin::Pin};
use thiserror::Error;
use tokio::{
    io::{self, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    select,
    sync::mpsc::{self, error::TrySendError},
    task::{self, JoinHandle},
    time::{Duration, timeout},
};

const WRITE_TIMEOUT: Duration = Duration::from_millis(500);
const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(5);
const SERVER_CHANNEL_LEN: usize = 256;
const WORKER_CHANNEL_LEN: usize = 64;

/// Where the control surface puts the messages its state changes produce
pub trait Outbox {
    /// Hands over `batch` in order. Returns how many messages were accepted.
    fn send_all(&mut self, batch: Vec<Relayed>) -> usize;

    /// Drops every display attached to `id`
    fn detach(&mut self, id: InstanceId);
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("The relay queue is full, dropped {0} messages")]
    Full(usize),
    #[error("The relay queue is full, could not {0} a display")]
    Busy(&'static str),
    #[error("The relay server has stopped")]
    Closed,
}

/// Handle to the relay server task. Sending never waits: if the server can't take a
/// batch right away the whole batch is dropped. A batch takes one queue slot however
/// many scoreboards it covers.
#[derive(Debug)]
pub struct Relay {
    tx: mpsc::Sender<ServerMessage>,
    server_join: JoinHandle<()>,
    listener_join: Option<JoinHandle<()>>,
}

impl Relay {
    /// A relay that only serves displays handed to it with [`Relay::attach`]
    pub fn new(attached_tx: mpsc::UnboundedSender<InstanceId>) -> Self {
        let (tx, rx) = mpsc::channel(SERVER_CHANNEL_LEN);
        let server_join = task::spawn(Server::new(rx, attached_tx).run_loop());

        Self {
            tx,
            server_join,
            listener_join: None,
        }
    }

    /// A relay that also accepts display connections on `port`
    pub fn listen(port: u16, attached_tx: mpsc::UnboundedSender<InstanceId>) -> Self {
        let mut relay = Self::new(attached_tx);
        relay.listener_join = Some(task::spawn(listener_loop(relay.tx.clone(), port)));
        relay
    }

    pub fn try_send(&self, batch: Vec<Relayed>) -> Result<usize, RelayError> {
        let len = batch.len();
        if len == 0 {
            return Ok(0);
        }
        self.tx
            .try_send(ServerMessage::Relay(batch))
            .map(|()| len)
            .map_err(|e| match e {
                TrySendError::Full(_) => RelayError::Full(len),
                TrySendError::Closed(_) => RelayError::Closed,
            })
    }

    pub fn attach<T>(&self, id: InstanceId, peer: String, writer: T) -> Result<(), RelayError>
    where
        T: 'static + AsyncWrite + Unpin + Send,
    {
        self.tx
            .try_send(ServerMessage::NewConnection(
                id,
                Connection {
                    peer,
                    writer: Box::new(writer),
                },
            ))
            .map_err(|e| match e {
                TrySendError::Full(_) => RelayError::Busy("attach"),
                TrySendError::Closed(_) => RelayError::Closed,
            })
    }

    pub fn try_detach(&self, id: InstanceId) -> Result<(), RelayError> {
        self.tx
            .try_send(ServerMessage::Detach(id))
            .map_err(|e| match e {
                TrySendError::Full(_) => RelayError::Busy("detach"),
                TrySendError::Closed(_) => RelayError::Closed,
            })
    }
}

impl Outbox for Relay {
    fn send_all(&mut self, batch: Vec<Relayed>) -> usize {
        match self.try_send(batch) {
            Ok(sent) => sent,
            Err(e) => {
                error!("Relay failed: {e}");
                0
            }
        }
    }

    fn detach(&mut self, id: InstanceId) {
        if let Err(e) = self.try_detach(id) {
            error!("Detaching displays of {id} failed: {e}");
        }
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingOutbox {
    pub sent: Vec<Relayed>,
    pub detached: Vec<InstanceId>,
}

#[cfg(test)]
impl RecordingOutbox {
    pub fn take(&mut self) -> Vec<Relayed> {
        std::mem::take(&mut self.sent)
    }
}

#[cfg(test)]
impl Outbox for RecordingOutbox {
    fn send_all(&mut self, batch: Vec<Relayed>) -> usize {
        let len = batch.len();
        self.sent.extend(batch);
        len
    }

    fn detach(&mut self, id: InstanceId) {
        self.detached.push(id);
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        if self.tx.try_send(ServerMessage::Stop).is_err() {
            self.server_join.abort();
        }
        if let Some(join) = self.listener_join.take() {
            join.abort();
        }
    }
}

pub struct Connection {
    peer: String,
    writer: Box<dyn AsyncWrite + Unpin + Send>,
}

impl Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum ServerMessage {
    NewConnection(InstanceId, Connection),
    Relay(Vec<Relayed>),
    Detach(InstanceId),
    Stop,
}

#[derive(Debug, Error)]
enum WorkerError {
    #[error("Write to {0} timed out")]
    Timeout(String),
    #[error(transparent)]
    IoError(#[from] io::Error),
}

async fn worker_loop(
    mut rx: mpsc::Receiver<Vec<u8>>,
    mut conn: Connection,
) -> Result<(), WorkerError> {
    while let Some(data) = rx.recv().await {
        match timeout(WRITE_TIMEOUT, conn.writer.write_all(&data[..])).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Send to {} failed: {e:?}", conn.peer);
                return Err(e.into());
            }
            Err(_) => {
                warn!("Send to {} timed out", conn.peer);
                return Err(WorkerError::Timeout(conn.peer));
            }
        }
    }

    debug!("Closing connection to {}", conn.peer);
    conn.writer.shutdown().await?;
    Ok(())
}

#[derive(Debug)]
struct WorkerHandle {
    instance: InstanceId,
    peer: String,
    tx: mpsc::Sender<Vec<u8>>,
    join: JoinHandle<Result<(), WorkerError>>,
}

#[derive(Debug)]
struct Server {
    next_id: usize,
    workers: HashMap<usize, WorkerHandle>,
    rx: mpsc::Receiver<ServerMessage>,
    attached_tx: mpsc::UnboundedSender<InstanceId>,
}

impl Server {
    fn new(
        rx: mpsc::Receiver<ServerMessage>,
        attached_tx: mpsc::UnboundedSender<InstanceId>,
    ) -> Self {
        Server {
            next_id: 0,
            workers: HashMap::new(),
            rx,
            attached_tx,
        }
    }

    fn add_worker(&mut self, instance: InstanceId, conn: Connection) {
        let (tx, rx) = mpsc::channel(WORKER_CHANNEL_LEN);
        let peer = conn.peer.clone();
        let join = task::spawn(worker_loop(rx, conn));

        info!("Display {peer} attached to scoreboard {instance}");
        self.workers.insert(
            self.next_id,
            WorkerHandle {
                instance,
                peer,
                tx,
                join,
            },
        );
        self.next_id += 1;

        if self.attached_tx.send(instance).is_err() {
            warn!("Nobody is listening for display attachments");
        }
    }

    fn send_to_workers(&mut self, relayed: &Relayed) {
        let bytes = match encode_line(relayed) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to encode {relayed:?}: {e}");
                return;
            }
        };

        let mut to_drop = vec![];
        for (id, handle) in self
            .workers
            .iter()
            .filter(|(_, handle)| handle.instance == relayed.id)
        {
            match handle.tx.try_send(bytes.clone()) {
                Ok(()) => {}
                Err(TrySendError::Closed(_)) => {
                    info!("Display {} disconnected", handle.peer);
                    to_drop.push(*id);
                }
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "Display {} is not keeping up, dropped a `{}` message",
                        handle.peer,
                        relayed.message.kind()
                    );
                }
            }
        }
        for id in to_drop {
            self.workers.remove(&id);
        }
    }

    fn detach(&mut self, instance: InstanceId) {
        // Dropping the sender lets each worker flush what it has queued, then close
        self.workers.retain(|_, handle| {
            let keep = handle.instance != instance;
            if !keep {
                info!("Detaching display {} from scoreboard {instance}", handle.peer);
            }
            keep
        });
    }

    async fn run_loop(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                ServerMessage::NewConnection(instance, conn) => self.add_worker(instance, conn),
                ServerMessage::Relay(batch) => {
                    trace!("Relaying {} messages", batch.len());
                    for relayed in &batch {
                        self.send_to_workers(relayed);
                    }
                }
                ServerMessage::Detach(instance) => self.detach(instance),
                ServerMessage::Stop => break,
            }
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        for (_, handle) in self.workers.iter() {
            handle.join.abort();
        }
    }
}

async fn handshake(tx: mpsc::Sender<ServerMessage>, stream: TcpStream, addr: SocketAddr) {
    let (read, write) = stream.into_split();
    let mut line = String::new();
    let mut reader = BufReader::new(read);

    let subscribe = match timeout(SUBSCRIBE_TIMEOUT, reader.read_line(&mut line)).await {
        Ok(Ok(0)) => {
            info!("Display {addr} left before subscribing");
            return;
        }
        Ok(Ok(_)) => decode_line::<Subscribe>(&line),
        Ok(Err(e)) => {
            warn!("Reading subscription from {addr} failed: {e:?}");
            return;
        }
        Err(_) => {
            warn!("Display {addr} did not subscribe in time");
            return;
        }
    };

    match subscribe {
        Ok(Subscribe { subscribe }) => {
            let conn = Connection {
                peer: addr.to_string(),
                writer: Box::new(write),
            };
            if tx
                .send(ServerMessage::NewConnection(subscribe, conn))
                .await
                .is_err()
            {
                warn!("Relay stopped before {addr} could attach");
            }
        }
        Err(FrameError::Empty) => warn!("Display {addr} sent an empty subscription"),
        Err(e) => warn!("Display {addr} sent an invalid subscription: {e}"),
    }
}

async fn listener_loop(tx: mpsc::Sender<ServerMessage>, port: u16) {
    info!("Starting relay listener on port {port}");
    let listener_v6 = match TcpListener::bind(("::", port)).await {
        Ok(listener) => Some(listener),
        Err(e) => {
            error!("Failed to bind to relay port {port}: {e:?}");
            None
        }
    };

    // On some OSs, we must separately listen on IPv4, but on other OSs that
    // that isn't allowed, so we just try to listen on IPv4
    let listener_v4 = TcpListener::bind(("0.0.0.0", port)).await.ok();

    if listener_v6.is_none() && listener_v4.is_none() {
        error!("No relay listener could be started, displays can't connect");
        return;
    }
    info!("Relay listener started");

    loop {
        type ListenResult = std::io::Result<(TcpStream, SocketAddr)>;

        fn create_future<'a>(
            listener: Option<&'a TcpListener>,
        ) -> Pin<Box<dyn Future<Output = ListenResult> + Send + 'a>> {
            if let Some(listener) = listener {
                Box::pin(listener.accept())
            } else {
                Box::pin(std::future::pending())
            }
        }

        let conn = select! {
            conn = create_future(listener_v6.as_ref()) => conn,
            conn = create_future(listener_v4.as_ref()) => conn,
        };

        match conn {
            Ok((stream, addr)) => {
                info!("New display connection from {addr:?}");
                task::spawn(handshake(tx.clone(), stream, addr));
            }
            Err(e) => error!("New display connection failed: {e:?}"),
        }
    }
}
