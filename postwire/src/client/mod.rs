//! The [`Client`] trait and the socket-backed [`PgClient`].
//!
//! A client carries out request/response cycles: every [`Request`] is answered by the backend
//! messages up to (and excluding) the terminating `ReadyForQuery`.
use std::{
    collections::HashMap,
    fmt,
    pin::Pin,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU8, Ordering},
    },
    task::{Context, Poll},
};
use tokio::sync::{
    broadcast,
    mpsc::{self, UnboundedReceiver, UnboundedSender, error::SendError},
    oneshot,
};

use crate::{
    Result,
    common::verbose,
    connection::{Config, startup},
    postgres::{
        BackendMessage, Diagnostic, Request, TransactionStatus,
        backend::{BackendKeyData, NotificationResponse},
    },
};

mod socket;
mod stream;
mod worker;

pub use socket::Socket;
pub(crate) use stream::PgStream;

/// Capacity of notice and notification subscriptions, lagging subscribers miss the oldest.
const BROADCAST_CAPACITY: usize = 64;

/// A connection that can exchange messages with postgres.
///
/// Exchanges are answered in submission order.
pub trait Client: Send + Sync + 'static {
    /// Submit encoded frontend messages, returns the backend messages answering them.
    ///
    /// The request must end with a message that makes the backend report `ReadyForQuery`,
    /// either `Sync` or a simple `Query`.
    fn exchange(&self, request: Request) -> Responses;

    /// The transaction status reported by the last `ReadyForQuery`.
    fn transaction_status(&self) -> TransactionStatus;
}

/// Backend messages of one exchange, in the order the backend sent them.
///
/// The stream ends after the last message before `ReadyForQuery`. Dropping it discards the rest
/// of the exchange.
#[derive(Debug)]
pub struct Responses {
    recv: UnboundedReceiver<Result<BackendMessage>>,
}

pub(crate) type ResponseSender = UnboundedSender<Result<BackendMessage>>;

impl Responses {
    pub fn new(recv: UnboundedReceiver<Result<BackendMessage>>) -> Self {
        Self { recv }
    }

    pub(crate) fn channel() -> (ResponseSender, Self) {
        let (send, recv) = mpsc::unbounded_channel();
        (send, Self::new(recv))
    }

    /// Receive the next message.
    pub async fn next(&mut self) -> Option<Result<BackendMessage>> {
        self.recv.recv().await
    }
}

impl futures_core::Stream for Responses {
    type Item = Result<BackendMessage>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.recv.poll_recv(cx)
    }
}

/// The connection worker has shut down.
pub struct ConnectionClosed;

impl std::error::Error for ConnectionClosed { }

impl fmt::Display for ConnectionClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("connection closed")
    }
}

impl fmt::Debug for ConnectionClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

pub(crate) enum Command {
    Exchange {
        request: bytes::Bytes,
        reply: ResponseSender,
    },
    Close(oneshot::Sender<()>),
}

/// Connection state written by the worker.
pub(crate) struct Shared {
    status: AtomicU8,
    params: Mutex<HashMap<String, String>>,
    key_data: Mutex<Option<BackendKeyData>>,
    notices: broadcast::Sender<Diagnostic>,
    notifications: broadcast::Sender<NotificationResponse>,
}

impl Shared {
    fn new(startup: startup::StartupResponse) -> Self {
        let (notices, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (notifications, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            status: AtomicU8::new(startup.status.as_byte()),
            params: Mutex::new(startup.params),
            key_data: Mutex::new(startup.key_data),
            notices,
            notifications,
        }
    }

    pub(crate) fn status(&self) -> TransactionStatus {
        TransactionStatus::from_byte(self.status.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub(crate) fn set_status(&self, status: TransactionStatus) {
        self.status.store(status.as_byte(), Ordering::Release);
    }

    pub(crate) fn set_param(&self, name: &str, value: &str) {
        self.params
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_owned(), value.to_owned());
    }

    pub(crate) fn set_key_data(&self, key_data: BackendKeyData) {
        *self.key_data.lock().unwrap_or_else(PoisonError::into_inner) = Some(key_data);
    }

    pub(crate) fn notice(&self, diagnostic: Diagnostic) {
        // no subscriber is not an error
        let _ = self.notices.send(diagnostic);
    }

    pub(crate) fn notification(&self, notification: NotificationResponse) {
        let _ = self.notifications.send(notification);
    }

    fn key_data(&self) -> Option<BackendKeyData> {
        *self.key_data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Socket backed [`Client`].
///
/// The socket is owned by a background task spawned on the current tokio runtime. Requests are
/// pipelined: every exchange is written as soon as it is submitted, and replies are routed back
/// in the same order. Cloning a `PgClient` shares the same connection.
#[derive(Clone)]
pub struct PgClient {
    send: UnboundedSender<Command>,
    shared: Arc<Shared>,
}

impl PgClient {
    /// Connect and authenticate, then spawn the connection worker.
    pub async fn connect(config: &Config) -> Result<PgClient> {
        let mut stream = PgStream::connect(config).await?;
        let response = startup::startup(config, &mut stream).await?;
        Ok(Self::spawn(stream, response))
    }

    pub(crate) fn spawn(stream: PgStream, response: startup::StartupResponse) -> PgClient {
        let shared = Arc::new(Shared::new(response));
        let (send, recv) = mpsc::unbounded_channel();
        tokio::spawn(worker::WorkerFuture::new(stream, recv, shared.clone()));
        Self { send, shared }
    }

    /// Returns the last reported value of a run-time parameter, e.g. `server_version`.
    pub fn parameter_status(&self, name: &str) -> Option<String> {
        self.shared
            .params
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// The process ID of the backend.
    pub fn process_id(&self) -> Option<u32> {
        self.shared.key_data().map(|key| key.process_id)
    }

    /// The secret key used to cancel requests of this backend.
    pub fn secret_key(&self) -> Option<u32> {
        self.shared.key_data().map(|key| key.secret_key)
    }

    /// Subscribe to notices.
    ///
    /// Only notices received after subscribing are delivered.
    pub fn notices(&self) -> broadcast::Receiver<Diagnostic> {
        self.shared.notices.subscribe()
    }

    /// Subscribe to `NOTIFY` notifications of channels this connection `LISTEN` to.
    pub fn notifications(&self) -> broadcast::Receiver<NotificationResponse> {
        self.shared.notifications.subscribe()
    }

    /// Gracefully close the connection.
    ///
    /// Pending exchanges are completed first, then `Terminate` is sent and the socket is shut down.
    pub async fn close(&self) -> Result<()> {
        let (send, recv) = oneshot::channel();
        self.send.send(Command::Close(send)).map_err(|_| ConnectionClosed)?;
        recv.await.map_err(|_| ConnectionClosed)?;
        Ok(())
    }
}

impl Client for PgClient {
    fn exchange(&self, request: Request) -> Responses {
        let (reply, responses) = Responses::channel();
        let request = request.freeze();
        verbose!(len = request.len(), "Exchange");

        if let Err(SendError(Command::Exchange { reply, .. })) =
            self.send.send(Command::Exchange { request, reply })
        {
            let _ = reply.send(Err(ConnectionClosed.into()));
        }

        responses
    }

    fn transaction_status(&self) -> TransactionStatus {
        self.shared.status()
    }
}

impl fmt::Debug for PgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgClient")
            .field("status", &self.shared.status())
            .field("process_id", &self.process_id())
            .finish()
    }
}
