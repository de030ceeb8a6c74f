//! Reconnect-and-receive loop of a single client.
//!
//! The loop dials, emits [`EventKind::Connected`], forwards every data frame
//! as a [`Message`] until the session ends, then backs off and dials again.
//! It stops when a voluntary disconnect is observed or when consecutive dial
//! failures exceed the retry limit.
//!
//! # Control
//!
//! [`Client::disconnect`] and [`Client::close`] reach the running loop
//! through a command channel. The loop races every blocking step (dial,
//! read, backoff sleep) against that channel, so a disconnect interrupts
//! whichever step is in progress and the caller receives the transport close
//! result.
//!
//! # Delivery
//!
//! Items go to bounded queues set by the owner. A full queue blocks the loop
//! (backpressure) until space frees up or a stop is requested, in which case
//! the item is dropped. A missing or closed queue drops the item with a warning.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{Notify, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::ClientId;
use crate::protocol::{Event, EventKind, Frame, Message};
use crate::queue::{self, Inbox};
use crate::transport::{Dialer, Transport, TungsteniteDialer};

use super::options::{ClientOptions, RetryLimit};

// ============================================================================
// ConnectionState
// ============================================================================

/// Connection state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Not connected; either never started or backing off.
    #[default]
    Disconnected,
    /// Dial in progress.
    Connecting,
    /// Transport held and usable.
    Connected,
    /// Loop stopped.
    Terminated,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SupervisorCommand
// ============================================================================

/// Commands for the running loop.
enum SupervisorCommand {
    /// Close the transport and stop.
    Close { reply: oneshot::Sender<Result<()>> },
}

impl SupervisorCommand {
    fn acknowledge(self, inner: &ClientInner, result: Result<()>) {
        inner.stops_handled.fetch_add(1, Ordering::SeqCst);
        match self {
            Self::Close { reply } => {
                let _ = reply.send(result);
            }
        }
    }
}

/// Loop ownership, guarded so that at most one loop runs per client.
struct LoopSlot {
    running: bool,
    commands: Option<mpsc::UnboundedReceiver<SupervisorCommand>>,
}

/// Why the loop stopped.
enum Exit {
    Voluntary,
    Exhausted,
}

/// Why a connected session ended.
enum SessionEnd {
    /// Stop requested through the command channel; transport closed.
    Stopped,
    /// Read failed or the peer closed.
    Lost(Error),
}

// ============================================================================
// Client
// ============================================================================

struct ClientInner {
    id: ClientId,
    url: String,
    dialer: Arc<dyn Dialer>,
    options: RwLock<ClientOptions>,
    state: RwLock<ConnectionState>,
    /// Set by `disconnect` and `close`, cleared when a loop starts.
    voluntary: AtomicBool,
    /// Set by `close`; nothing is delivered afterwards.
    retired: AtomicBool,
    /// Serializes the retired check of a delivery with `close`.
    delivery_gate: Mutex<()>,
    /// Stop commands sent and answered. A delivery waiting for queue space
    /// is abandoned while the two differ.
    stops_requested: AtomicU64,
    stops_handled: AtomicU64,
    /// Wakes deliveries waiting for queue space when a stop is sent.
    stop_signal: Notify,
    message_tx: RwLock<Option<mpsc::Sender<Message>>>,
    event_tx: RwLock<Option<mpsc::Sender<Event>>>,
    command_tx: mpsc::UnboundedSender<SupervisorCommand>,
    slot: Mutex<LoopSlot>,
}

impl ClientInner {
    /// Returns `true` while a stop command is waiting for the loop.
    fn stop_pending(&self) -> bool {
        self.stops_requested.load(Ordering::SeqCst) != self.stops_handled.load(Ordering::SeqCst)
    }
}

/// One resilient connection to one endpoint.
///
/// Cheap to clone; clones share the same connection. Accessors may be called
/// concurrently with the loop and return a best-effort snapshot.
///
/// # Example
///
/// ```ignore
/// let (client, messages, events) = Client::with_own_queues("ws://127.0.0.1:9001", 1024)?;
/// let task = client.spawn();
///
/// while let Some(event) = events.recv().await {
///     println!("{} -> {}", event.client_id, event.kind);
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.inner.id)
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Constructors
// ============================================================================

impl Client {
    /// Creates a disconnected client with no queues attached.
    #[must_use]
    pub fn new(
        id: ClientId,
        url: impl Into<String>,
        options: ClientOptions,
        dialer: Arc<dyn Dialer>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(ClientInner {
                id,
                url: url.into(),
                dialer,
                options: RwLock::new(options),
                state: RwLock::new(ConnectionState::Disconnected),
                voluntary: AtomicBool::new(false),
                retired: AtomicBool::new(false),
                delivery_gate: Mutex::new(()),
                stops_requested: AtomicU64::new(0),
                stops_handled: AtomicU64::new(0),
                stop_signal: Notify::new(),
                message_tx: RwLock::new(None),
                event_tx: RwLock::new(None),
                command_tx,
                slot: Mutex::new(LoopSlot {
                    running: false,
                    commands: Some(command_rx),
                }),
            }),
        }
    }

    /// Creates an unregistered client with its own bounded queues.
    ///
    /// Uses the default options and the tokio-tungstenite dialer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `capacity` is zero.
    pub fn with_own_queues(
        url: impl Into<String>,
        capacity: usize,
    ) -> Result<(Self, Inbox<Message>, Inbox<Event>)> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| Error::config("Queue capacity must be greater than zero"))?;
        let (message_tx, messages) = queue::bounded(capacity);
        let (event_tx, events) = queue::bounded(capacity);

        let client = Self::new(
            ClientId::FIRST,
            url,
            ClientOptions::default(),
            Arc::new(TungsteniteDialer::new()),
        );
        client.set_message_queue(message_tx);
        client.set_event_queue(event_tx);

        Ok((client, messages, events))
    }
}

// ============================================================================
// Client - Accessors
// ============================================================================

impl Client {
    /// Returns the identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ClientId {
        self.inner.id
    }

    /// Returns the endpoint address.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.read()
    }

    /// Returns `true` while a transport is held.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Returns `true` while a reconnect loop is running.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.slot.lock().running
    }

    /// Returns `true` once a voluntary disconnect has been requested.
    #[inline]
    #[must_use]
    pub fn is_disconnect_requested(&self) -> bool {
        self.inner.voluntary.load(Ordering::SeqCst)
    }

    /// Returns a copy of the retry options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> ClientOptions {
        *self.inner.options.read()
    }

    /// Sets the retry limit. Takes effect on the next failed dial.
    pub fn set_max_retry(&self, max_retry: RetryLimit) {
        self.inner.options.write().max_retry = max_retry;
    }

    /// Sets the delay between attempts. Takes effect on the next backoff.
    pub fn set_retry_interval(&self, retry_interval: Duration) {
        self.inner.options.write().retry_interval = retry_interval;
    }

    /// Attaches the queue inbound messages are delivered to.
    pub fn set_message_queue(&self, sender: mpsc::Sender<Message>) {
        *self.inner.message_tx.write() = Some(sender);
    }

    /// Attaches the queue lifecycle events are delivered to.
    pub fn set_event_queue(&self, sender: mpsc::Sender<Event>) {
        *self.inner.event_tx.write() = Some(sender);
    }

    /// Drops both queue senders so the queues can close.
    pub(crate) fn detach_queues(&self) {
        self.inner.message_tx.write().take();
        self.inner.event_tx.write().take();
    }
}

// ============================================================================
// Client - Control
// ============================================================================

impl Client {
    /// Runs the reconnect loop until it stops.
    ///
    /// Returns immediately, with a warning, if the client is connected, its
    /// loop is already running, or it has been closed. Usually run in the
    /// background via [`Client::spawn`].
    pub async fn connect(&self) {
        if let Some(commands) = self.begin() {
            self.run(commands).await;
        }
    }

    /// Starts the reconnect loop as a background task.
    ///
    /// Returns `None` under the same conditions [`Client::connect`] refuses.
    /// The voluntary-disconnect flag is cleared before this returns, so a
    /// `disconnect` issued right after is never lost.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(&self) -> Option<JoinHandle<()>> {
        let commands = self.begin()?;
        let client = self.clone();
        Some(tokio::spawn(async move { client.run(commands).await }))
    }

    /// Requests a voluntary disconnect.
    ///
    /// Closes the live transport if there is one and stops the loop, which
    /// then emits [`EventKind::Disconnected`].
    ///
    /// # Errors
    ///
    /// Returns the transport close error, if any.
    pub async fn disconnect(&self) -> Result<()> {
        self.inner.voluntary.store(true, Ordering::SeqCst);
        debug!(client_id = %self.inner.id, "Disconnect requested");
        self.request_stop().await
    }

    /// Closes the client for good.
    ///
    /// Marks it not connected, closes the transport and stops the loop.
    /// Nothing is delivered for this client once this returns, and it
    /// cannot be connected again.
    ///
    /// # Errors
    ///
    /// Returns the transport close error, if any.
    pub async fn close(&self) -> Result<()> {
        {
            let _slot = self.inner.slot.lock();
            let _gate = self.inner.delivery_gate.lock();
            self.inner.retired.store(true, Ordering::SeqCst);
            self.inner.voluntary.store(true, Ordering::SeqCst);
        }
        self.set_state(ConnectionState::Disconnected);
        debug!(client_id = %self.inner.id, "Client closed");
        self.request_stop().await
    }

    /// Claims the loop slot.
    fn begin(&self) -> Option<mpsc::UnboundedReceiver<SupervisorCommand>> {
        let id = self.inner.id;
        let mut slot = self.inner.slot.lock();

        if self.inner.retired.load(Ordering::SeqCst) {
            warn!(client_id = %id, "Client is closed, connect ignored");
            return None;
        }
        if self.is_connected() {
            warn!(client_id = %id, error = %Error::already_connected(id), "Connect ignored");
            return None;
        }
        if slot.running {
            warn!(client_id = %id, "Reconnect loop already running, connect ignored");
            return None;
        }
        let commands = slot.commands.take()?;
        slot.running = true;
        self.inner.voluntary.store(false, Ordering::SeqCst);

        Some(commands)
    }

    /// Sends a stop command to the running loop and waits for its reply.
    async fn request_stop(&self) -> Result<()> {
        let reply_rx = {
            let slot = self.inner.slot.lock();
            if !slot.running {
                return Ok(());
            }
            let (reply, reply_rx) = oneshot::channel();
            self.inner.stops_requested.fetch_add(1, Ordering::SeqCst);
            if self
                .inner
                .command_tx
                .send(SupervisorCommand::Close { reply })
                .is_err()
            {
                self.inner.stops_requested.fetch_sub(1, Ordering::SeqCst);
                return Ok(());
            }
            reply_rx
        };
        self.inner.stop_signal.notify_waiters();

        // Loop dropped without replying: nothing left to close.
        reply_rx.await.unwrap_or(Ok(()))
    }

    fn set_state(&self, state: ConnectionState) {
        *self.inner.state.write() = state;
    }

    fn stop_requested(&self) -> bool {
        self.inner.voluntary.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Client - Reconnect Loop
// ============================================================================

/// Returns the loop slot when the loop ends or its task is aborted.
struct SlotGuard<'a> {
    inner: &'a ClientInner,
    commands: Option<mpsc::UnboundedReceiver<SupervisorCommand>>,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.inner.slot.lock();
        if let Some(mut commands) = self.commands.take() {
            // Commands sent while running must still be answered.
            while let Ok(command) = commands.try_recv() {
                command.acknowledge(&self.inner, Ok(()));
            }
            slot.commands = Some(commands);
        }
        slot.running = false;
    }
}

impl Client {
    async fn run(&self, commands: mpsc::UnboundedReceiver<SupervisorCommand>) {
        let mut guard = SlotGuard {
            inner: &self.inner,
            commands: Some(commands),
        };
        let Some(commands) = guard.commands.as_mut() else {
            return;
        };

        info!(client_id = %self.inner.id, url = %self.inner.url, "Reconnect loop started");

        let exit = self.reconnect(commands).await;
        self.set_state(ConnectionState::Terminated);

        match exit {
            Exit::Voluntary => {
                info!(client_id = %self.inner.id, "Disconnected");
                self.emit(EventKind::Disconnected).await;
            }
            Exit::Exhausted => {
                info!(client_id = %self.inner.id, "Reconnect loop gave up");
            }
        }

        drop(guard);
    }

    async fn reconnect(
        &self,
        commands: &mut mpsc::UnboundedReceiver<SupervisorCommand>,
    ) -> Exit {
        let id = self.inner.id;
        let mut failures: u32 = 0;

        loop {
            if self.stop_requested() {
                return Exit::Voluntary;
            }

            self.set_state(ConnectionState::Connecting);
            debug!(client_id = %id, url = %self.inner.url, attempt = failures + 1, "Dialing");

            // A finished dial is taken first so its transport gets closed.
            let dialed = tokio::select! {
                biased;
                result = self.inner.dialer.dial(&self.inner.url) => Some(result),
                command = commands.recv() => {
                    if let Some(command) = command {
                        command.acknowledge(&self.inner, Ok(()));
                    }
                    None
                }
            };
            let Some(dialed) = dialed else {
                self.set_state(ConnectionState::Disconnected);
                return Exit::Voluntary;
            };

            let mut transport = match dialed {
                Ok(transport) => transport,
                Err(e) => {
                    self.set_state(ConnectionState::Disconnected);
                    warn!(client_id = %id, error = %e, "Dial failed");
                    self.emit(EventKind::ConnectFailed).await;

                    let options = self.options();
                    failures = failures.saturating_add(1);
                    if options.max_retry.is_exceeded(failures) {
                        info!(client_id = %id, failures, "Retries exhausted");
                        self.emit(EventKind::RetriesExhausted).await;
                        return Exit::Exhausted;
                    }

                    if !self.backoff(commands, options.retry_interval).await {
                        return Exit::Voluntary;
                    }
                    continue;
                }
            };

            failures = 0;

            if self.stop_requested() {
                self.close_for_stop(transport.as_mut(), commands).await;
                self.set_state(ConnectionState::Disconnected);
                return Exit::Voluntary;
            }

            self.set_state(ConnectionState::Connected);
            info!(client_id = %id, url = %self.inner.url, "Connected");
            self.emit(EventKind::Connected).await;

            let end = self.receive(transport.as_mut(), commands).await;
            self.set_state(ConnectionState::Disconnected);

            match end {
                SessionEnd::Stopped => return Exit::Voluntary,
                SessionEnd::Lost(e) => {
                    // A concurrent disconnect wins over the read failure.
                    if self.stop_requested() {
                        debug!(client_id = %id, error = %e, "Read failed during disconnect");
                        self.close_for_stop(transport.as_mut(), commands).await;
                        return Exit::Voluntary;
                    }
                    if let Err(close_err) = transport.close().await {
                        debug!(client_id = %id, error = %close_err, "Close after lost session failed");
                    }
                    warn!(client_id = %id, error = %e, "Connection lost");
                    self.emit(EventKind::ConnectionLost).await;
                }
            }

            if !self.backoff(commands, self.options().retry_interval).await {
                return Exit::Voluntary;
            }
        }
    }

    /// Forwards frames until the session ends.
    async fn receive(
        &self,
        transport: &mut dyn Transport,
        commands: &mut mpsc::UnboundedReceiver<SupervisorCommand>,
    ) -> SessionEnd {
        loop {
            let step = tokio::select! {
                frame = transport.read_frame() => Ok(frame),
                command = commands.recv() => Err(command),
            };

            match step {
                Ok(Ok(frame)) => self.deliver_frame(frame).await,
                Ok(Err(e)) => return SessionEnd::Lost(e),
                Err(command) => {
                    let result = transport.close().await;
                    if let Err(e) = &result {
                        warn!(client_id = %self.inner.id, error = %e, "Transport close failed");
                    }
                    if let Some(command) = command {
                        command.acknowledge(&self.inner, result);
                    }
                    return SessionEnd::Stopped;
                }
            }
        }
    }

    /// Closes the transport for a stop seen outside the command branch and
    /// answers the stop command, if it has arrived, with the close result.
    async fn close_for_stop(
        &self,
        transport: &mut dyn Transport,
        commands: &mut mpsc::UnboundedReceiver<SupervisorCommand>,
    ) {
        let result = transport.close().await;
        if let Err(e) = &result {
            warn!(client_id = %self.inner.id, error = %e, "Transport close failed");
        }
        if let Ok(command) = commands.try_recv() {
            command.acknowledge(&self.inner, result);
        }
    }

    /// Sleeps for `interval`. Returns `false` if a stop arrived meanwhile.
    async fn backoff(
        &self,
        commands: &mut mpsc::UnboundedReceiver<SupervisorCommand>,
        interval: Duration,
    ) -> bool {
        debug!(
            client_id = %self.inner.id,
            interval_ms = interval.as_millis() as u64,
            "Backing off"
        );

        let command = tokio::select! {
            () = sleep(interval) => None,
            command = commands.recv() => command,
        };

        if let Some(command) = command {
            command.acknowledge(&self.inner, Ok(()));
            return false;
        }
        !self.stop_requested()
    }
}

// ============================================================================
// Client - Delivery
// ============================================================================

impl Client {
    async fn emit(&self, kind: EventKind) {
        let sender = self.inner.event_tx.read().clone();
        let event = Event::new(self.inner.id, kind);
        deliver(&self.inner, sender, event, "event").await;
    }

    async fn deliver_frame(&self, frame: Frame) {
        trace!(client_id = %self.inner.id, kind = ?frame.kind, len = frame.data.len(), "Frame received");
        let sender = self.inner.message_tx.read().clone();
        let message = Message::new(self.inner.id, frame);
        deliver(&self.inner, sender, message, "message").await;
    }
}

/// Sends `item`, waiting for queue space unless a stop is requested.
async fn deliver<T>(
    inner: &ClientInner,
    sender: Option<mpsc::Sender<T>>,
    item: T,
    queue: &'static str,
) {
    let Some(sender) = sender else {
        warn!(client_id = %inner.id, queue, "Queue not set, item dropped");
        return;
    };
    let reserved = loop {
        let stopping = inner.stop_signal.notified();
        let pending = inner.stop_pending();
        tokio::select! {
            biased;
            reserved = sender.reserve() => break reserved,
            () = future::ready(()), if pending => {
                debug!(client_id = %inner.id, queue, "Queue full with stop pending, item dropped");
                return;
            }
            () = stopping => {}
        }
    };
    let Ok(permit) = reserved else {
        warn!(client_id = %inner.id, queue, "Queue closed, item dropped");
        return;
    };

    let _gate = inner.delivery_gate.lock();
    if inner.retired.load(Ordering::SeqCst) {
        trace!(client_id = %inner.id, queue, "Client closed, item dropped");
        return;
    }
    permit.send(item);
}

// ============================================================================
// Tests
// ============================================================================
