//! Registry of supervised clients keyed by [`ClientId`].
//!
//! The registry allocates identifiers, starts and stops each client's
//! reconnect loop, and owns the two queues every client feeds into.
//!
//! # Example
//!
//! ```no_run
//! use ws_client_pool::Registry;
//!
//! # async fn example() -> ws_client_pool::Result<()> {
//! let registry = Registry::new();
//! let id = registry.add_client("ws://127.0.0.1:9001")?;
//!
//! let events = registry.events();
//! while let Some(event) = events.recv().await {
//!     println!("client {} -> {}", event.client_id, event.kind);
//! }
//!
//! registry.remove_client(id).await?;
//! registry.shutdown().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::client::{Client, ClientOptions, RetryLimit};
use crate::error::{Error, Result};
use crate::identifiers::{ClientId, Target};
use crate::protocol::{Event, Message};
use crate::queue::{self, Inbox};
use crate::transport::{Dialer, TungsteniteDialer};

use super::builder::{DEFAULT_QUEUE_CAPACITY, RegistryBuilder};

// ============================================================================
// Entry
// ============================================================================

/// A registered client and the task running its loop.
struct Entry {
    client: Client,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Entry {
    fn abort_task(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Supervises many clients and fans their output into two shared queues.
///
/// Thread-safe; every operation may be called concurrently. Structural
/// changes (add, remove, shutdown) take the map's write lock, queries take
/// the read lock. Operations that start a loop fail with [`Error::Config`]
/// outside a tokio runtime.
pub struct Registry {
    /// Registered clients by identifier.
    clients: RwLock<FxHashMap<ClientId, Entry>>,

    /// Producer side of the shared queues, dropped on shutdown.
    message_tx: RwLock<Option<mpsc::Sender<Message>>>,
    event_tx: RwLock<Option<mpsc::Sender<Event>>>,

    /// Consumer side of the shared queues.
    messages: Inbox<Message>,
    events: Inbox<Event>,

    /// Retry policy given to new clients.
    options: ClientOptions,

    /// Transport used by every client.
    dialer: Arc<dyn Dialer>,

    /// Shutdown flag.
    shutdown: AtomicBool,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("client_count", &self.client_count())
            .field("online_count", &self.online_count())
            .field("shutdown", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Registry - Constructors
// ============================================================================

impl Registry {
    /// Creates a registry with the default configuration.
    ///
    /// Queues hold 10240 items each; clients retry 3 times, 3 seconds apart.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(
            DEFAULT_QUEUE_CAPACITY,
            ClientOptions::default(),
            Arc::new(TungsteniteDialer::new()),
        )
    }

    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub(crate) fn from_parts(
        capacity: NonZeroUsize,
        options: ClientOptions,
        dialer: Arc<dyn Dialer>,
    ) -> Self {
        let (message_tx, messages) = queue::bounded(capacity);
        let (event_tx, events) = queue::bounded(capacity);

        debug!(capacity = capacity.get(), ?options, "Registry created");

        Self {
            clients: RwLock::new(FxHashMap::default()),
            message_tx: RwLock::new(Some(message_tx)),
            event_tx: RwLock::new(Some(event_tx)),
            messages,
            events,
            options,
            dialer,
            shutdown: AtomicBool::new(false),
        }
    }
}

// ============================================================================
// Registry - Queues
// ============================================================================

impl Registry {
    /// Returns a handle to the shared message queue.
    #[inline]
    #[must_use]
    pub fn messages(&self) -> Inbox<Message> {
        self.messages.clone()
    }

    /// Returns a handle to the shared event queue.
    #[inline]
    #[must_use]
    pub fn events(&self) -> Inbox<Event> {
        self.events.clone()
    }
}

// ============================================================================
// Registry - Lifecycle
// ============================================================================

impl Registry {
    /// Registers a client for `url` and starts its reconnect loop.
    ///
    /// The new client gets the lowest identifier not in use.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if `url` is not a `ws://` or `wss://` URL
    /// - [`Error::AlreadyExists`] if a registered client uses `url`
    /// - [`Error::Shutdown`] after [`Registry::shutdown`]
    /// - [`Error::Config`] if called outside a tokio runtime
    pub fn add_client(&self, url: impl Into<String>) -> Result<ClientId> {
        let url = url.into();
        validate_url(&url)?;
        ensure_runtime()?;

        let mut clients = self.clients.write();

        if self.is_shut_down() {
            return Err(Error::Shutdown);
        }
        if clients.values().any(|entry| entry.client.url() == url) {
            return Err(Error::already_exists(url));
        }

        let id = lowest_free_id(&clients)
            .ok_or_else(|| Error::config("No free client identifier"))?;

        let (Some(message_tx), Some(event_tx)) =
            (self.message_tx.read().clone(), self.event_tx.read().clone())
        else {
            return Err(Error::Shutdown);
        };

        let client = Client::new(id, url, self.options, Arc::clone(&self.dialer));
        client.set_message_queue(message_tx);
        client.set_event_queue(event_tx);
        let task = client.spawn();

        info!(client_id = %id, url = %client.url(), "Client added");

        clients.insert(
            id,
            Entry {
                client,
                task: Mutex::new(task),
            },
        );

        Ok(id)
    }

    /// Removes a client, closing its transport first.
    ///
    /// The entry is removed even if closing fails. No message or event for
    /// this client is delivered once this returns.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no client has this identifier
    /// - [`Error::Close`] if the transport close failed
    pub async fn remove_client(&self, id: ClientId) -> Result<()> {
        let entry = self
            .clients
            .write()
            .remove(&id)
            .ok_or_else(|| Error::not_found(id))?;

        let result = entry.client.close().await;
        entry.abort_task();

        match &result {
            Ok(()) => info!(client_id = %id, "Client removed"),
            Err(e) => warn!(client_id = %id, error = %e, "Client removed, close failed"),
        }

        result
    }

    /// Voluntarily disconnects a client.
    ///
    /// Its loop stops and emits a voluntary disconnect event. The client
    /// stays registered and can be started again with
    /// [`Registry::connect_client`].
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no client has this identifier
    /// - [`Error::NotConnected`] if the client is not connected
    /// - [`Error::Close`] if the transport close failed
    pub async fn disconnect_client(&self, id: ClientId) -> Result<()> {
        let client = self.client(id).ok_or_else(|| Error::not_found(id))?;

        if !client.is_connected() {
            return Err(Error::not_connected(id));
        }

        client.disconnect().await
    }

    /// Starts a client's reconnect loop again.
    ///
    /// A no-op if the loop is already running but not connected.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no client has this identifier
    /// - [`Error::AlreadyConnected`] if the client is connected
    /// - [`Error::Config`] if called outside a tokio runtime
    pub fn connect_client(&self, id: ClientId) -> Result<()> {
        ensure_runtime()?;
        let clients = self.clients.read();
        let entry = clients.get(&id).ok_or_else(|| Error::not_found(id))?;

        if entry.client.is_connected() {
            return Err(Error::already_connected(id));
        }

        if let Some(task) = entry.client.spawn() {
            debug!(client_id = %id, "Reconnect loop restarted");
            *entry.task.lock() = Some(task);
        }

        Ok(())
    }

    /// Closes every client, clears the map and closes both queues.
    ///
    /// Items already queued can still be drained; later
    /// [`Registry::add_client`] calls fail with [`Error::Shutdown`].
    pub async fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Registry shutting down");

        let entries: Vec<_> = {
            let mut clients = self.clients.write();
            clients.drain().collect()
        };

        for (id, entry) in entries {
            if let Err(e) = entry.client.close().await {
                warn!(client_id = %id, error = %e, "Close failed during shutdown");
            }
            entry.abort_task();
            entry.client.detach_queues();
            debug!(client_id = %id, "Client closed during shutdown");
        }

        self.message_tx.write().take();
        self.event_tx.write().take();
        self.messages.close();
        self.events.close();

        info!("Registry shutdown complete");
    }

    /// Returns `true` after [`Registry::shutdown`].
    #[inline]
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Registry - Settings
// ============================================================================

impl Registry {
    /// Sets the retry limit of one client or of every current client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if a single target does not exist.
    pub fn set_max_retry(
        &self,
        target: impl Into<Target>,
        max_retry: impl Into<RetryLimit>,
    ) -> Result<()> {
        let max_retry = max_retry.into();
        for client in self.resolve(target.into())? {
            client.set_max_retry(max_retry);
        }
        Ok(())
    }

    /// Sets the retry interval of one client or of every current client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if a single target does not exist.
    pub fn set_retry_interval(
        &self,
        target: impl Into<Target>,
        retry_interval: Duration,
    ) -> Result<()> {
        for client in self.resolve(target.into())? {
            client.set_retry_interval(retry_interval);
        }
        Ok(())
    }

    /// Snapshots the clients a target selects.
    fn resolve(&self, target: Target) -> Result<Vec<Client>> {
        let clients = self.clients.read();
        match target {
            Target::All => Ok(clients.values().map(|entry| entry.client.clone()).collect()),
            Target::Client(id) => clients
                .get(&id)
                .map(|entry| vec![entry.client.clone()])
                .ok_or_else(|| Error::not_found(id)),
        }
    }
}

// ============================================================================
// Registry - Queries
// ============================================================================

impl Registry {
    /// Returns a handle to a registered client.
    #[must_use]
    pub fn client(&self, id: ClientId) -> Option<Client> {
        self.clients.read().get(&id).map(|entry| entry.client.clone())
    }

    /// Returns `true` if a client has this identifier.
    #[inline]
    #[must_use]
    pub fn contains_client(&self, id: ClientId) -> bool {
        self.clients.read().contains_key(&id)
    }

    /// Returns `true` if a client uses this address.
    #[must_use]
    pub fn contains_url(&self, url: &str) -> bool {
        self.client_id_by_url(url).is_some()
    }

    /// Returns the identifier of the client using this address.
    #[must_use]
    pub fn client_id_by_url(&self, url: &str) -> Option<ClientId> {
        self.clients
            .read()
            .iter()
            .find(|(_, entry)| entry.client.url() == url)
            .map(|(id, _)| *id)
    }

    /// Returns the address of a client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no client has this identifier.
    pub fn client_url(&self, id: ClientId) -> Result<String> {
        self.clients
            .read()
            .get(&id)
            .map(|entry| entry.client.url().to_string())
            .ok_or_else(|| Error::not_found(id))
    }

    /// Returns whether a client is connected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no client has this identifier.
    pub fn is_connected(&self, id: ClientId) -> Result<bool> {
        self.clients
            .read()
            .get(&id)
            .map(|entry| entry.client.is_connected())
            .ok_or_else(|| Error::not_found(id))
    }

    /// Returns the number of registered clients.
    #[inline]
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Returns the number of connected clients.
    #[must_use]
    pub fn online_count(&self) -> usize {
        self.count_where(|client| client.is_connected())
    }

    /// Returns the number of clients not connected.
    #[must_use]
    pub fn offline_count(&self) -> usize {
        self.count_where(|client| !client.is_connected())
    }

    /// Returns every identifier, ascending.
    #[must_use]
    pub fn client_ids(&self) -> Vec<ClientId> {
        self.ids_where(|_| true)
    }

    /// Returns identifiers of connected clients, ascending.
    #[must_use]
    pub fn online_client_ids(&self) -> Vec<ClientId> {
        self.ids_where(Client::is_connected)
    }

    /// Returns identifiers of clients not connected, ascending.
    #[must_use]
    pub fn offline_client_ids(&self) -> Vec<ClientId> {
        self.ids_where(|client| !client.is_connected())
    }

    fn count_where(&self, predicate: impl Fn(&Client) -> bool) -> usize {
        self.clients
            .read()
            .values()
            .filter(|entry| predicate(&entry.client))
            .count()
    }

    fn ids_where(&self, predicate: impl Fn(&Client) -> bool) -> Vec<ClientId> {
        let mut ids: Vec<_> = self
            .clients
            .read()
            .iter()
            .filter(|(_, entry)| predicate(&entry.client))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns the lowest identifier not used as a key, scanning up from 0.
fn lowest_free_id<V>(used: &FxHashMap<ClientId, V>) -> Option<ClientId> {
    let mut candidate = ClientId::FIRST;
    while used.contains_key(&candidate) {
        candidate = candidate.next()?;
    }
    Some(candidate)
}

/// Reconnect loops are spawned onto the current tokio runtime.
fn ensure_runtime() -> Result<()> {
    Handle::try_current()
        .map(|_| ())
        .map_err(|e| Error::config(format!("No tokio runtime to run the client on: {e}")))
}

/// Accepts only `ws://` and `wss://` URLs.
fn validate_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|e| Error::invalid_url(url, e.to_string()))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(Error::invalid_url(
            url,
            format!("unsupported scheme {other:?}, expected ws or wss"),
        )),
    }
}

// ============================================================================
// Tests
// ============================================================================
