//! Supervised chat connection.
//!
//! [`ChatConnection`] owns one logical session to the chat server. It opens
//! the transport, pumps outbound frames, hands inbound text to the
//! [`EventRouter`] and re-opens after transport failures according to its
//! [`ReconnectPolicy`].
//!
//! Every connection attempt gets a new generation number. Events reported by
//! a task whose generation is no longer current (the session was re-inited,
//! disconnected or already failed over) are ignored.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{
    domain::{ChatEvent, ChatMessage, ServerUrl, UserId},
    error::ClientError,
    infrastructure::{
        codec,
        transport::{Connector, Frame, NORMAL_CLOSURE, TransportPair, TungsteniteConnector},
    },
    listener::{CallbackExecutor, EventRouter, Listeners},
};

use super::{policy::ReconnectPolicy, state::ConnectionState};

/// A supervised real-time connection to the chat server.
///
/// Not `Clone`: share it behind an `Arc`. Dropping it disconnects.
#[derive(Debug)]
pub struct ChatConnection {
    inner: Arc<Inner>,
}

struct Inner {
    connector: Arc<dyn Connector>,
    router: EventRouter,
    policy: ReconnectPolicy,
    runtime: Handle,
    session: Mutex<Session>,
    state: watch::Sender<ConnectionState>,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("policy", &self.policy)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct Session {
    generation: u64,
    target: Option<Target>,
    link: Option<ConnectionHandle>,
    reconnect: Option<JoinHandle<()>>,
    failures: u32,
}

#[derive(Debug, Clone)]
struct Target {
    server_url: ServerUrl,
    user_id: UserId,
}

#[derive(Debug)]
struct ConnectionHandle {
    generation: u64,
    outbound: mpsc::UnboundedSender<Outbound>,
}

#[derive(Debug)]
enum Outbound {
    Text(String),
    Close { code: u16, reason: String },
}

impl ChatConnection {
    /// Create an idle connection that will open transports through `connector`.
    ///
    /// Must be called from within a Tokio runtime; connection tasks are
    /// spawned on it.
    pub fn new(
        connector: Arc<dyn Connector>,
        policy: ReconnectPolicy,
    ) -> Result<Self, ClientError> {
        let runtime = Handle::try_current().map_err(|_| ClientError::NoRuntime)?;
        let executor = CallbackExecutor::spawn().map_err(ClientError::Executor)?;
        let router = EventRouter::new(Arc::new(Listeners::new()), executor);
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Ok(Self {
            inner: Arc::new(Inner {
                connector,
                router,
                policy,
                runtime,
                session: Mutex::new(Session::default()),
                state,
            }),
        })
    }

    /// Create an idle connection over real WebSockets.
    pub fn websocket(policy: ReconnectPolicy) -> Result<Self, ClientError> {
        Self::new(Arc::new(TungsteniteConnector::new()), policy)
    }

    /// Listener registries for every event kind.
    pub fn listeners(&self) -> &Arc<Listeners> {
        self.inner.router.listeners()
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.inner.policy
    }

    /// Open a connection to `server_url` as `user_id`.
    ///
    /// Any previous connection is closed with code 1000 and any pending
    /// reconnect is cancelled first. Returns immediately; the outcome is
    /// visible through [`ChatConnection::watch_state`] and the error listeners.
    pub fn init(&self, server_url: ServerUrl, user_id: UserId) {
        let mut session = self.inner.session();
        if let Some(timer) = session.reconnect.take() {
            timer.abort();
        }
        if let Some(previous) = session.link.take() {
            tracing::info!("Replacing connection (generation {})", previous.generation);
            previous.close("replaced by a new session");
        }

        tracing::info!("Connecting to {} as user {}", server_url, user_id);
        session.failures = 0;
        session.target = Some(Target {
            server_url,
            user_id,
        });
        self.inner.open(&mut session);
    }

    /// Encode `message` and queue it on the live connection.
    ///
    /// Without a connection the message is dropped with a warning. While
    /// connecting, it is written once the handshake completes.
    pub fn send(&self, message: &ChatMessage) {
        let text = match codec::encode(message) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Failed to encode outgoing message: {}", e);
                return;
            }
        };

        let session = self.inner.session();
        match &session.link {
            Some(link) => {
                if link.outbound.send(Outbound::Text(text)).is_err() {
                    tracing::warn!("Connection task is gone; dropping outgoing message");
                }
            }
            None => tracing::warn!("Not connected; dropping outgoing message"),
        }
    }

    /// Close the connection with code 1000 and cancel any pending reconnect.
    ///
    /// Idempotent.
    pub fn disconnect(&self) {
        let mut session = self.inner.session();
        if let Some(timer) = session.reconnect.take() {
            timer.abort();
            tracing::debug!("Cancelled pending reconnect");
        }
        session.generation += 1;
        session.failures = 0;
        session.target = None;
        if let Some(link) = session.link.take() {
            tracing::info!("Disconnecting (generation {})", link.generation);
            link.close("client disconnect");
        }
        self.inner.set_state(ConnectionState::Disconnected);
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Wait until every event received so far has been delivered to listeners.
    pub async fn flush_callbacks(&self) {
        self.inner.router.flush().await;
    }
}

impl Drop for ChatConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl ConnectionHandle {
    fn close(&self, reason: &str) {
        let _ = self.outbound.send(Outbound::Close {
            code: NORMAL_CLOSURE,
            reason: reason.to_string(),
        });
    }
}

impl Inner {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!("Connection state {} -> {}", previous, next);
        }
    }

    /// Start a new connection attempt for the current target.
    fn open(self: &Arc<Self>, session: &mut Session) {
        let Some(target) = session.target.clone() else {
            return;
        };
        session.generation += 1;
        let generation = session.generation;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        session.link = Some(ConnectionHandle {
            generation,
            outbound: outbound_tx,
        });
        self.set_state(ConnectionState::Connecting);

        let url = target.server_url.connect_url(target.user_id);
        let connector = Arc::clone(&self.connector);
        let weak = Arc::downgrade(self);
        self.runtime.spawn(run_connection(
            weak,
            connector,
            url,
            generation,
            outbound_rx,
        ));
    }

    fn is_current(&self, session: &Session, generation: u64) -> bool {
        session.generation == generation
            && session
                .link
                .as_ref()
                .is_some_and(|link| link.generation == generation)
    }

    /// Handshake finished. Returns whether the connection is still wanted.
    fn on_open(&self, generation: u64) -> bool {
        let mut session = self.session();
        if !self.is_current(&session, generation) {
            tracing::debug!("Connection {} opened after being superseded", generation);
            return false;
        }
        session.failures = 0;
        self.set_state(ConnectionState::Connected);
        tracing::info!("Connected (generation {})", generation);
        true
    }

    fn on_text(&self, generation: u64, text: &str) {
        let current = self.is_current(&self.session(), generation);
        if current {
            self.router.route_text(text);
        } else {
            tracing::debug!("Dropping frame from superseded connection {}", generation);
        }
    }

    fn on_peer_close(&self, generation: u64, code: u16, reason: &str) {
        let mut session = self.session();
        if !self.is_current(&session, generation) {
            return;
        }
        session.link = None;
        self.set_state(ConnectionState::Disconnected);
        tracing::info!("Server closed the connection (code {}, reason '{}')", code, reason);
    }

    /// Transport failure: notify error listeners and arm the reconnect timer.
    fn on_failure(self: &Arc<Self>, generation: u64, reason: String) {
        let mut session = self.session();
        if !self.is_current(&session, generation) {
            tracing::debug!("Ignoring failure of superseded connection {}: {}", generation, reason);
            return;
        }
        session.link = None;
        session.failures += 1;
        self.set_state(ConnectionState::Failed);
        tracing::warn!("Connection failed: {}", reason);
        self.router.dispatch(ChatEvent::Error(reason));

        match self.policy.delay_for(session.failures) {
            Some(delay) => {
                tracing::info!("Reconnecting in {:?} (attempt {})", delay, session.failures);
                let weak = Arc::downgrade(self);
                session.reconnect = Some(self.runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(inner) = weak.upgrade() {
                        inner.fire_reconnect(generation);
                    }
                }));
            }
            None => tracing::warn!("Giving up after {} consecutive failure(s)", session.failures),
        }
    }

    fn fire_reconnect(self: &Arc<Self>, failed_generation: u64) {
        let mut session = self.session();
        if session.generation != failed_generation || session.link.is_some() {
            return;
        }
        session.reconnect = None;
        if let Some(target) = &session.target {
            tracing::info!("Reconnecting to {}", target.server_url);
        }
        self.open(&mut session);
    }
}

/// Drive one transport connection until it closes or fails.
async fn run_connection(
    inner: Weak<Inner>,
    connector: Arc<dyn Connector>,
    url: String,
    generation: u64,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    let TransportPair {
        mut writer,
        mut reader,
    } = match connector.connect(&url).await {
        Ok(pair) => pair,
        Err(e) => {
            report_failure(&inner, generation, e.to_string());
            return;
        }
    };
    drop(connector);

    let wanted = inner
        .upgrade()
        .is_some_and(|inner| inner.on_open(generation));
    if !wanted {
        let _ = writer.close(NORMAL_CLOSURE, "superseded").await;
        return;
    }

    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = writer.send_text(text).await {
                        report_failure(&inner, generation, e.to_string());
                        return;
                    }
                }
                Some(Outbound::Close { code, reason }) => {
                    if let Err(e) = writer.close(code, &reason).await {
                        tracing::debug!("Close frame not delivered: {}", e);
                    }
                    return;
                }
                None => {
                    let _ = writer.close(NORMAL_CLOSURE, "client dropped").await;
                    return;
                }
            },
            frame = reader.recv() => match frame {
                Some(Ok(Frame::Text(text))) => match inner.upgrade() {
                    Some(inner) => inner.on_text(generation, &text),
                    None => return,
                },
                Some(Ok(Frame::Close { code, reason })) => {
                    // Answer the closing handshake before the socket is dropped
                    if let Err(e) = writer.close(code, "").await {
                        tracing::debug!("Close reply not delivered: {}", e);
                    }
                    if let Some(inner) = inner.upgrade() {
                        inner.on_peer_close(generation, code, &reason);
                    }
                    return;
                }
                Some(Err(e)) => {
                    report_failure(&inner, generation, e.to_string());
                    return;
                }
                None => {
                    report_failure(
                        &inner,
                        generation,
                        "connection closed without a close frame".to_string(),
                    );
                    return;
                }
            },
        }
    }
}

fn report_failure(inner: &Weak<Inner>, generation: u64, reason: String) {
    if let Some(inner) = inner.upgrade() {
        inner.on_failure(generation, reason);
    }
}
