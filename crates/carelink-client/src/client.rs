//! The realtime client: one outbound connection, managed as a capability.
//!
//! [`RealtimeClient`] is a thin handle over a background link task. Each
//! call to [`connect`](RealtimeClient::connect) tears down the previous
//! attempt and spawns a fresh task that performs the WebSocket handshake
//! and runs the read/write loop. Callers observe connectivity only through
//! [`on_status_change`](RealtimeClient::on_status_change) and
//! [`is_connected`](RealtimeClient::is_connected); no ordinary network
//! failure surfaces as an error from the public API.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use carelink_core::wire::{Frame, LoginRequest};

type ActionCallback = Arc<dyn Fn(Value) + Send + Sync>;
type StatusCallback = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
struct LinkState {
    connected: bool,
    outbound: Option<mpsc::UnboundedSender<String>>,
    /// One-shot deferred LOGIN, dispatched exactly once when the
    /// connection opens. Replaced, not queued, by a later `login` call.
    pending_login: Option<String>,
}

struct Shared {
    link: Mutex<LinkState>,
    action_cb: Mutex<Option<ActionCallback>>,
    status_subs: Mutex<Vec<(u64, StatusCallback)>>,
    next_sub_id: AtomicU64,
    /// Bumped on every connect/disconnect so a stale link task cannot
    /// clobber the state of its successor.
    generation: AtomicU64,
}

/// Client session adapter over a single relay connection.
pub struct RealtimeClient {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeClient {
    /// Creates a disconnected client.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                link: Mutex::new(LinkState::default()),
                action_cb: Mutex::new(None),
                status_subs: Mutex::new(Vec::new()),
                next_sub_id: AtomicU64::new(0),
                generation: AtomicU64::new(0),
            }),
            task: Mutex::new(None),
        }
    }

    /// Opens a connection to the relay, tearing down any prior attempt.
    ///
    /// Safe to call repeatedly. Must be called within a Tokio runtime; the
    /// handshake and read/write loop run on a background task. The caller
    /// is responsible for bounding how long it waits for the connection to
    /// open (5 seconds is a reasonable budget).
    pub fn connect(&self, url: &str) {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let was_connected = {
            let mut link = self.shared.link.lock().unwrap();
            let was = link.connected;
            link.connected = false;
            link.outbound = Some(tx);
            was
        };
        if was_connected {
            self.shared.notify_status(false);
        }

        let shared = self.shared.clone();
        let url = url.to_string();
        *self.task.lock().unwrap() = Some(tokio::spawn(run_link(shared, url, generation, rx)));
    }

    /// Sends the LOGIN envelope, deferring it until open if necessary.
    ///
    /// Calling this before the connection opens never errors and never
    /// drops the message; at most one LOGIN is staged at a time.
    pub fn login(&self, username: &str, password: &str, room: &str) {
        let frame = Frame::Login(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            room: Some(room.to_string()),
        });
        let text = match serde_json::to_string(&frame) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "Failed to serialize LOGIN");
                return;
            }
        };

        let mut link = self.shared.link.lock().unwrap();
        if link.connected {
            if let Some(tx) = &link.outbound {
                let _ = tx.send(text);
                debug!(username, room, "LOGIN sent");
                return;
            }
        }
        link.pending_login = Some(text);
        debug!(username, room, "LOGIN deferred until open");
    }

    /// Sends an ACTION envelope if the connection is currently open;
    /// silently drops it otherwise. Fire-and-forget by contract.
    pub fn send_action(&self, action: Value) {
        let link = self.shared.link.lock().unwrap();
        if !link.connected {
            return;
        }
        let Some(tx) = &link.outbound else {
            return;
        };
        match serde_json::to_string(&Frame::Action(action)) {
            Ok(text) => {
                let _ = tx.send(text);
            }
            Err(e) => warn!(error = %e, "Failed to serialize action"),
        }
    }

    /// Registers the callback invoked with each relayed action payload.
    /// Replaces any previously registered callback.
    pub fn on_action(&self, callback: impl Fn(Value) + Send + Sync + 'static) {
        *self.shared.action_cb.lock().unwrap() = Some(Arc::new(callback));
    }

    /// Subscribes to connectivity transitions. Returns an unsubscribe
    /// closure that removes exactly this subscription.
    pub fn on_status_change(
        &self,
        callback: impl Fn(bool) + Send + Sync + 'static,
    ) -> impl FnOnce() + Send + 'static {
        let id = self.shared.next_sub_id.fetch_add(1, Ordering::SeqCst);
        self.shared
            .status_subs
            .lock()
            .unwrap()
            .push((id, Arc::new(callback)));

        let shared = self.shared.clone();
        move || {
            shared
                .status_subs
                .lock()
                .unwrap()
                .retain(|(sub_id, _)| *sub_id != id);
        }
    }

    /// Point-in-time connectivity check.
    pub fn is_connected(&self) -> bool {
        self.shared.link.lock().unwrap().connected
    }

    /// Closes the connection if open. Status subscribers observe `false`.
    pub fn disconnect(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);

        let was_connected = {
            let mut link = self.shared.link.lock().unwrap();
            let was = link.connected;
            link.connected = false;
            // Dropping the sender lets the link task close the socket.
            link.outbound = None;
            link.pending_login = None;
            was
        };

        let _ = self.task.lock().unwrap().take();

        if was_connected {
            self.shared.notify_status(false);
        }
    }
}

impl Default for RealtimeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Shared {
    fn notify_status(&self, connected: bool) {
        let subs: Vec<StatusCallback> = self
            .status_subs
            .lock()
            .unwrap()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for cb in subs {
            cb(connected);
        }
    }

    fn dispatch(&self, text: &str) {
        match serde_json::from_str::<Frame>(text) {
            Ok(Frame::Action(payload)) => {
                let cb = self.action_cb.lock().unwrap().clone();
                if let Some(cb) = cb {
                    cb(payload);
                }
            }
            Ok(Frame::LoginSuccess(ack)) => {
                debug!(username = %ack.username, room = %ack.room, "Login acknowledged");
            }
            Ok(Frame::Error(message)) => {
                warn!(%message, "Relay reported an error");
            }
            Ok(Frame::Login(_)) => {}
            Err(e) => {
                warn!(error = %e, "Ignoring invalid inbound frame");
            }
        }
    }

    /// Marks the link closed unless a newer connect/disconnect already
    /// superseded this attempt.
    fn finish(&self, generation: u64) {
        let was_connected = {
            let mut link = self.link.lock().unwrap();
            if self.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            let was = link.connected;
            link.connected = false;
            link.outbound = None;
            // A LOGIN staged against this attempt dies with it; it must
            // not leak into a later connect.
            link.pending_login = None;
            was
        };
        if was_connected {
            self.notify_status(false);
        }
    }
}

/// Background task: handshake, open notification, deferred LOGIN flush,
/// then the read/write loop until either side closes.
async fn run_link(
    shared: Arc<Shared>,
    url: String,
    generation: u64,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
) {
    let (ws, _) = match connect_async(&url).await {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "WebSocket connect failed");
            shared.finish(generation);
            return;
        }
    };

    debug!("Realtime connection established");
    let (mut sink, mut stream) = ws.split();

    let pending = {
        let mut link = shared.link.lock().unwrap();
        if shared.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        link.connected = true;
        link.pending_login.take()
    };
    shared.notify_status(true);

    if let Some(login) = pending {
        if sink.send(Message::text(login)).await.is_err() {
            shared.finish(generation);
            return;
        }
        debug!("Deferred LOGIN sent");
    }

    loop {
        tokio::select! {
            frame = outbound_rx.recv() => match frame {
                Some(text) => {
                    if sink.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                None => {
                    let _ = sink.close().await;
                    break;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => shared.dispatch(text.as_str()),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    debug!("Realtime connection closed");
    shared.finish(generation);
}
