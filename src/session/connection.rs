use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::event::{Generation, SessionEvent, TimerId};
use super::status::ConnectionStatus;
use super::transport::{Connector, TransportParts};

/// Owner of the single logical realtime connection.
///
/// All state changes happen on the caller's task: transport tasks and
/// reconnect timers only report back through the event channel returned by
/// [`SessionConnection::new`], and the owner feeds those events into
/// [`SessionConnection::handle_event`]. Events tagged with a generation other
/// than the live handle's, and timers other than the pending one, are
/// ignored, so a superseded attempt can never revive a second handle.
pub struct SessionConnection {
    connector: Arc<dyn Connector>,
    reconnect_delay: Duration,
    identity: Option<String>,
    handle: Option<SessionHandle>,
    last_generation: Generation,
    last_timer: TimerId,
    pending_reconnect: Option<PendingReconnect>,
    events: mpsc::UnboundedSender<SessionEvent>,
    status: watch::Sender<ConnectionStatus>,
}

/// One connection attempt. Dropping it aborts its transport task.
struct SessionHandle {
    identity: String,
    generation: Generation,
    outbound: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct PendingReconnect {
    timer: TimerId,
    task: JoinHandle<()>,
}

impl Drop for PendingReconnect {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl SessionConnection {
    pub fn new(
        connector: Arc<dyn Connector>,
        reconnect_delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        let connection = Self {
            connector,
            reconnect_delay,
            identity: None,
            handle: None,
            last_generation: 0,
            last_timer: 0,
            pending_reconnect: None,
            events,
            status,
        };
        (connection, receiver)
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Identity the connection is bound to, if any.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Generation of the live handle.
    pub fn generation(&self) -> Option<Generation> {
        self.handle.as_ref().map(|handle| handle.generation)
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.pending_reconnect.is_some()
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// Binds `identity` and starts connecting.
    ///
    /// Returns `false` without side effects when `identity` is blank, differs
    /// from the identity already bound, or a handle already exists. Opening
    /// the bound identity while a reconnect is pending connects right away and
    /// cancels the timer.
    pub fn open(&mut self, identity: &str) -> bool {
        let identity = identity.trim();
        if identity.is_empty() {
            debug!("open ignored: blank identity");
            return false;
        }
        if let Some(bound) = self.identity.as_deref().filter(|bound| *bound != identity) {
            debug!(identity, bound, "open ignored: session is bound to another identity");
            return false;
        }
        if let Some(handle) = &self.handle {
            debug!(
                identity,
                bound = %handle.identity,
                "open ignored: session handle already exists"
            );
            return false;
        }

        self.identity = Some(identity.to_string());
        self.pending_reconnect = None;
        self.start_handle(identity.to_string());
        true
    }

    /// Unbinds the identity, drops the live handle and cancels any pending
    /// reconnect. The connection stays disconnected until the next `open`.
    pub fn leave(&mut self) {
        if let Some(identity) = self.identity.take() {
            info!(%identity, "leaving session");
        }
        self.pending_reconnect = None;
        self.handle = None;
        self.set_status(ConnectionStatus::Disconnected);
    }

    /// Queues `text` on the live transport.
    ///
    /// Frames are dropped, not buffered, unless the connection is
    /// `connected`. Returns whether the frame was handed to the transport.
    pub fn send(&self, text: String) -> bool {
        match &self.handle {
            Some(handle) if self.status().is_connected() => {
                if handle.outbound.send(text).is_ok() {
                    true
                } else {
                    debug!(generation = handle.generation, "dropping frame: transport task ended");
                    false
                }
            }
            _ => {
                debug!(status = %self.status(), "dropping frame: not connected");
                false
            }
        }
    }

    /// Applies one event. Returns the text of an inbound frame that belongs
    /// to the live handle.
    pub fn handle_event(&mut self, event: SessionEvent) -> Option<String> {
        match event {
            SessionEvent::Opened { generation } if self.is_current(generation) => {
                info!(generation, identity = ?self.identity, "session connected");
                self.set_status(ConnectionStatus::Connected);
            }
            SessionEvent::Frame { generation, text } if self.is_current(generation) => {
                return Some(text);
            }
            SessionEvent::Errored { generation, error } if self.is_current(generation) => {
                warn!(generation, %error, "session transport error");
                self.set_status(ConnectionStatus::Errored);
            }
            SessionEvent::Closed { generation } if self.is_current(generation) => {
                self.on_closed(generation);
            }
            SessionEvent::ReconnectDue { timer } => self.on_reconnect_due(timer),
            stale => {
                debug!(
                    generation = ?stale.generation(),
                    live = ?self.generation(),
                    "ignoring event from superseded session handle"
                );
            }
        }
        None
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.generation() == Some(generation)
    }

    fn start_handle(&mut self, identity: String) {
        self.last_generation += 1;
        let generation = self.last_generation;
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_transport(
            Arc::clone(&self.connector),
            identity.clone(),
            generation,
            outbound_rx,
            self.events.clone(),
        ));

        info!(identity = %identity, generation, "session connecting");
        self.handle = Some(SessionHandle {
            identity,
            generation,
            outbound,
            task,
        });
        self.set_status(ConnectionStatus::Connecting);
    }

    fn on_closed(&mut self, generation: Generation) {
        self.handle = None;
        self.set_status(ConnectionStatus::Disconnected);
        info!(generation, "session closed");

        if self.identity.is_some() {
            self.schedule_reconnect();
        }
    }

    fn schedule_reconnect(&mut self) {
        self.last_timer += 1;
        let timer = self.last_timer;
        let delay = self.reconnect_delay;
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(SessionEvent::ReconnectDue { timer });
        });

        debug!(timer, ?delay, "reconnect scheduled");
        self.pending_reconnect = Some(PendingReconnect { timer, task });
    }

    fn on_reconnect_due(&mut self, timer: TimerId) {
        let is_pending = self
            .pending_reconnect
            .as_ref()
            .is_some_and(|pending| pending.timer == timer);
        if !is_pending {
            debug!(timer, "ignoring superseded reconnect timer");
            return;
        }
        self.pending_reconnect = None;

        if self.handle.is_some() {
            return;
        }
        let Some(identity) = self.identity.clone() else {
            return;
        };
        self.start_handle(identity);
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

async fn run_transport(
    connector: Arc<dyn Connector>,
    identity: String,
    generation: Generation,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    let TransportParts {
        mut sink,
        mut stream,
    } = match connector.connect(&identity).await {
        Ok(parts) => parts,
        Err(error) => {
            let _ = events.send(SessionEvent::Errored { generation, error });
            let _ = events.send(SessionEvent::Closed { generation });
            return;
        }
    };

    if events.send(SessionEvent::Opened { generation }).is_err() {
        return;
    }

    loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(text) => {
                    if let Err(error) = sink.send_text(text).await {
                        let _ = events.send(SessionEvent::Errored { generation, error });
                        break;
                    }
                }
                None => {
                    sink.close().await;
                    break;
                }
            },
            incoming = stream.next_text() => match incoming {
                Some(Ok(text)) => {
                    if events.send(SessionEvent::Frame { generation, text }).is_err() {
                        return;
                    }
                }
                Some(Err(error)) => {
                    let _ = events.send(SessionEvent::Errored { generation, error });
                    break;
                }
                None => break,
            },
        }
    }

    let _ = events.send(SessionEvent::Closed { generation });
}
