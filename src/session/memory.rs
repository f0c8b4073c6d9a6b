//! In-process transport for hosts and tests that have no backend to talk to.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::transport::{Connector, FrameSink, FrameStream, TransportError, TransportParts};

/// Connector whose transports are in-memory channel pairs.
///
/// Every successful [`Connector::connect`] hands the far end of the new
/// transport to [`MemoryPeers`] so the caller can play the server.
#[derive(Clone)]
pub struct MemoryConnector {
    state: Arc<Mutex<MemoryState>>,
    peers: mpsc::UnboundedSender<MemoryPeer>,
}

#[derive(Default)]
struct MemoryState {
    attempts: Vec<String>,
    refusals: VecDeque<String>,
}

impl MemoryConnector {
    pub fn new() -> (Self, MemoryPeers) {
        let (peers, receiver) = mpsc::unbounded_channel();
        let connector = Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            peers,
        };
        (connector, MemoryPeers { receiver })
    }

    /// Makes the next connection attempt fail with `reason`. Calls queue up.
    pub fn refuse_next(&self, reason: impl Into<String>) {
        lock_unpoisoned(&self.state)
            .refusals
            .push_back(reason.into());
    }

    /// Identities of every connection attempt so far, refused ones included.
    pub fn attempts(&self) -> Vec<String> {
        lock_unpoisoned(&self.state).attempts.clone()
    }

    pub fn attempt_count(&self) -> usize {
        lock_unpoisoned(&self.state).attempts.len()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, identity: &str) -> Result<TransportParts, TransportError> {
        let refusal = {
            let mut state = lock_unpoisoned(&self.state);
            state.attempts.push(identity.to_string());
            state.refusals.pop_front()
        };
        if let Some(reason) = refusal {
            return Err(TransportError::Refused(reason));
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let peer = MemoryPeer {
            identity: identity.to_string(),
            inbound: Some(inbound_tx),
            outbound: outbound_rx,
        };
        self.peers
            .send(peer)
            .map_err(|_| TransportError::Refused("no peer listener".to_string()))?;

        Ok(TransportParts {
            sink: Box::new(MemorySink {
                sender: Some(outbound_tx),
            }),
            stream: Box::new(MemoryStream {
                receiver: inbound_rx,
            }),
        })
    }
}

/// Far ends of the transports opened through a [`MemoryConnector`].
pub struct MemoryPeers {
    receiver: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryPeers {
    /// Waits for the next accepted connection.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.receiver.recv().await
    }

    pub fn try_accept(&mut self) -> Option<MemoryPeer> {
        self.receiver.try_recv().ok()
    }
}

/// Server side of one in-memory transport.
pub struct MemoryPeer {
    identity: String,
    inbound: Option<mpsc::UnboundedSender<Result<String, TransportError>>>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Delivers a text frame to the client. Returns `false` once the client
    /// side is gone.
    pub fn push(&self, text: impl Into<String>) -> bool {
        self.inbound
            .as_ref()
            .is_some_and(|inbound| inbound.send(Ok(text.into())).is_ok())
    }

    /// Fails the transport with `error`, then closes it.
    pub fn fail(&mut self, error: TransportError) {
        if let Some(inbound) = self.inbound.take() {
            let _ = inbound.send(Err(error));
        }
    }

    /// Closes the transport from the server side.
    pub fn close(&mut self) {
        self.inbound = None;
    }

    /// Next frame the client sent. `None` once the client side is gone.
    pub async fn next_sent(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    pub fn try_next_sent(&mut self) -> Option<String> {
        self.outbound.try_recv().ok()
    }
}

struct MemorySink {
    sender: Option<mpsc::UnboundedSender<String>>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        match &self.sender {
            Some(sender) => sender.send(text).map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        }
    }

    async fn close(&mut self) {
        self.sender = None;
    }
}

struct MemoryStream {
    receiver: mpsc::UnboundedReceiver<Result<String, TransportError>>,
}

#[async_trait]
impl FrameStream for MemoryStream {
    async fn next_text(&mut self) -> Option<Result<String, TransportError>> {
        self.receiver.recv().await
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
