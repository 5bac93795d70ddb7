//! Connection handle abstraction
//!
//! Wraps one live transport session behind an id, an outbox, and a closed
//! flag. The registry stores handles in hash sets, so equality and hashing go
//! by id only.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::mpsc;

use crate::protocol::OutboundFrame;

/// One client's live transport session as seen by the core.
///
/// Sends are fire-and-forget: frames are serialized and pushed onto an
/// unbounded outbox drained by the connection's writer task. A slow peer can
/// never stall the caller.
pub struct ConnectionHandle {
    id: u64,
    outbox: mpsc::UnboundedSender<String>,
    closed: AtomicBool,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end of its outbox. The caller owns
    /// the receiver and pumps it into the transport sink.
    pub fn new(id: u64) -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Arc::new(Self {
            id,
            outbox: tx,
            closed: AtomicBool::new(false),
        });
        (handle, rx)
    }

    /// Opaque connection id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current liveness, checked immediately before every send.
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    /// Latch the closed flag. Returns true only for the first caller, so the
    /// close path runs exactly once no matter how many code paths observe the
    /// disconnect.
    pub fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }

    /// Serialize and send a frame, best effort.
    pub fn send(&self, frame: &OutboundFrame) {
        match serde_json::to_string(frame) {
            Ok(json) => self.send_raw(json),
            Err(e) => warn!("Failed to serialize outbound frame: {}", e),
        }
    }

    /// Send an already-serialized frame, best effort. Used by fan-out paths
    /// that serialize once for many recipients.
    pub fn send_raw(&self, json: String) {
        if !self.is_open() {
            debug!("Skipping send to closed connection {}", self.id);
            return;
        }
        // A racing close can still drop the outbox receiver between the check
        // and the send; delivery is not guaranteed, so the frame is skipped.
        if self.outbox.send(json).is_err() {
            debug!("Outbox gone for connection {}, frame dropped", self.id);
        }
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

impl Hash for ConnectionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}
