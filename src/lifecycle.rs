//! Connection lifecycle coordinator
//!
//! Wires transport open/close events to the registry. Close may be observed
//! from more than one code path; the handle's closed latch guarantees the
//! departure flow runs exactly once per connection.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::connection::ConnectionHandle;
use crate::protocol::OutboundFrame;
use crate::registry::ChannelRegistry;

pub struct LifecycleCoordinator {
    registry: Arc<ChannelRegistry>,
}

impl LifecycleCoordinator {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self { registry }
    }

    /// Connection opened: greet the client. No registry mutation happens
    /// until the client joins a channel.
    pub fn on_open(&self, handle: &Arc<ConnectionHandle>) {
        info!("Connection {} opened", handle.id());
        handle.send(&OutboundFrame::welcome());
    }

    /// Connection closed, gracefully or abruptly. Purges the handle from
    /// every channel and notifies the remaining members of each.
    pub fn on_close(&self, handle: &Arc<ConnectionHandle>) {
        if !handle.mark_closed() {
            debug!("Duplicate close signal for connection {}, ignored", handle.id());
            return;
        }
        info!("Connection {} closed", handle.id());

        for (channel, remaining) in self.registry.leave_all(handle) {
            let frame = OutboundFrame::member_left(&channel);
            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Failed to serialize departure notification: {}", e);
                    continue;
                }
            };
            for member in remaining {
                member.send_raw(json.clone());
            }
        }
    }
}
