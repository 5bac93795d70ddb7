//! Channel registry
//!
//! Single source of truth for channel membership. One coarse mutex guards the
//! whole map; every read and mutation goes through it, which is the entire
//! synchronization story for the relay (the workload is not
//! throughput-critical). The lock is never held across an await or a send;
//! callers take snapshots and fan out after releasing it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;

use crate::connection::ConnectionHandle;

/// Mapping from channel name to its member set.
///
/// Channels are created implicitly on first join and retained after the last
/// member leaves; an empty channel answers `members_of` with an empty
/// snapshot and is never treated as joined.
pub struct ChannelRegistry {
    channels: Mutex<HashMap<String, HashSet<Arc<ConnectionHandle>>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Add a handle to a channel, creating the channel if needed.
    ///
    /// Idempotent: a handle is a member at most once. Returns the post-join
    /// member snapshot (for computing fan-out) and whether the handle was
    /// newly added.
    pub fn join(&self, channel: &str, handle: &Arc<ConnectionHandle>) -> (Vec<Arc<ConnectionHandle>>, bool) {
        let mut channels = self.channels.lock();
        let members = channels.entry(channel.to_string()).or_default();
        let added = members.insert(handle.clone());
        let snapshot: Vec<_> = members.iter().cloned().collect();
        drop(channels);

        if added {
            info!("Connection {} joined channel {}", handle.id(), channel);
        } else {
            debug!(
                "Connection {} re-joined channel {} (membership unchanged)",
                handle.id(),
                channel
            );
        }
        (snapshot, added)
    }

    /// Remove a handle from one channel. No-op if it was never a member.
    /// Returns the remaining member snapshot.
    pub fn leave(&self, channel: &str, handle: &Arc<ConnectionHandle>) -> Vec<Arc<ConnectionHandle>> {
        let mut channels = self.channels.lock();
        let Some(members) = channels.get_mut(channel) else {
            return Vec::new();
        };
        if members.remove(handle) {
            debug!("Connection {} left channel {}", handle.id(), channel);
        }
        members.iter().cloned().collect()
    }

    /// Remove a handle from every channel in one critical section, so a
    /// concurrent join for the same handle can never leave a dangling
    /// membership once removal has begun.
    ///
    /// Returns, per channel the handle belonged to, the remaining member
    /// snapshot: the recipients of its departure notification.
    pub fn leave_all(&self, handle: &Arc<ConnectionHandle>) -> Vec<(String, Vec<Arc<ConnectionHandle>>)> {
        let mut channels = self.channels.lock();
        let mut affected = Vec::new();
        for (name, members) in channels.iter_mut() {
            if members.remove(handle) {
                affected.push((name.clone(), members.iter().cloned().collect()));
            }
        }
        drop(channels);

        if !affected.is_empty() {
            info!(
                "Connection {} removed from {} channel(s)",
                handle.id(),
                affected.len()
            );
        }
        affected
    }

    /// Current member snapshot, empty for unknown channels. Never creates a
    /// channel as a side effect.
    pub fn members_of(&self, channel: &str) -> Vec<Arc<ConnectionHandle>> {
        self.channels
            .lock()
            .get(channel)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Publish precondition: is the handle currently a member?
    pub fn is_member(&self, channel: &str, handle: &Arc<ConnectionHandle>) -> bool {
        self.channels
            .lock()
            .get(channel)
            .map(|members| members.contains(handle))
            .unwrap_or(false)
    }

    /// Number of channels ever created (empty ones included).
    pub fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
