//! Message router
//!
//! Parses each inbound text frame and dispatches it against the registry.
//! All outcomes reduce to registry mutations plus fire-and-forget sends:
//! protocol errors go back to the offending sender as `error` frames, parse
//! errors are logged and dropped with no reply.

use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;

use crate::connection::ConnectionHandle;
use crate::protocol::{InboundFrame, OutboundFrame, ERR_INVALID_CHANNEL, ERR_NOT_JOINED};
use crate::registry::ChannelRegistry;

pub struct MessageRouter {
    registry: Arc<ChannelRegistry>,
}

impl MessageRouter {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self { registry }
    }

    /// Process one raw text frame from a connection.
    ///
    /// Frames from a single connection arrive here strictly in order; frames
    /// from different connections run concurrently against the registry.
    pub fn handle_frame(&self, handle: &Arc<ConnectionHandle>, text: &str) {
        let frame = match serde_json::from_str::<InboundFrame>(text) {
            Ok(frame) => frame,
            Err(e) => {
                // Deliberate leniency: unparsable input gets no reply and the
                // connection stays open.
                warn!("Dropping malformed frame from connection {}: {}", handle.id(), e);
                return;
            }
        };

        match frame {
            InboundFrame::Join { channel, id } => self.handle_join(handle, &channel, id),
            InboundFrame::Publish { channel, id, message } => {
                self.handle_publish(handle, &channel, id, message)
            }
            InboundFrame::Unknown => {
                debug!("Ignoring unknown frame kind from connection {}", handle.id());
            }
        }
    }

    fn handle_join(&self, handle: &Arc<ConnectionHandle>, channel: &str, id: Option<Value>) {
        if channel.is_empty() {
            handle.send(&OutboundFrame::error(ERR_INVALID_CHANNEL));
            return;
        }

        let (members, _newly_added) = self.registry.join(channel, handle);

        // Each join attempt runs the full ack flow, even a duplicate.
        handle.send(&OutboundFrame::joined(channel));
        handle.send(&OutboundFrame::join_ack(channel, id));

        self.fan_out(&members, handle, &OutboundFrame::member_joined(channel));
    }

    fn handle_publish(
        &self,
        handle: &Arc<ConnectionHandle>,
        channel: &str,
        id: Option<Value>,
        payload: Value,
    ) {
        if !self.registry.is_member(channel, handle) {
            handle.send(&OutboundFrame::error(ERR_NOT_JOINED));
            return;
        }

        handle.send(&OutboundFrame::publish_ack(channel, id));

        let members = self.registry.members_of(channel);
        self.fan_out(&members, handle, &OutboundFrame::broadcast(channel, payload));
    }

    /// Send a frame to every member except the sender. Serializes once and
    /// skips closed peers inside `send_raw`.
    fn fan_out(&self, members: &[Arc<ConnectionHandle>], sender: &Arc<ConnectionHandle>, frame: &OutboundFrame) {
        let json = match serde_json::to_string(frame) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize fan-out frame: {}", e);
                return;
            }
        };
        for member in members {
            if member.id() != sender.id() {
                member.send_raw(json.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Client {
        handle: Arc<ConnectionHandle>,
        rx: UnboundedReceiver<String>,
    }

    impl Client {
        fn new(id: u64) -> Self {
            let (handle, rx) = ConnectionHandle::new(id);
            Self { handle, rx }
        }

        fn frames(&mut self) -> Vec<Value> {
            let mut out = Vec::new();
            while let Ok(json) = self.rx.try_recv() {
                out.push(serde_json::from_str(&json).unwrap());
            }
            out
        }
    }

    fn router() -> (MessageRouter, Arc<ChannelRegistry>) {
        let registry = Arc::new(ChannelRegistry::new());
        (MessageRouter::new(registry.clone()), registry)
    }

    #[test]
    fn test_join_acks_in_order() {
        let (router, registry) = router();
        let mut x = Client::new(1);

        router.handle_frame(&x.handle, r#"{"type":"join","channel":"room1","id":1}"#);

        assert!(registry.is_member("room1", &x.handle));
        let frames = x.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(
            frames[0],
            json!({"type":"system","message":"Joined channel: room1","channel":"room1"})
        );
        assert_eq!(
            frames[1],
            json!({
                "type":"system",
                "message":{"id":1,"result":"Connected to channel: room1","error":null},
                "channel":"room1"
            })
        );
    }

    #[test]
    fn test_join_notifies_existing_members_only() {
        let (router, _registry) = router();
        let mut x = Client::new(1);
        let mut y = Client::new(2);

        router.handle_frame(&x.handle, r#"{"type":"join","channel":"room1","id":1}"#);
        x.frames();

        router.handle_frame(&y.handle, r#"{"type":"join","channel":"room1","id":1}"#);

        let x_frames = x.frames();
        assert_eq!(x_frames.len(), 1);
        assert_eq!(
            x_frames[0],
            json!({"type":"system","message":"A new user has joined the channel","channel":"room1"})
        );
        // The joiner gets its own acks, not the notification.
        let y_frames = y.frames();
        assert_eq!(y_frames.len(), 2);
    }

    #[test]
    fn test_join_with_empty_channel_is_an_error() {
        let (router, registry) = router();
        let mut x = Client::new(1);

        router.handle_frame(&x.handle, r#"{"type":"join","channel":"","id":1}"#);
        router.handle_frame(&x.handle, r#"{"type":"join"}"#);

        assert_eq!(registry.channel_count(), 0);
        let frames = x.frames();
        assert_eq!(frames.len(), 2);
        for frame in frames {
            assert_eq!(
                frame,
                json!({"type":"error","message":"A valid channel name is required to join"})
            );
        }
    }

    #[test]
    fn test_duplicate_join_repeats_ack_flow_without_duplicate_membership() {
        let (router, registry) = router();
        let mut x = Client::new(1);
        let mut y = Client::new(2);

        router.handle_frame(&x.handle, r#"{"type":"join","channel":"room1"}"#);
        router.handle_frame(&y.handle, r#"{"type":"join","channel":"room1"}"#);
        x.frames();
        y.frames();

        router.handle_frame(&x.handle, r#"{"type":"join","channel":"room1","id":9}"#);

        assert_eq!(registry.members_of("room1").len(), 2);
        assert_eq!(x.frames().len(), 2);
        assert_eq!(y.frames().len(), 1);
    }

    #[test]
    fn test_publish_before_join_is_rejected_without_mutation() {
        let (router, registry) = router();
        let mut x = Client::new(1);

        router.handle_frame(
            &x.handle,
            r#"{"type":"message","channel":"room1","id":2,"message":"hi"}"#,
        );

        assert_eq!(registry.channel_count(), 0);
        let frames = x.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0],
            json!({"type":"error","message":"You must join the channel before sending messages"})
        );
    }

    #[test]
    fn test_publish_to_other_joined_channel_is_rejected() {
        let (router, _registry) = router();
        let mut x = Client::new(1);

        router.handle_frame(&x.handle, r#"{"type":"join","channel":"room1"}"#);
        x.frames();

        router.handle_frame(
            &x.handle,
            r#"{"type":"message","channel":"room2","message":"hi"}"#,
        );

        let frames = x.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], "error");
    }

    #[test]
    fn test_publish_acks_sender_and_broadcasts_to_others() {
        let (router, _registry) = router();
        let mut x = Client::new(1);
        let mut y = Client::new(2);
        let mut z = Client::new(3);

        for client in [&x, &y, &z] {
            router.handle_frame(&client.handle, r#"{"type":"join","channel":"room1"}"#);
        }
        x.frames();
        y.frames();
        z.frames();

        router.handle_frame(
            &y.handle,
            r#"{"type":"message","channel":"room1","id":2,"message":"hi"}"#,
        );

        let y_frames = y.frames();
        assert_eq!(y_frames.len(), 1);
        assert_eq!(
            y_frames[0],
            json!({
                "type":"response",
                "id":2,
                "message":{"result":"Message sent","error":null},
                "channel":"room1"
            })
        );

        let expected = json!({"type":"broadcast","message":"hi","sender":"User","channel":"room1"});
        for client in [&mut x, &mut z] {
            let frames = client.frames();
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0], expected);
        }
    }

    #[test]
    fn test_broadcast_payload_is_echoed_verbatim() {
        let (router, _registry) = router();
        let mut x = Client::new(1);
        let y = Client::new(2);

        router.handle_frame(&x.handle, r#"{"type":"join","channel":"room1"}"#);
        router.handle_frame(&y.handle, r#"{"type":"join","channel":"room1"}"#);
        x.frames(); // drains x's acks and y's join notice

        let payload = r#"{"type":"message","channel":"room1","message":{"nested":[1,2,{"deep":true}],"text":"hello"}}"#;
        router.handle_frame(&y.handle, payload);

        let frames = x.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], "broadcast");
        assert_eq!(
            frames[0]["message"],
            json!({"nested":[1,2,{"deep":true}],"text":"hello"})
        );
    }

    #[test]
    fn test_unknown_kind_is_silently_ignored() {
        let (router, registry) = router();
        let mut x = Client::new(1);

        router.handle_frame(&x.handle, r#"{"type":"presence","channel":"room1"}"#);

        assert_eq!(registry.channel_count(), 0);
        assert!(x.frames().is_empty());
    }

    #[test]
    fn test_malformed_frame_is_dropped_without_reply() {
        let (router, registry) = router();
        let mut x = Client::new(1);

        router.handle_frame(&x.handle, "{{{{not json");
        router.handle_frame(&x.handle, r#"{"channel":"room1"}"#);
        router.handle_frame(&x.handle, "[1,2,3]");

        assert_eq!(registry.channel_count(), 0);
        assert!(x.frames().is_empty());
    }

    #[test]
    fn test_closed_member_is_skipped_during_fan_out() {
        let (router, _registry) = router();
        let mut x = Client::new(1);
        let mut y = Client::new(2);

        router.handle_frame(&x.handle, r#"{"type":"join","channel":"room1"}"#);
        router.handle_frame(&y.handle, r#"{"type":"join","channel":"room1"}"#);
        x.frames();
        y.frames();

        // X's transport closed but its registry entry has not been purged yet.
        x.handle.mark_closed();
        router.handle_frame(
            &y.handle,
            r#"{"type":"message","channel":"room1","message":"hi"}"#,
        );

        assert!(x.frames().is_empty());
        assert_eq!(y.frames().len(), 1); // ack only
    }
}
