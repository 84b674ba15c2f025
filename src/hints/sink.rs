//! Outbound hint events.
//!
//! The engine never talks to clients directly. It reports through a
//! [`HintSink`]; the transport decides how that reaches sockets.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tracing::warn;

use crate::core::ids::{SlotId, TeamId};
use crate::hints::payload::HintKind;
use crate::text::parts::MessagePart;

/// Receives change notifications and text messages from the hint engine.
pub trait HintSink {
    /// Hints of `kind` visible to `recipient` on `team` have changed.
    fn notify(&mut self, team: TeamId, recipient: SlotId, kind: HintKind);

    /// Show each slot its message.
    fn deliver_messages(&mut self, team: TeamId, messages: BTreeMap<SlotId, Vec<MessagePart>>);
}

/// One call made on a sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HintEvent {
    /// `notify` call.
    Changed {
        /// Team.
        team: TeamId,
        /// Slot to refresh.
        recipient: SlotId,
        /// Kind that changed.
        kind: HintKind,
    },
    /// `deliver_messages` call.
    Messages {
        /// Team.
        team: TeamId,
        /// Message per slot.
        messages: BTreeMap<SlotId, Vec<MessagePart>>,
    },
}

/// Records events in order.
impl HintSink for Vec<HintEvent> {
    fn notify(&mut self, team: TeamId, recipient: SlotId, kind: HintKind) {
        self.push(HintEvent::Changed { team, recipient, kind });
    }

    fn deliver_messages(&mut self, team: TeamId, messages: BTreeMap<SlotId, Vec<MessagePart>>) {
        self.push(HintEvent::Messages { team, messages });
    }
}

/// Forwards events to a transport task.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<HintEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver the transport task drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HintEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: HintEvent) {
        if self.tx.send(event).is_err() {
            warn!("Hint event dropped: transport receiver closed");
        }
    }
}

impl HintSink for ChannelSink {
    fn notify(&mut self, team: TeamId, recipient: SlotId, kind: HintKind) {
        self.send(HintEvent::Changed { team, recipient, kind });
    }

    fn deliver_messages(&mut self, team: TeamId, messages: BTreeMap<SlotId, Vec<MessagePart>>) {
        self.send(HintEvent::Messages { team, messages });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_records_in_order() {
        let mut sink: Vec<HintEvent> = Vec::new();
        sink.notify(TeamId(0), SlotId(1), HintKind::TextHint);
        sink.deliver_messages(TeamId(0), BTreeMap::new());
        assert_eq!(sink.len(), 2);
        assert!(matches!(sink[0], HintEvent::Changed { recipient: SlotId(1), .. }));
        assert!(matches!(sink[1], HintEvent::Messages { .. }));
    }

    #[tokio::test]
    async fn test_channel_sink_forwards() {
        let (mut sink, mut rx) = ChannelSink::new();
        sink.notify(TeamId(2), SlotId(4), HintKind::LocationSetHint);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            HintEvent::Changed { team: TeamId(2), recipient: SlotId(4), kind: HintKind::LocationSetHint }
        );
    }

    #[tokio::test]
    async fn test_channel_sink_survives_closed_receiver() {
        let (mut sink, rx) = ChannelSink::new();
        drop(rx);
        sink.notify(TeamId(0), SlotId(1), HintKind::TextHint);
        sink.deliver_messages(TeamId(0), BTreeMap::new());
    }
}
