//! Event channel implementation using crossbeam-channel.
//!
//! Lets fleet workers on any thread report progress to the CLI.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::FleetEvent;

/// Cloneable sending half, shared by every camera worker
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<FleetEvent>,
}

impl EventSender {
    /// Send an event; dropped silently once nobody listens
    pub fn send(&self, event: FleetEvent) {
        let _ = self.inner.send(event);
    }
}

/// Receiving half, used by the CLI to drive its progress bar
pub struct EventReceiver {
    inner: Receiver<FleetEvent>,
}

impl EventReceiver {
    /// Events until every sender has been dropped
    pub fn iter(&self) -> impl Iterator<Item = FleetEvent> + '_ {
        self.inner.iter()
    }
}

/// Constructors for sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Unbounded channel; fleet events are few and small
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// Sender whose events go nowhere, for runs without progress display
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fleet::CameraId;
    use std::thread;

    fn started(camera: &str) -> FleetEvent {
        FleetEvent::CameraStarted {
            camera: CameraId::new(camera).unwrap(),
        }
    }

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(FleetEvent::Started { total_cameras: 25 });
        });

        handle.join().unwrap();

        let event = receiver.iter().next().unwrap();
        match event {
            FleetEvent::Started { total_cameras } => assert_eq!(total_cameras, 25),
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn receiver_ends_when_senders_drop() {
        let (sender, receiver) = EventChannel::new();
        sender.send(started("a"));
        sender.send(started("b"));
        drop(sender);

        assert_eq!(receiver.iter().count(), 2);
    }

    #[test]
    fn null_sender_does_not_panic() {
        let sender = null_sender();
        sender.send(FleetEvent::Started { total_cameras: 0 });
    }
}
