//! Event broadcaster for SSE real-time updates.
//!
//! Uses tokio::sync::broadcast to fan out visit-count changes to all open
//! SSE connections. Sending is notify-only: a lagging or absent subscriber
//! never fails the login that triggered the update.

use tokio::sync::broadcast;

use crate::models::VisitCountEvent;

/// Default capacity for the broadcast channel.
const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Fan-out hub for visit-count events.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<VisitCountEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<VisitCountEvent> {
        self.sender.subscribe()
    }

    /// Broadcast an event to all subscribers. Returns the number of
    /// receivers reached; zero subscribers is not an error.
    pub fn send(&self, event: VisitCountEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_all_receivers() {
        let broadcaster = EventBroadcaster::new();

        let mut rx1 = broadcaster.subscribe();
        let mut rx2 = broadcaster.subscribe();

        let count = broadcaster.send(VisitCountEvent { total_visits: 7 });
        assert_eq!(count, 2);

        assert_eq!(rx1.recv().await.unwrap().total_visits, 7);
        assert_eq!(rx2.recv().await.unwrap().total_visits, 7);
    }

    #[test]
    fn no_subscribers_is_not_an_error() {
        let broadcaster = EventBroadcaster::new();
        let count = broadcaster.send(VisitCountEvent { total_visits: 1 });
        assert_eq!(count, 0);
    }
}
