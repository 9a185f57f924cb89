use shuttle_core::EventPublisher;
use shuttle_shared::BookingEvent;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// In-process event bus. Subscribers that fall behind lose the oldest events;
/// the seat map remains the source of truth.
#[derive(Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<BookingEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventPublisher for BroadcastEventPublisher {
    fn publish(&self, event: BookingEvent) {
        info!(kind = event.kind(), trip_id = event.trip_id(), "publishing booking event");
        // No receivers is not an error; nobody is watching this trip.
        if let Err(e) = self.sender.send(event) {
            debug!(kind = e.0.kind(), "no subscribers for event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = BroadcastEventPublisher::new(8);
        let mut rx = bus.subscribe();

        bus.publish(BookingEvent::SeatsReleased {
            trip_id: "trip-1".to_string(),
            booking_id: Uuid::nil(),
            seats: vec!["5".to_string()],
            timestamp: 1,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.trip_id(), "trip-1");
        assert_eq!(event.kind(), "seats_released");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = BroadcastEventPublisher::default();
        bus.publish(BookingEvent::BookingExpired {
            trip_id: "trip-1".to_string(),
            booking_id: Uuid::nil(),
            reference: "BBE-AAAAAA".to_string(),
            timestamp: 1,
        });
    }
}
