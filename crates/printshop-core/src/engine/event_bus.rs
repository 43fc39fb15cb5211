//! Broadcast channel for order events.

use printshop_types::OrderEvent;
use tokio::sync::broadcast;

/// Event bus for broadcasting order events to any number of subscribers.
///
/// Clones share the same channel. Publishing with no subscribers is not an
/// error for callers: events are informational and nothing waits on them.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<OrderEvent>,
}

impl EventBus {
	/// Creates a bus that buffers up to `capacity` events per slow subscriber.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
		self.sender.subscribe()
	}

	pub fn publish(
		&self,
		event: OrderEvent,
	) -> Result<(), broadcast::error::SendError<OrderEvent>> {
		self.sender.send(event)?;
		Ok(())
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(1000)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use printshop_types::HistoryEvent;

	#[tokio::test]
	async fn test_subscribers_receive_published_events() {
		let bus = EventBus::new(8);
		let mut first = bus.subscribe();
		let mut second = bus.clone().subscribe();

		bus.publish(OrderEvent::History(HistoryEvent::Cleared)).unwrap();

		assert!(matches!(
			first.recv().await.unwrap(),
			OrderEvent::History(HistoryEvent::Cleared)
		));
		assert!(matches!(
			second.recv().await.unwrap(),
			OrderEvent::History(HistoryEvent::Cleared)
		));
	}

	#[test]
	fn test_publish_without_subscribers_fails() {
		let bus = EventBus::new(8);
		assert!(bus.publish(OrderEvent::History(HistoryEvent::Cleared)).is_err());
	}
}
