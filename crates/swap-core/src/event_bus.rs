//! Broadcast channel for [`SwapEvent`]s.

use crate::SwapEvent;
use tokio::sync::broadcast;

/// Fan-out of core progress events to any number of observers.
///
/// Cloning yields another handle onto the same channel.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<SwapEvent>,
}

impl EventBus {
	/// `capacity` events are buffered per subscriber before the oldest are
	/// dropped for slow readers.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<SwapEvent> {
		self.sender.subscribe()
	}

	/// Publishes to current subscribers, if any.
	pub fn publish(&self, event: SwapEvent) {
		if self.sender.send(event).is_err() {
			tracing::trace!("No subscribers for swap event");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ExecutionState;

	#[tokio::test]
	async fn test_subscribers_receive_published_events() {
		let bus = EventBus::new(8);
		let mut first = bus.subscribe();
		let mut second = bus.clone().subscribe();

		bus.publish(SwapEvent::StateChanged(ExecutionState::Executing));

		for rx in [&mut first, &mut second] {
			assert!(matches!(
				rx.recv().await.unwrap(),
				SwapEvent::StateChanged(ExecutionState::Executing)
			));
		}
	}

	#[test]
	fn test_publish_without_subscribers() {
		EventBus::new(1).publish(SwapEvent::StateChanged(ExecutionState::Idle));
	}
}
