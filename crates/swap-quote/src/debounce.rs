//! Trailing-edge debounce for user input.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Forwards the last value pushed once `delay` passes without a new one.
///
/// Dropping the debouncer flushes any pending value and then closes the
/// output channel.
pub struct Debouncer<T> {
	input: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
	/// Must be called from within a tokio runtime.
	pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
		let (input, mut inbox) = mpsc::unbounded_channel::<T>();
		let (output, outbox) = mpsc::unbounded_channel();

		tokio::spawn(async move {
			let mut pending: Option<T> = None;
			loop {
				let Some(value) = pending.take() else {
					match inbox.recv().await {
						Some(value) => pending = Some(value),
						None => break,
					}
					continue;
				};

				tokio::select! {
					next = inbox.recv() => match next {
						Some(newer) => pending = Some(newer),
						None => {
							let _ = output.send(value);
							break;
						}
					},
					_ = sleep(delay) => {
						if output.send(value).is_err() {
							break;
						}
					}
				}
			}
		});

		(Self { input }, outbox)
	}

	/// Returns false once the output side has gone away.
	pub fn push(&self, value: T) -> bool {
		self.input.send(value).is_ok()
	}
}
