//! Log-backed notification and conversion reporting.

use dashmap::DashMap;
use swap_types::{
	ConversionKind, ConversionPayload, ConversionTracker, Notification, NotificationId,
	NotificationKind, NotificationSink, TransactionHash, TxOutcome,
};
use tracing::{info, warn};

/// Writes notifications to the log and keeps pending ones until their
/// transaction settles.
#[derive(Default)]
pub struct LogNotificationSink {
	pending: DashMap<NotificationId, Notification>,
}

impl LogNotificationSink {
	pub fn new() -> Self {
		Self::default()
	}

	#[cfg(test)]
	fn pending_count(&self) -> usize {
		self.pending.len()
	}
}

fn emit(notification: &Notification) {
	let tx_hash = notification
		.tx_hash
		.as_ref()
		.map(TransactionHash::short)
		.unwrap_or_default();
	match notification.kind {
		NotificationKind::Error => warn!(
			title = %notification.title,
			tx_hash = %tx_hash,
			"{}",
			notification.msg
		),
		NotificationKind::Pending | NotificationKind::Success => info!(
			title = %notification.title,
			tx_hash = %tx_hash,
			"{}",
			notification.msg
		),
	}
}

impl NotificationSink for LogNotificationSink {
	fn dispatch(&self, notification: Notification) {
		emit(&notification);
		if notification.updated_info.is_some() {
			self.pending.insert(notification.id, notification);
		}
	}

	fn resolve(&self, id: NotificationId, outcome: TxOutcome) {
		match self.pending.remove(&id) {
			Some((_, pending)) => emit(&pending.resolved(outcome)),
			None => warn!(?outcome, "Resolved an unknown notification"),
		}
	}
}

/// Reports conversion-funnel events as structured log lines.
pub struct LogConversionTracker;

impl ConversionTracker for LogConversionTracker {
	fn track(&self, kind: ConversionKind, payload: &ConversionPayload) {
		match serde_json::to_string(payload) {
			Ok(json) => info!(?kind, payload = %json, "Conversion event"),
			Err(e) => warn!(?kind, error = %e, "Could not encode conversion event"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use swap_types::UpdatedInfo;

	#[test]
	fn test_pending_notification_held_until_resolved() {
		let sink = LogNotificationSink::new();
		let pending = Notification::pending("Pending Confirmation", "Trading 1 ETH is Pending Confirmation")
			.with_updated_info(UpdatedInfo {
				success_title: "Success!".into(),
				success_msg: "done".into(),
				error_title: "Transaction Failed".into(),
				error_msg: "failed".into(),
			});
		let id = pending.id;

		sink.dispatch(pending);
		sink.dispatch(Notification::error("Transaction Rejected", "nope"));
		assert_eq!(sink.pending_count(), 1);

		sink.resolve(id, TxOutcome::Confirmed);
		assert_eq!(sink.pending_count(), 0);

		// A second resolution finds nothing and is ignored.
		sink.resolve(id, TxOutcome::Failed);
		assert_eq!(sink.pending_count(), 0);
	}
}
