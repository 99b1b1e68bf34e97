//! User-facing lifecycle notifications.
//!
//! A pending notification carries the text it will become once its
//! transaction settles, so the sink can morph it in place under the same
//! [`NotificationId`] instead of creating a new one.

use serde::{Deserialize, Serialize};

use crate::{common::Id, TransactionHash};

pub type NotificationId = Id<Notification>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
	Pending,
	Success,
	Error,
}

/// Deferred text applied once the referenced transaction settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedInfo {
	pub success_title: String,
	pub success_msg: String,
	pub error_title: String,
	pub error_msg: String,
}

/// How a watched transaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOutcome {
	Confirmed,
	Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
	pub id: NotificationId,
	#[serde(rename = "type")]
	pub kind: NotificationKind,
	pub title: String,
	pub msg: String,
	pub updated_info: Option<UpdatedInfo>,
	pub tx_hash: Option<TransactionHash>,
}

impl Notification {
	fn new(kind: NotificationKind, title: impl Into<String>, msg: impl Into<String>) -> Self {
		Self {
			id: NotificationId::new(),
			kind,
			title: title.into(),
			msg: msg.into(),
			updated_info: None,
			tx_hash: None,
		}
	}

	pub fn pending(title: impl Into<String>, msg: impl Into<String>) -> Self {
		Self::new(NotificationKind::Pending, title, msg)
	}

	pub fn success(title: impl Into<String>, msg: impl Into<String>) -> Self {
		Self::new(NotificationKind::Success, title, msg)
	}

	pub fn error(title: impl Into<String>, msg: impl Into<String>) -> Self {
		Self::new(NotificationKind::Error, title, msg)
	}

	pub fn with_updated_info(mut self, info: UpdatedInfo) -> Self {
		self.updated_info = Some(info);
		self
	}

	pub fn with_tx_hash(mut self, hash: TransactionHash) -> Self {
		self.tx_hash = Some(hash);
		self
	}

	/// The settled form of a pending notification, keeping its identity.
	///
	/// Notifications without deferred text are returned unchanged.
	pub fn resolved(&self, outcome: TxOutcome) -> Notification {
		let Some(info) = &self.updated_info else {
			return self.clone();
		};
		let (kind, title, msg) = match outcome {
			TxOutcome::Confirmed => (
				NotificationKind::Success,
				info.success_title.clone(),
				info.success_msg.clone(),
			),
			TxOutcome::Failed => (
				NotificationKind::Error,
				info.error_title.clone(),
				info.error_msg.clone(),
			),
		};
		Notification {
			id: self.id,
			kind,
			title,
			msg,
			updated_info: None,
			tx_hash: self.tx_hash.clone(),
		}
	}
}

/// Displays lifecycle notifications.
pub trait NotificationSink: Send + Sync {
	fn dispatch(&self, notification: Notification);

	/// Morphs a previously dispatched pending notification into its
	/// settled form.
	fn resolve(&self, id: NotificationId, outcome: TxOutcome);
}
