//! Common types used throughout the swap core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for various entities
#[derive(Debug, Serialize, Deserialize)]
pub struct Id<T> {
	value: uuid::Uuid,
	#[serde(skip)]
	_phantom: std::marker::PhantomData<fn() -> T>,
}

// Hand-written so that `T` needs none of these traits itself.
impl<T> Clone for Id<T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
	fn eq(&self, other: &Self) -> bool {
		self.value == other.value
	}
}

impl<T> Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.value.hash(state);
	}
}

impl<T> Default for Id<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Id<T> {
	pub fn new() -> Self {
		Self {
			value: uuid::Uuid::new_v4(),
			_phantom: std::marker::PhantomData,
		}
	}

	pub fn from_bytes(bytes: [u8; 16]) -> Self {
		Self {
			value: uuid::Uuid::from_bytes(bytes),
			_phantom: std::marker::PhantomData,
		}
	}

	/// Raw 128-bit value, used where an unpredictable integer is needed.
	pub fn as_u128(&self) -> u128 {
		self.value.as_u128()
	}
}

impl<T> fmt::Display for Id<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.value)
	}
}

/// Shortens a 0x-prefixed hash for log output: `0xa096...a0b4`.
pub fn truncate_hash(hash: &str) -> String {
	if hash.len() <= 12 {
		return hash.to_string();
	}
	format!("{}...{}", &hash[..6], &hash[hash.len() - 4..])
}
