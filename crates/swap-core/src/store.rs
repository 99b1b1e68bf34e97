//! Shared token state.

use swap_types::{Address, Decimal, Token};
use tokio::sync::RwLock;

/// The selectable tokens with their latest known balances.
///
/// Entries are snapshots; updates replace them rather than mutate them.
pub struct TokenStore {
	tokens: RwLock<Vec<Token>>,
}

impl TokenStore {
	pub fn new(tokens: Vec<Token>) -> Self {
		Self {
			tokens: RwLock::new(tokens),
		}
	}

	pub async fn all(&self) -> Vec<Token> {
		self.tokens.read().await.clone()
	}

	pub async fn get(&self, address: Address) -> Option<Token> {
		self.tokens
			.read()
			.await
			.iter()
			.find(|t| t.address == address)
			.cloned()
	}

	/// Case-insensitive lookup by ticker.
	pub async fn find_symbol(&self, symbol: &str) -> Option<Token> {
		self.tokens
			.read()
			.await
			.iter()
			.find(|t| t.symbol.eq_ignore_ascii_case(symbol))
			.cloned()
	}

	/// Applies fresh balances; returns the updated snapshots.
	pub async fn update_balances(&self, balances: &[(Address, Decimal)]) -> Vec<Token> {
		let mut tokens = self.tokens.write().await;
		let mut updated = Vec::with_capacity(balances.len());
		for (address, balance) in balances {
			if let Some(slot) = tokens.iter_mut().find(|t| t.address == *address) {
				*slot = slot.clone().with_balance(*balance);
				updated.push(slot.clone());
			}
		}
		updated
	}
}
