//! Thread-safe in-memory [`CredentialStore`] for tests and short-lived processes.

// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
	store::{CredentialStore, StoreError, StoreFuture},
};

type Slot = Arc<RwLock<Option<TokenPair>>>;

/// Keeps the token pair in-process; clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	/// Creates a store pre-seeded with `pair`.
	pub fn with_pair(pair: TokenPair) -> Self {
		Self(Arc::new(RwLock::new(Some(pair))))
	}

	/// Returns a copy of the stored pair without going through the async contract.
	pub fn snapshot(&self) -> Option<TokenPair> {
		self.0.read().clone()
	}

	fn read_now<F>(slot: Slot, pick: F) -> Result<Option<TokenSecret>, StoreError>
	where
		F: FnOnce(&TokenPair) -> &TokenSecret,
	{
		Ok(slot.read().as_ref().map(|pair| pick(pair).clone()))
	}
}
impl CredentialStore for MemoryStore {
	fn access_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		let slot = self.0.clone();

		Box::pin(async move { Self::read_now(slot, |pair| &pair.access_token) })
	}

	fn refresh_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		let slot = self.0.clone();

		Box::pin(async move { Self::read_now(slot, |pair| &pair.refresh_token) })
	}

	fn save(&self, pair: TokenPair) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(pair);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			slot.write().take();

			Ok(())
		})
	}
}
