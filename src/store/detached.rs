//! [`CredentialStore`] for execution contexts that have no client-local storage.

// self
use crate::{
	auth::{TokenPair, TokenSecret},
	store::{CredentialStore, StoreFuture},
};

/// Store that never holds credentials: reads yield `None`, writes are dropped.
///
/// Useful for server-side rendering or CLI probes where requests should go out
/// unauthenticated and every 401 surfaces as a missing refresh token.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedStore;
impl CredentialStore for DetachedStore {
	fn access_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async { Ok(None) })
	}

	fn refresh_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async { Ok(None) })
	}

	fn save(&self, pair: TokenPair) -> StoreFuture<'_, ()> {
		drop(pair);

		Box::pin(async { Ok(()) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async { Ok(()) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn writes_are_dropped() {
		let store = DetachedStore;

		store.save(TokenPair::new("A1", "R1")).await.expect("Detached save should succeed.");

		assert!(store.access_token().await.expect("Detached read should succeed.").is_none());
		assert!(store.refresh_token().await.expect("Detached read should succeed.").is_none());
	}
}
