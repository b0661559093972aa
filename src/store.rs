//! Storage contracts and built-in credential store implementations.

pub mod detached;
pub mod file;
pub mod memory;

pub use detached::DetachedStore;
pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Client-local persistence for the current token pair.
///
/// Implementations hold at most one pair. Reads on a store that cannot persist anything
/// must succeed with `None` rather than fail, so callers treat it as signed out.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the stored access token, if any.
	fn access_token(&self) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Returns the stored refresh token, if any.
	fn refresh_token(&self) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Persists or overwrites both tokens.
	fn save(&self, pair: TokenPair) -> StoreFuture<'_, ()>;

	/// Deletes both tokens.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_errors_render_their_message() {
		let error = StoreError::Serialization { message: "unexpected EOF".into() };

		assert_eq!(error.to_string(), "Serialization error: unexpected EOF.");
	}

	#[test]
	fn store_error_can_be_serialized() {
		let error = StoreError::Backend { message: "locked".into() };
		let payload = serde_json::to_string(&error).expect("StoreError should serialize to JSON.");
		let round_trip: StoreError =
			serde_json::from_str(&payload).expect("Serialized store error should deserialize.");

		assert_eq!(round_trip, error);
	}
}
