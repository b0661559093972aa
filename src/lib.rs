//! Authenticated HTTP gateway for the Docflow document-management API.
//!
//! Bearer attachment and singleflight token refresh with queued replay live in [`gateway`];
//! [`session`], [`guard`], and [`api`] build the client-facing surface on top of it.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod http;
pub mod obs;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::TokenPair,
		config::GatewayConfig,
		gateway::Gateway,
		http::ReqwestTransport,
		store::{CredentialStore, MemoryStore},
	};

	/// Gateway type alias used by reqwest-backed integration tests.
	pub type ReqwestTestGateway = Gateway<ReqwestTransport>;

	/// Builds a reqwest transport with a short connect timeout so failing tests never hang.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.connect_timeout(std::time::Duration::from_secs(5))
			.build()
			.expect("Failed to build Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Builds a gateway configuration rooted at a mock server base URL.
	pub fn test_config(base_url: &str) -> GatewayConfig {
		GatewayConfig::builder()
			.base_url(Url::parse(base_url).expect("Mock server URL should parse successfully."))
			.build()
			.expect("Gateway config fixture should validate.")
	}

	/// Constructs a [`Gateway`] backed by an in-memory store seeded with `pair` (when given)
	/// and the reqwest transport used across integration tests.
	pub async fn build_reqwest_test_gateway(
		base_url: &str,
		pair: Option<TokenPair>,
	) -> (ReqwestTestGateway, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());

		if let Some(pair) = pair {
			store_backend.save(pair).await.expect("Failed to seed the in-memory credential store.");
		}

		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let gateway = Gateway::with_transport(test_config(base_url), store, test_reqwest_transport());

		(gateway, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeSet,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
