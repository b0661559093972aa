//! Counterparty (partner) directory client.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, gateway::Gateway, http::HttpTransport};

const PARTNERS_PATH: &str = "/api/partners";

/// Client for `/api/partners`.
#[derive(Clone, Debug)]
pub struct PartnersApi<C>
where
	C: ?Sized + HttpTransport,
{
	gateway: Gateway<C>,
}
impl<C> PartnersApi<C>
where
	C: ?Sized + HttpTransport,
{
	/// Wraps `gateway`.
	pub fn new(gateway: Gateway<C>) -> Self {
		Self { gateway }
	}

	/// Lists every partner of the current company.
	pub async fn list(&self) -> Result<Vec<Value>> {
		self.gateway.get(PARTNERS_PATH).await
	}

	/// Fetches one partner.
	pub async fn get(&self, id: u64) -> Result<Value> {
		self.gateway.get(&format!("{PARTNERS_PATH}/{id}")).await
	}

	/// Adds a partner.
	pub async fn create(&self, payload: &Value) -> Result<Value> {
		self.gateway.post_json(PARTNERS_PATH, payload).await
	}

	/// Updates a partner.
	pub async fn update(&self, id: u64, payload: &Value) -> Result<Value> {
		self.gateway.put_json(&format!("{PARTNERS_PATH}/{id}"), payload).await
	}

	/// Removes a partner.
	pub async fn delete(&self, id: u64) -> Result<()> {
		self.gateway.delete(&format!("{PARTNERS_PATH}/{id}")).await
	}
}
