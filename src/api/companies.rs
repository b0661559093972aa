//! Company profile client.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, gateway::Gateway, http::HttpTransport};

const CURRENT_COMPANY_PATH: &str = "/api/companies/me";

/// Client for the signed-in user's company profile.
#[derive(Clone, Debug)]
pub struct CompaniesApi<C>
where
	C: ?Sized + HttpTransport,
{
	gateway: Gateway<C>,
}
impl<C> CompaniesApi<C>
where
	C: ?Sized + HttpTransport,
{
	/// Wraps `gateway`.
	pub fn new(gateway: Gateway<C>) -> Self {
		Self { gateway }
	}

	/// Fetches the company profile.
	pub async fn current(&self) -> Result<Value> {
		self.gateway.get(CURRENT_COMPANY_PATH).await
	}

	/// Updates the company profile.
	pub async fn update(&self, payload: &Value) -> Result<Value> {
		self.gateway.put_json(CURRENT_COMPANY_PATH, payload).await
	}
}
