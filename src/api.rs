//! Typed clients for the document-management REST resources.
//!
//! Each client is a cheap handle over a cloned [`Gateway`], so every call inherits bearer
//! attachment and transparent refresh. Payloads the API leaves loosely specified are kept as
//! [`serde_json::Value`].

pub mod auth;
pub mod companies;
pub mod documents;
pub mod partners;

pub use auth::*;
pub use companies::CompaniesApi;
pub use documents::{Document, DocumentQuery, DocumentsApi};
pub use partners::PartnersApi;

// self
use crate::{gateway::Gateway, http::HttpTransport};

impl<C> Gateway<C>
where
	C: ?Sized + HttpTransport,
{
	/// Client for `/api/documents`.
	pub fn documents(&self) -> DocumentsApi<C> {
		DocumentsApi::new(self.clone())
	}

	/// Client for `/api/partners`.
	pub fn partners(&self) -> PartnersApi<C> {
		PartnersApi::new(self.clone())
	}

	/// Client for `/api/companies/me`.
	pub fn companies(&self) -> CompaniesApi<C> {
		CompaniesApi::new(self.clone())
	}
}
