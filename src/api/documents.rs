//! Document registry client.

// crates.io
use ::http::Method;
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, gateway::Gateway, http::HttpTransport};

const DOCUMENTS_PATH: &str = "/api/documents";

/// Document summary as returned by the registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
	/// Document identifier.
	pub id: u64,
	/// Human-readable title.
	pub title: String,
	/// Document kind (contract, invoice, act, ...).
	pub document_type: String,
	/// Registration number.
	pub number: String,
	/// Workflow status (draft, sent, signed, ...).
	pub status: String,
	/// Creation timestamp as sent by the API.
	pub created_at: String,
	/// Last update timestamp as sent by the API.
	pub updated_at: String,
	/// Remaining fields, kept verbatim.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Filters and paging for [`DocumentsApi::list`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentQuery {
	/// Number of records to skip.
	pub skip: Option<u32>,
	/// Maximum number of records to return.
	pub limit: Option<u32>,
	/// Only documents in this status.
	pub status: Option<String>,
	/// Only documents of this kind.
	pub document_type: Option<String>,
}
impl DocumentQuery {
	fn pairs(&self) -> Vec<(&'static str, String)> {
		let mut pairs = Vec::new();

		if let Some(skip) = self.skip {
			pairs.push(("skip", skip.to_string()));
		}
		if let Some(limit) = self.limit {
			pairs.push(("limit", limit.to_string()));
		}
		if let Some(status) = &self.status {
			pairs.push(("status", status.clone()));
		}
		if let Some(document_type) = &self.document_type {
			pairs.push(("document_type", document_type.clone()));
		}

		pairs
	}
}

/// Client for `/api/documents`.
#[derive(Clone, Debug)]
pub struct DocumentsApi<C>
where
	C: ?Sized + HttpTransport,
{
	gateway: Gateway<C>,
}
impl<C> DocumentsApi<C>
where
	C: ?Sized + HttpTransport,
{
	/// Wraps `gateway`.
	pub fn new(gateway: Gateway<C>) -> Self {
		Self { gateway }
	}

	/// Lists documents matching `query`.
	pub async fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>> {
		let mut request = self.gateway.request(Method::GET, DOCUMENTS_PATH)?;

		for (key, value) in query.pairs() {
			request = request.query(key, &value);
		}

		self.gateway.send_json(request).await
	}

	/// Fetches one document.
	pub async fn get(&self, id: u64) -> Result<Document> {
		self.gateway.get(&format!("{DOCUMENTS_PATH}/{id}")).await
	}

	/// Creates a document from a partial payload.
	pub async fn create(&self, payload: &Value) -> Result<Document> {
		self.gateway.post_json(DOCUMENTS_PATH, payload).await
	}

	/// Updates fields of an existing document.
	pub async fn update(&self, id: u64, payload: &Value) -> Result<Document> {
		self.gateway.put_json(&format!("{DOCUMENTS_PATH}/{id}"), payload).await
	}

	/// Deletes a document.
	pub async fn delete(&self, id: u64) -> Result<()> {
		self.gateway.delete(&format!("{DOCUMENTS_PATH}/{id}")).await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn query_only_emits_set_filters() {
		let query =
			DocumentQuery { limit: Some(20), status: Some("draft".into()), ..Default::default() };

		assert_eq!(query.pairs(), vec![("limit", "20".to_string()), ("status", "draft".to_string())]);
		assert!(DocumentQuery::default().pairs().is_empty());
	}

	#[test]
	fn unknown_fields_are_preserved() {
		let document: Document = serde_json::from_str(
			r#"{"id":7,"title":"Supply contract","document_type":"contract","number":"D-7",
			"status":"draft","created_at":"2024-03-01T10:00:00","updated_at":"2024-03-02T10:00:00",
			"partner_id":12}"#,
		)
		.expect("Documents with extra fields should deserialize.");

		assert_eq!(document.extra.get("partner_id"), Some(&Value::from(12)));
	}
}
