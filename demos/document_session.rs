//! Signs in against a mocked Docflow backend, lets the access token expire, and shows the
//! gateway rotating it transparently while listing documents.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use docflow_client::{
	api::DocumentQuery,
	config::GatewayConfig,
	gateway::Gateway,
	guard::{RouteDecision, RouteGuard},
	session::Session,
	store::{CredentialStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let _login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"expired-access\",\"refresh_token\":\"refresh-1\",\"token_type\":\"bearer\"}",
			);
		})
		.await;
	let _expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/documents").header("authorization", "Bearer expired-access");
			then.status(401).body("{\"detail\":\"Token expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh").query_param("refresh_token", "refresh-1");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"fresh-access\",\"refresh_token\":\"refresh-2\",\"token_type\":\"bearer\"}",
			);
		})
		.await;
	let _documents = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/documents").header("authorization", "Bearer fresh-access");
			then.status(200).header("content-type", "application/json").body(
				"[{\"id\":1,\"title\":\"Supply contract\",\"document_type\":\"contract\",\"number\":\"D-1\",\"status\":\"draft\",\"created_at\":\"2024-03-01T10:00:00\",\"updated_at\":\"2024-03-01T10:00:00\"}]",
			);
		})
		.await;
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let config = GatewayConfig::builder().base_url(Url::parse(&server.base_url())?).build()?;
	let gateway = Gateway::new(config, store.clone());
	let session = Session::new(gateway.clone());
	let guard = RouteGuard::new();

	if let RouteDecision::RedirectToLogin { location } = guard.check("/documents", &*store).await? {
		println!("Anonymous visit to /documents redirects to {location}.");
	}

	session.login("admin@romashka.ru", "s3cret").await?;

	let documents = gateway.documents().list(&DocumentQuery::default()).await?;

	for document in &documents {
		println!("{} {} ({})", document.number, document.title, document.status);
	}

	println!(
		"Refresh endpoint hits: {}, gateway refreshes: {}.",
		refresh.calls_async().await,
		gateway.refresh_metrics.successes()
	);
	println!("After logout, navigate to {}.", session.logout().await?);

	Ok(())
}
