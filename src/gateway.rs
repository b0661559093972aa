//! Authenticated request gateway: bearer attachment, 401 detection, and replay after refresh.
//!
//! Every outbound call goes through [`Gateway::send`]. The gateway reads the stored access
//! token, attaches it as a bearer credential, and dispatches the request. A 401 on a request
//! that has not been replayed yet hands control to the refresh coordinator (see
//! [`refresh`]), which guarantees that at most one refresh call is in flight per gateway;
//! the request is then replayed exactly once with the new access token.

pub mod refresh;

pub use refresh::RefreshMetrics;

// crates.io
use ::http::Method;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::GatewayConfig,
	http::{ApiRequest, ApiResponse, HttpTransport},
	obs::{self, OpKind, OpOutcome, OpSpan},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Wraps outbound API calls with credential attachment and transparent token refresh.
///
/// Construct one gateway per signed-in client and share it: clones reuse the transport,
/// the store, and the refresh state, while separately constructed gateways never observe
/// each other's in-flight refreshes.
pub struct Gateway<C>
where
	C: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request, refresh calls included.
	pub transport: Arc<C>,
	/// Store holding the current token pair.
	pub store: Arc<dyn CredentialStore>,
	/// Endpoint and timeout settings.
	pub config: GatewayConfig,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh: Arc<refresh::RefreshCoordinator>,
}
impl<C> Gateway<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a gateway that reuses the caller-provided transport.
	pub fn with_transport(
		config: GatewayConfig,
		store: Arc<dyn CredentialStore>,
		transport: impl Into<Arc<C>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config,
			refresh_metrics: Default::default(),
			refresh: Default::default(),
		}
	}

	/// Sends `request` through the interception pipeline.
	///
	/// - The stored access token (if any) is attached as `Authorization: Bearer <token>`.
	/// - 2xx responses pass through unchanged; other statuses become [`Error::Status`].
	/// - A 401 on a request that was not replayed yet triggers (or joins) a refresh and replays
	///   the request once with the new token. A 401 on the replay is terminal.
	/// - With no refresh token stored, the original 401 comes back as
	///   [`Error::Unauthenticated`] and the store is cleared.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: OpKind = OpKind::Request;

		let span = OpSpan::new(KIND, "send");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.send_intercepted(request)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Sends `request` and decodes the JSON body of the successful response.
	pub async fn send_json<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.send(request).await?.json()
	}

	/// Builds a bodiless request for `path` relative to the configured base URL.
	pub fn request(&self, method: Method, path: &str) -> Result<ApiRequest> {
		Ok(ApiRequest::new(method, self.config.endpoint(path)?))
	}

	/// `GET path`, decoding the JSON response.
	pub async fn get<T>(&self, path: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.send_json(self.request(Method::GET, path)?).await
	}

	/// `POST path` with a JSON body, decoding the JSON response.
	pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.send_json(self.request(Method::POST, path)?.json(body)?).await
	}

	/// `PUT path` with a JSON body, decoding the JSON response.
	pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.send_json(self.request(Method::PUT, path)?.json(body)?).await
	}

	/// `DELETE path`, discarding the response body.
	pub async fn delete(&self, path: &str) -> Result<()> {
		self.send(self.request(Method::DELETE, path)?).await.map(drop)
	}

	/// Returns `true` while a refresh call is outstanding.
	pub fn is_refreshing(&self) -> bool {
		self.refresh.is_refreshing()
	}

	/// Number of requests currently parked behind the in-flight refresh.
	pub fn queued_requests(&self) -> usize {
		self.refresh.queued()
	}

	async fn send_intercepted(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		// Captured before the token read so a refresh landing in between is detected.
		let generation = self.refresh.generation();
		let sent_with = self.store.access_token().await?;
		let response = self.dispatch(&request, sent_with.as_ref()).await?;

		if !response.is_unauthorized() || request.is_retried() {
			return response.error_for_status();
		}

		request.mark_retried();

		let token = self.fresh_access_token(generation, Some(&response)).await?;

		self.dispatch(&request, Some(&token)).await?.error_for_status()
	}

	async fn dispatch(
		&self,
		request: &ApiRequest,
		token: Option<&TokenSecret>,
	) -> Result<ApiResponse> {
		let mut outbound = request.clone();

		if let Some(token) = token {
			outbound = outbound.with_bearer(token)?;
		}

		Ok(self.transport.execute(outbound).await?)
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway that provisions its own reqwest transport.
	pub fn new(config: GatewayConfig, store: Arc<dyn CredentialStore>) -> Self {
		Self::with_transport(config, store, ReqwestTransport::default())
	}
}
impl<C> Clone for Gateway<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh: self.refresh.clone(),
		}
	}
}
impl<C> Debug for Gateway<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("config", &self.config)
			.field("refreshing", &self.is_refreshing())
			.field("queued", &self.queued_requests())
			.finish()
	}
}
