//! Session helpers built on a [`Gateway`]: password login, registration, standalone refresh,
//! profile lookup, and logout.

// self
use crate::{
	_prelude::*,
	api::{self, RegisterRequest, UserProfile},
	auth::{TokenResponse, TokenSecret},
	gateway::Gateway,
	guard,
	http::{ApiRequest, HttpTransport},
	obs::{self, OpKind, OpOutcome, OpSpan},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Session specialized for the crate's default reqwest transport.
pub type ReqwestSession = Session<ReqwestTransport>;

/// Signed-in state of one client, backed by the gateway's credential store.
///
/// A session shares the gateway's transport, store, and refresh state, so a standalone
/// [`Session::refresh_access_token`] joins a refresh the gateway already started.
#[derive(Clone, Debug)]
pub struct Session<C>
where
	C: ?Sized + HttpTransport,
{
	gateway: Gateway<C>,
}
impl<C> Session<C>
where
	C: ?Sized + HttpTransport,
{
	/// Wraps `gateway`.
	pub fn new(gateway: Gateway<C>) -> Self {
		Self { gateway }
	}

	/// Gateway used for authenticated calls.
	pub fn gateway(&self) -> &Gateway<C> {
		&self.gateway
	}

	/// Exchanges `email` + `password` for a token pair and stores it.
	///
	/// The login call bypasses the gateway pipeline: no bearer is attached and a 401 (wrong
	/// credentials) surfaces as [`Error::Status`] instead of triggering a refresh.
	pub async fn login(&self, email: &str, password: &str) -> Result<()> {
		const KIND: OpKind = OpKind::Login;

		let span = OpSpan::new(KIND, "login");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.exchange_password(email, password)).await;

		record_outcome(KIND, &result);

		result
	}

	/// Registers a company with its administrator and stores the issued token pair.
	pub async fn register(&self, request: &RegisterRequest) -> Result<()> {
		const KIND: OpKind = OpKind::Register;

		let span = OpSpan::new(KIND, "register");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async {
				let body: TokenResponse =
					self.gateway.post_json(api::REGISTER_PATH, request).await?;

				self.gateway.store.save(body.into_pair()).await?;

				Ok::<_, Error>(())
			})
			.await;

		record_outcome(KIND, &result);

		result
	}

	/// Rotates the stored token pair and returns the new access token.
	///
	/// Returns `Ok(None)` without touching the store when no refresh token is stored, and
	/// `Ok(None)` after clearing the store when the refresh endpoint rejects the token or
	/// cannot be reached.
	pub async fn refresh_access_token(&self) -> Result<Option<TokenSecret>> {
		if self.gateway.store.refresh_token().await?.is_none() {
			return Ok(None);
		}

		match self.gateway.refresh_now().await {
			Ok(token) => Ok(Some(token)),
			Err(Error::Auth(err)) => {
				#[cfg(feature = "tracing")]
				tracing::debug!(error = %err, "standalone token refresh failed");
				#[cfg(not(feature = "tracing"))]
				let _ = err;

				Ok(None)
			},
			Err(err) => Err(err),
		}
	}

	/// Fetches the profile of the signed-in user.
	pub async fn current_user(&self) -> Result<UserProfile> {
		self.gateway.get(api::CURRENT_USER_PATH).await
	}

	/// Clears stored credentials and returns the route the caller should navigate to.
	pub async fn logout(&self) -> Result<&'static str> {
		self.gateway.store.clear().await?;

		Ok(guard::LOGIN_ROUTE)
	}

	/// Returns `true` while an access token is stored.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.gateway.store.access_token().await?.is_some())
	}

	async fn exchange_password(&self, email: &str, password: &str) -> Result<()> {
		let request = ApiRequest::post(self.gateway.config.endpoint(api::LOGIN_PATH)?)
			.form([("username", email), ("password", password)]);
		let response = self.gateway.transport.execute(request).await?.error_for_status()?;
		let body: TokenResponse = response.json()?;

		self.gateway.store.save(body.into_pair()).await?;

		Ok(())
	}
}
impl<C> From<Gateway<C>> for Session<C>
where
	C: ?Sized + HttpTransport,
{
	fn from(gateway: Gateway<C>) -> Self {
		Self::new(gateway)
	}
}

fn record_outcome<T>(kind: OpKind, result: &Result<T>) {
	match result {
		Ok(_) => obs::record_op_outcome(kind, OpOutcome::Success),
		Err(_) => obs::record_op_outcome(kind, OpOutcome::Failure),
	}
}
