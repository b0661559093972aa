//! Refresh orchestration with a singleflight flag, a FIFO waiter queue, and metrics.
//!
//! The first request that hits a 401 while no refresh is outstanding becomes the leader: it
//! sets the in-flight flag (synchronously, before its first await), exchanges the stored
//! refresh token for a new pair, and settles every queued waiter with the same outcome.
//! Requests that hit a 401 while the flag is set park on a single-resolution `oneshot`
//! handle instead of issuing their own refresh. Successful refreshes bump a generation
//! counter; a request dispatched before the bump that only now sees its 401 replays with
//! the stored token instead of refreshing a second time.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::mem;
// crates.io
use futures::channel::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenResponse, TokenSecret},
	error::{AuthError, RefreshError},
	gateway::Gateway,
	http::{self, ApiRequest, ApiResponse, HttpTransport},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

const REJECTION_PREVIEW_LEN: usize = 256;

/// Outcome shared by the leader and every waiter of one refresh.
pub(crate) type RefreshOutcome = Result<TokenSecret, AuthError>;

#[derive(Debug, Default)]
struct RefreshState {
	in_flight: bool,
	generation: u64,
	waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Per-gateway refresh state: in-flight flag, waiter queue, and success generation.
#[derive(Debug, Default)]
pub(crate) struct RefreshCoordinator(Mutex<RefreshState>);
impl RefreshCoordinator {
	pub(crate) fn generation(&self) -> u64 {
		self.0.lock().generation
	}

	pub(crate) fn is_refreshing(&self) -> bool {
		self.0.lock().in_flight
	}

	pub(crate) fn queued(&self) -> usize {
		self.0.lock().waiters.len()
	}

	/// Decides, atomically, whether the caller leads a refresh, waits for one, or can replay
	/// right away because a refresh already succeeded after `observed_generation`.
	pub(crate) fn enter(&self, observed_generation: u64) -> Ticket<'_> {
		let mut state = self.0.lock();

		if state.in_flight {
			let (tx, rx) = oneshot::channel();

			state.waiters.push(tx);

			return Ticket::Wait(rx);
		}
		if state.generation != observed_generation {
			return Ticket::Superseded;
		}

		state.in_flight = true;

		Ticket::Lead(RefreshLease { coordinator: self, settled: false })
	}
}

/// Role assigned by [`RefreshCoordinator::enter`].
pub(crate) enum Ticket<'a> {
	/// Caller must perform the refresh and settle the lease.
	Lead(RefreshLease<'a>),
	/// Caller waits for the in-flight refresh.
	Wait(oneshot::Receiver<RefreshOutcome>),
	/// A refresh completed after the caller's request was dispatched.
	Superseded,
}

/// Proof of leadership over the in-flight refresh.
///
/// Dropping an unsettled lease clears the flag and drops every waiter's sender. Waiters see
/// the closed channel, re-enter the coordinator, and one of them leads the next refresh.
pub(crate) struct RefreshLease<'a> {
	coordinator: &'a RefreshCoordinator,
	settled: bool,
}
impl RefreshLease<'_> {
	/// Fans `outcome` out to every waiter in arrival order, then clears the flag.
	///
	/// Returns the number of waiters that were settled.
	pub(crate) fn settle(mut self, outcome: &RefreshOutcome) -> usize {
		let mut state = self.coordinator.0.lock();

		if outcome.is_ok() {
			state.generation = state.generation.wrapping_add(1);
		}

		let waiters = mem::take(&mut state.waiters);
		let drained = waiters.len();

		for waiter in waiters {
			// A waiter whose request future was dropped no longer listens.
			let _ = waiter.send(outcome.clone());
		}

		state.in_flight = false;
		self.settled = true;

		drained
	}
}
impl Drop for RefreshLease<'_> {
	fn drop(&mut self) {
		if self.settled {
			return;
		}

		let mut state = self.coordinator.0.lock();

		state.waiters.clear();
		state.in_flight = false;
	}
}

impl<C> Gateway<C>
where
	C: ?Sized + HttpTransport,
{
	/// Produces an access token that is newer than the one the failed request carried.
	///
	/// `rejected` is the 401 that triggered the call. When this caller leads a refresh and no
	/// refresh token is stored, that response is surfaced as [`Error::Unauthenticated`];
	/// queued callers receive [`AuthError::MissingRefreshToken`] instead.
	pub(crate) async fn fresh_access_token(
		&self,
		observed_generation: u64,
		rejected: Option<&ApiResponse>,
	) -> Result<TokenSecret> {
		let mut observed = observed_generation;

		loop {
			match self.refresh.enter(observed) {
				Ticket::Lead(lease) => {
					let result = self.lead_refresh(lease).await;

					return match (result, rejected) {
						(Err(Error::Auth(AuthError::MissingRefreshToken)), Some(response)) =>
							Err(Error::Unauthenticated {
								status: response.status.as_u16(),
								body: response.text(),
							}),
						(result, _) => result,
					};
				},
				Ticket::Wait(receiver) => {
					self.refresh_metrics.record_queued();

					#[cfg(feature = "tracing")]
					tracing::debug!("request parked behind the in-flight token refresh");

					match receiver.await {
						Ok(outcome) => return outcome.map_err(Error::from),
						// The leader was dropped before settling; compete for the next refresh.
						Err(_) => {
							#[cfg(feature = "tracing")]
							tracing::debug!("token refresh abandoned by its leader; re-entering");
						},
					}
				},
				Ticket::Superseded => {
					if let Some(token) = self.store.access_token().await? {
						return Ok(token);
					}

					// The newer pair is already gone; compete for a regular refresh instead.
					observed = self.refresh.generation();
				},
			}
		}
	}

	/// Runs a refresh outside the request pipeline, joining one that is already in flight.
	pub(crate) async fn refresh_now(&self) -> Result<TokenSecret> {
		self.fresh_access_token(self.refresh.generation(), None).await
	}

	async fn lead_refresh(&self, lease: RefreshLease<'_>) -> Result<TokenSecret> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "lead_refresh");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let outcome = span.instrument(self.rotate_credentials()).await;
		let drained = lease.settle(&outcome);

		match &outcome {
			Ok(_) => {
				self.refresh_metrics.record_success();
				obs::record_op_outcome(KIND, OpOutcome::Success);
				obs::record_refresh_fan_out(drained, OpOutcome::Success);

				#[cfg(feature = "tracing")]
				tracing::debug!(waiters = drained, "token refresh succeeded");
			},
			Err(err) => {
				self.refresh_metrics.record_failure();
				obs::record_op_outcome(KIND, OpOutcome::Failure);
				obs::record_refresh_fan_out(drained, OpOutcome::Failure);

				#[cfg(feature = "tracing")]
				tracing::warn!(waiters = drained, error = %err, "token refresh failed; credentials cleared");
				#[cfg(not(feature = "tracing"))]
				let _ = err;
			},
		}

		outcome.map_err(Error::from)
	}

	/// Exchanges the stored refresh token and persists the new pair.
	///
	/// Any failure clears the store so higher layers fall back to the login flow.
	async fn rotate_credentials(&self) -> RefreshOutcome {
		let refresh_token = match self.store.refresh_token().await {
			Ok(Some(token)) => token,
			Ok(None) => {
				self.discard_credentials().await;

				return Err(AuthError::MissingRefreshToken);
			},
			Err(err) => {
				self.discard_credentials().await;

				return Err(RefreshError::Storage(err).into());
			},
		};
		let pair = match self.request_token_pair(&refresh_token).await {
			Ok(pair) => pair,
			Err(err) => {
				self.discard_credentials().await;

				return Err(err.into());
			},
		};
		let access_token = pair.access_token.clone();

		if let Err(err) = self.store.save(pair).await {
			self.discard_credentials().await;

			return Err(RefreshError::Storage(err).into());
		}

		Ok(access_token)
	}

	/// Calls the refresh endpoint without touching the store.
	async fn request_token_pair(
		&self,
		refresh_token: &TokenSecret,
	) -> Result<TokenPair, RefreshError> {
		let url = self
			.config
			.refresh_endpoint()
			.map_err(|err| RefreshError::InvalidEndpoint { message: err.to_string() })?;
		let request = ApiRequest::post(url)
			.query("refresh_token", refresh_token.expose())
			.with_timeout(self.config.refresh_timeout);
		let response = self.transport.execute(request).await?;

		if !response.is_success() {
			let mut message = response.text();

			if message.len() > REJECTION_PREVIEW_LEN {
				let cut = (0..=REJECTION_PREVIEW_LEN)
					.rev()
					.find(|idx| message.is_char_boundary(*idx))
					.unwrap_or(0);

				message.truncate(cut);
			}

			return Err(RefreshError::Rejected { status: response.status.as_u16(), message });
		}

		let body: TokenResponse = http::decode_json(&response.body)
			.map_err(|err| RefreshError::MalformedResponse(Arc::new(err)))?;

		#[cfg(feature = "tracing")]
		if !body.is_bearer() {
			tracing::warn!(token_type = %body.token_type, "refresh endpoint issued a non-bearer token type");
		}

		Ok(body.into_pair())
	}

	async fn discard_credentials(&self) {
		if let Err(err) = self.store.clear().await {
			#[cfg(feature = "tracing")]
			tracing::warn!(error = %err, "failed to clear credentials after an unrecoverable 401");
			#[cfg(not(feature = "tracing"))]
			let _ = err;
		}
	}
}
