// std
use std::{
	future::Future,
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use parking_lot::Mutex;
use tokio::{sync::Notify, task::JoinHandle, time};
// self
use docflow_client::{
	auth::{TokenPair, TokenSecret},
	config::GatewayConfig,
	error::{AuthError, Error, RefreshError, TransportError},
	gateway::Gateway,
	http::{ApiRequest, ApiResponse, HttpTransport, TransportFuture},
	http_types::{HeaderMap, StatusCode, header::AUTHORIZATION},
	store::{CredentialStore, MemoryStore, StoreFuture},
};

const REFRESH_PATH: &str = "/api/auth/refresh";

/// Answers 401 to anything but `Bearer A2` and holds refresh calls until released.
///
/// Paths ending in `/slow` also hold their first (A1) answer until `stale_gate` opens.
struct ScriptedTransport {
	refresh_status: StatusCode,
	release: Notify,
	stale_gate: Notify,
	refresh_calls: AtomicUsize,
	seen: Mutex<Vec<String>>,
}
impl ScriptedTransport {
	fn new(refresh_status: StatusCode) -> Arc<Self> {
		Arc::new(Self {
			refresh_status,
			release: Notify::new(),
			stale_gate: Notify::new(),
			refresh_calls: AtomicUsize::new(0),
			seen: Mutex::new(Vec::new()),
		})
	}

	fn bearers(&self, value: &str) -> usize {
		self.seen.lock().iter().filter(|seen| *seen == value).count()
	}
}
impl HttpTransport for ScriptedTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			if request.url.path() == REFRESH_PATH {
				self.refresh_calls.fetch_add(1, Ordering::SeqCst);

				match request.timeout {
					Some(deadline) => time::timeout(deadline.unsigned_abs(), self.release.notified())
						.await
						.map_err(TransportError::timeout)?,
					None => self.release.notified().await,
				}

				let body = if self.refresh_status.is_success() {
					br#"{"access_token":"A2","refresh_token":"R2","token_type":"bearer"}"#.to_vec()
				} else {
					b"expired".to_vec()
				};

				return Ok(ApiResponse::new(self.refresh_status, HeaderMap::new(), body));
			}

			let bearer = request
				.headers
				.get(AUTHORIZATION)
				.and_then(|value| value.to_str().ok())
				.unwrap_or_default()
				.to_owned();
			let status =
				if bearer == "Bearer A2" { StatusCode::OK } else { StatusCode::UNAUTHORIZED };

			self.seen.lock().push(bearer);

			if status == StatusCode::UNAUTHORIZED && request.url.path().ends_with("/slow") {
				self.stale_gate.notified().await;
			}

			Ok(ApiResponse::new(status, HeaderMap::new(), b"{}".to_vec()))
		})
	}
}

/// Holds an access token but never a refresh token; refresh-token reads wait for the gate.
#[derive(Default)]
struct AccessOnlyStore {
	refresh_gate: Notify,
	cleared: AtomicBool,
}
impl CredentialStore for AccessOnlyStore {
	fn access_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async move {
			Ok((!self.cleared.load(Ordering::SeqCst)).then(|| TokenSecret::new("A1")))
		})
	}

	fn refresh_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async move {
			self.refresh_gate.notified().await;

			Ok(None)
		})
	}

	fn save(&self, _: TokenPair) -> StoreFuture<'_, ()> {
		Box::pin(async { Ok(()) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.cleared.store(true, Ordering::SeqCst);

			Ok(())
		})
	}
}

fn gateway(transport: &Arc<ScriptedTransport>) -> (Gateway<ScriptedTransport>, Arc<MemoryStore>) {
	let config = GatewayConfig::builder().build().expect("Default config should validate.");

	gateway_with(config, transport)
}

fn gateway_with(
	config: GatewayConfig,
	transport: &Arc<ScriptedTransport>,
) -> (Gateway<ScriptedTransport>, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::with_pair(TokenPair::new("A1", "R1")));
	let backend: Arc<dyn CredentialStore> = store.clone();

	(Gateway::with_transport(config, backend, transport.clone()), store)
}

fn spawn_requests(
	gateway: &Gateway<ScriptedTransport>,
	count: usize,
) -> Vec<JoinHandle<Result<serde_json::Value, Error>>> {
	(0..count)
		.map(|idx| {
			let gateway = gateway.clone();

			tokio::spawn(async move { gateway.get(&format!("/api/documents/{idx}")).await })
		})
		.collect()
}

async fn eventually<F>(mut condition: F)
where
	F: FnMut() -> bool,
{
	let poll = async {
		while !condition() {
			time::sleep(Duration::from_millis(5)).await;
		}
	};

	time::timeout(Duration::from_secs(5), poll)
		.await
		.expect("Condition was not reached within five seconds.");
}

async fn join_all<T, F>(handles: Vec<F>) -> Vec<T>
where
	F: Future<Output = Result<T, tokio::task::JoinError>>,
{
	let mut outputs = Vec::with_capacity(handles.len());

	for handle in handles {
		outputs.push(handle.await.expect("Request task should not panic."));
	}

	outputs
}

#[tokio::test]
async fn queued_requests_replay_once_with_the_new_token() {
	let transport = ScriptedTransport::new(StatusCode::OK);
	let (gateway, store) = gateway(&transport);
	let handles = spawn_requests(&gateway, 5);

	eventually(|| gateway.is_refreshing() && gateway.queued_requests() == 4).await;

	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);

	transport.release.notify_one();

	for result in join_all(handles).await {
		result.expect("Every queued request should succeed after the refresh.");
	}

	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
	assert_eq!(transport.bearers("Bearer A1"), 5);
	assert_eq!(transport.bearers("Bearer A2"), 5);
	assert_eq!(store.snapshot(), Some(TokenPair::new("A2", "R2")));
	assert_eq!(gateway.refresh_metrics.queued(), 4);
	assert!(!gateway.is_refreshing());
	assert_eq!(gateway.queued_requests(), 0);
}

#[tokio::test]
async fn queued_requests_share_the_refresh_failure() {
	let transport = ScriptedTransport::new(StatusCode::UNAUTHORIZED);
	let (gateway, store) = gateway(&transport);
	let handles = spawn_requests(&gateway, 3);

	eventually(|| gateway.queued_requests() == 2).await;
	transport.release.notify_one();

	for result in join_all(handles).await {
		let err = result.expect_err("Queued requests must fail with the refresh error.");

		assert!(err.requires_login());
		assert!(matches!(err, Error::Auth(AuthError::Refresh(_))));
	}

	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
	assert_eq!(transport.bearers("Bearer A2"), 0);
	assert!(store.snapshot().is_none());
}

#[tokio::test]
async fn abandoned_refresh_hands_leadership_to_a_queued_request() {
	let transport = ScriptedTransport::new(StatusCode::OK);
	let (gateway, store) = gateway(&transport);
	let leader = spawn_requests(&gateway, 1).remove(0);

	eventually(|| gateway.is_refreshing()).await;

	let waiters = spawn_requests(&gateway, 2);

	eventually(|| gateway.queued_requests() == 2).await;
	leader.abort();

	// One waiter takes over the refresh; the other queues behind it.
	eventually(|| {
		transport.refresh_calls.load(Ordering::SeqCst) == 2 && gateway.queued_requests() == 1
	})
	.await;
	transport.release.notify_one();

	for result in join_all(waiters).await {
		let value = result.expect("Waiters must not fail when their leader is abandoned.");

		assert!(value.is_object());
	}

	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 2);
	assert_eq!(transport.bearers("Bearer A2"), 2);
	assert!(!gateway.is_refreshing());
	assert_eq!(store.snapshot(), Some(TokenPair::new("A2", "R2")));
}

#[tokio::test]
async fn missing_refresh_token_fails_every_queued_request() {
	let transport = ScriptedTransport::new(StatusCode::OK);
	let store = Arc::new(AccessOnlyStore::default());
	let backend: Arc<dyn CredentialStore> = store.clone();
	let config = GatewayConfig::builder().build().expect("Default config should validate.");
	let gateway = Gateway::with_transport(config, backend, transport.clone());
	let handles = spawn_requests(&gateway, 3);

	eventually(|| gateway.is_refreshing() && gateway.queued_requests() == 2).await;
	store.refresh_gate.notify_one();

	let errors: Vec<Error> = join_all(handles)
		.await
		.into_iter()
		.map(|result| result.expect_err("Requests without a refresh token must fail."))
		.collect();
	let leaders = errors
		.iter()
		.filter(|err| matches!(err, Error::Unauthenticated { status: 401, .. }))
		.count();
	let queued = errors
		.iter()
		.filter(|err| matches!(err, Error::Auth(AuthError::MissingRefreshToken)))
		.count();

	assert_eq!((leaders, queued), (1, 2));
	assert!(errors.iter().all(|err| err.requires_login() && err.is_missing_refresh_token()));
	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 0);
	assert!(store.cleared.load(Ordering::SeqCst));
}

#[tokio::test]
async fn late_401_reuses_the_completed_refresh() {
	let transport = ScriptedTransport::new(StatusCode::OK);
	let (gateway, store) = gateway(&transport);

	transport.release.notify_one();

	let slow = {
		let gateway = gateway.clone();

		tokio::spawn(async move { gateway.get::<serde_json::Value>("/api/documents/slow").await })
	};

	eventually(|| transport.bearers("Bearer A1") == 1).await;

	gateway
		.get::<serde_json::Value>("/api/documents/fast")
		.await
		.expect("The fast request should rotate the token and succeed.");
	transport.stale_gate.notify_one();
	slow.await
		.expect("Request task should not panic.")
		.expect("The stale 401 should be replayed with the already rotated token.");

	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
	assert_eq!(transport.bearers("Bearer A2"), 2);
	assert_eq!(store.snapshot(), Some(TokenPair::new("A2", "R2")));
}

#[tokio::test]
async fn refresh_deadline_reaches_the_transport() {
	let transport = ScriptedTransport::new(StatusCode::OK);
	let config = GatewayConfig::builder()
		.refresh_timeout(::time::Duration::milliseconds(100))
		.build()
		.expect("Short refresh timeout should validate.");
	let (gateway, store) = gateway_with(config, &transport);

	// The refresh is never released, so only the deadline can settle it.
	for result in join_all(spawn_requests(&gateway, 2)).await {
		let err = result.expect_err("A refresh past its deadline must fail every request.");

		assert!(matches!(err, Error::Auth(AuthError::Refresh(RefreshError::Timeout))));
	}

	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
	assert!(store.snapshot().is_none());
	assert!(!gateway.is_refreshing());
}
