//! Transport primitives for gateway requests.
//!
//! The module exposes the replayable [`ApiRequest`] / [`ApiResponse`] pair together with the
//! [`HttpTransport`] seam. The gateway never talks to an HTTP stack directly; it hands owned
//! requests to a transport and inspects the buffered response, which is what lets a request
//! that failed with 401 be replayed verbatim after a refresh. Custom transports (test fakes,
//! alternative HTTP stacks) only need to implement [`HttpTransport::execute`].

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use ::http::{
	HeaderMap, HeaderValue, Method, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderName},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransportError},
};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks able to execute gateway requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// clone of a gateway. A non-success status is a normal response, not an error: only
/// failures to obtain a response at all (DNS, TLS, timeouts) belong in [`TransportError`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and buffers the full response body.
	///
	/// Implementations must enforce [`ApiRequest::timeout`] when it is set and report an
	/// expired deadline as [`TransportError::Timeout`]. The gateway relies on it to bound the
	/// refresh call; a transport that ignores it lets a stalled refresh hold every queued
	/// request.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// Owned, cloneable outbound request.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL, query included.
	pub url: Url,
	/// Request headers.
	pub headers: HeaderMap,
	/// Optional buffered body.
	pub body: Option<Vec<u8>>,
	/// Optional per-request deadline.
	pub timeout: Option<Duration>,
	retried: bool,
}
impl ApiRequest {
	/// Creates a bodiless request.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None, timeout: None, retried: false }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Shorthand for a `POST` request.
	pub fn post(url: Url) -> Self {
		Self::new(Method::POST, url)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(url: Url) -> Self {
		Self::new(Method::PUT, url)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(url: Url) -> Self {
		Self::new(Method::DELETE, url)
	}

	/// Serializes `payload` as the JSON body.
	pub fn json<T>(mut self, payload: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(payload).map_err(|source| Error::Encode { source })?;

		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		self.body = Some(body);

		Ok(self)
	}

	/// Encodes `fields` as an `application/x-www-form-urlencoded` body.
	pub fn form<'a, I>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(fields).finish();

		self.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
		self.body = Some(body.into_bytes());

		self
	}

	/// Appends a query parameter to the URL.
	pub fn query(mut self, key: &str, value: &str) -> Self {
		self.url.query_pairs_mut().append_pair(key, value);

		self
	}

	/// Sets (or replaces) a header.
	pub fn header(mut self, name: HeaderName, value: &str) -> Result<Self, ConfigError> {
		self.headers.insert(name, HeaderValue::from_str(value)?);

		Ok(self)
	}

	/// Bounds the request with a deadline.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Attaches `token` as the bearer credential, replacing any earlier one.
	pub fn with_bearer(mut self, token: &TokenSecret) -> Result<Self, ConfigError> {
		let mut value = HeaderValue::from_str(&token.bearer())?;

		value.set_sensitive(true);
		self.headers.insert(AUTHORIZATION, value);

		Ok(self)
	}

	/// Returns `true` once the gateway has replayed this request after a refresh.
	pub fn is_retried(&self) -> bool {
		self.retried
	}

	/// Marks the request as replayed so a second 401 is terminal.
	pub fn mark_retried(&mut self) {
		self.retried = true;
	}
}

/// Fully buffered response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response from its parts.
	pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers, body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Returns `true` for HTTP 401.
	pub fn is_unauthorized(&self) -> bool {
		self.status == StatusCode::UNAUTHORIZED
	}

	/// Body decoded lossily as UTF-8.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the JSON body, reporting the failing field path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		decode_json(&self.body).map_err(|source| Error::Decode { source, status: self.status.as_u16() })
	}

	/// Converts the response into [`Error::Status`].
	pub fn into_status_error(self) -> Error {
		Error::Status { status: self.status.as_u16(), body: self.text() }
	}

	/// Passes 2xx responses through and turns everything else into [`Error::Status`].
	pub fn error_for_status(self) -> Result<Self> {
		if self.is_success() { Ok(self) } else { Err(self.into_status_error()) }
	}
}

pub(crate) fn decode_json<T>(
	bytes: &[u8],
) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut deserializer)
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let ApiRequest { method, url, headers, body, timeout, .. } = request;
			let mut builder = client.request(method, url).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}
			if let Some(timeout) = timeout {
				builder = builder.timeout(timeout.unsigned_abs());
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?;

			Ok(ApiResponse::new(status, headers, body.to_vec()))
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test URL.")
	}

	#[test]
	fn bearer_header_is_sensitive_and_replaced() {
		let request = ApiRequest::get(url("http://localhost/api/documents"))
			.with_bearer(&TokenSecret::new("A1"))
			.expect("Bearer header should be valid.")
			.with_bearer(&TokenSecret::new("A2"))
			.expect("Bearer header should be valid.");
		let header = request.headers.get(AUTHORIZATION).expect("Authorization header is missing.");

		assert_eq!(header, "Bearer A2");
		assert!(header.is_sensitive());
		assert!(!format!("{request:?}").contains("A2"));
	}

	#[test]
	fn form_and_query_are_url_encoded() {
		let request = ApiRequest::post(url("http://localhost/api/auth/refresh"))
			.query("refresh_token", "r+1/2")
			.form([("username", "a@b.ru"), ("password", "p w")]);

		assert_eq!(request.url.query(), Some("refresh_token=r%2B1%2F2"));
		assert_eq!(
			request.body.as_deref(),
			Some("username=a%40b.ru&password=p+w".as_bytes())
		);
	}

	#[test]
	fn json_decode_reports_field_path() {
		#[derive(Debug, Deserialize)]
		struct Probe {
			#[allow(dead_code)]
			id: u64,
		}

		let response =
			ApiResponse::new(StatusCode::OK, HeaderMap::new(), br#"{"id":"seven"}"#.to_vec());
		let err = response.json::<Probe>().expect_err("String ids must fail to decode.");

		match err {
			Error::Decode { source, status } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "id");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn non_success_becomes_status_error() {
		let response =
			ApiResponse::new(StatusCode::NOT_FOUND, HeaderMap::new(), b"missing".to_vec());
		let err = response.error_for_status().expect_err("404 must not pass through.");

		assert!(matches!(err, Error::Status { status: 404, ref body } if body == "missing"));
	}
}
