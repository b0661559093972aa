//! Gateway-level error types shared across transports, stores, sessions, and resource APIs.

// self
use crate::{_prelude::*, store::StoreError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Callers distinguish three failure families:
/// - [`Error::Transport`] / [`Error::Status`]: the request failed for reasons unrelated to
///   authorization (or a retried request was rejected again).
/// - [`Error::Unauthenticated`] / [`AuthError::MissingRefreshToken`]: a 401 arrived and no
///   refresh token was stored. The request that found the store empty keeps its original
///   401; requests queued behind it see the missing-token error.
/// - [`AuthError::Refresh`]: a 401 arrived and the refresh call itself failed.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Authorization could not be recovered; local credentials have been cleared.
	#[error(transparent)]
	Auth(#[from] AuthError),

	/// The original 401 of a request that could not be recovered because no refresh token
	/// was stored; local credentials have been cleared.
	#[error("Upstream responded with HTTP {status} and no refresh token is stored; sign in again.")]
	Unauthenticated {
		/// HTTP status code of the original response.
		status: u16,
		/// Original response body decoded lossily as UTF-8.
		body: String,
	},
	/// Upstream answered with a non-success status.
	#[error("Upstream responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Response body decoded lossily as UTF-8.
		body: String,
	},
	/// Response body did not match the expected shape.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure naming the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Request payload could not be serialized.
	#[error("Request payload could not be encoded.")]
	Encode {
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
}
impl Error {
	/// Returns `true` when the failure means the user must sign in again.
	///
	/// The gateway has already cleared the credential store when this returns `true`.
	pub fn requires_login(&self) -> bool {
		matches!(self, Self::Auth(_) | Self::Unauthenticated { .. })
	}

	/// Returns `true` when the failure stems from a 401 with no stored refresh token.
	pub fn is_missing_refresh_token(&self) -> bool {
		matches!(self, Self::Unauthenticated { .. } | Self::Auth(AuthError::MissingRefreshToken))
	}

	/// HTTP status attached to the failure, when one is known.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. }
			| Self::Unauthenticated { status, .. }
			| Self::Decode { status, .. } => Some(*status),
			Self::Auth(AuthError::Refresh(RefreshError::Rejected { status, .. })) => Some(*status),
			_ => None,
		}
	}
}
impl From<RefreshError> for Error {
	fn from(e: RefreshError) -> Self {
		Self::Auth(e.into())
	}
}

/// Authorization failures that fan out to every request waiting on the same refresh.
#[derive(Clone, Debug, ThisError)]
pub enum AuthError {
	/// A 401 arrived but the store holds no refresh token.
	#[error("No refresh token is stored; sign in again.")]
	MissingRefreshToken,
	/// The refresh call failed; stored credentials were cleared.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
}

/// Reasons a refresh call can fail. Cloneable so a single outcome reaches every waiter.
#[derive(Clone, Debug, ThisError)]
pub enum RefreshError {
	/// Refresh endpoint answered with a non-success status (revoked or expired refresh token).
	#[error("Refresh endpoint rejected the refresh token with HTTP {status}: {message}.")]
	Rejected {
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
		/// Truncated response body.
		message: String,
	},
	/// Refresh endpoint did not answer within the configured timeout.
	#[error("Refresh endpoint did not respond in time.")]
	Timeout,
	/// Network failure while calling the refresh endpoint.
	#[error("Transport failed while calling the refresh endpoint.")]
	Transport(#[source] Arc<TransportError>),
	/// Refresh endpoint returned a body that is not a token pair.
	#[error("Refresh endpoint returned malformed JSON.")]
	MalformedResponse(#[source] Arc<serde_path_to_error::Error<serde_json::Error>>),
	/// Refresh endpoint URL could not be resolved from the configuration.
	#[error("Refresh endpoint URL is invalid: {message}.")]
	InvalidEndpoint {
		/// Resolution failure rendered as text.
		message: String,
	},
	/// The credential store failed while reading or persisting the token pair.
	#[error("Credential store failed during refresh.")]
	Storage(#[source] StoreError),
}
impl From<TransportError> for RefreshError {
	fn from(e: TransportError) -> Self {
		match e {
			TransportError::Timeout { .. } => Self::Timeout,
			other => Self::Transport(Arc::new(other)),
		}
	}
}

/// Configuration and validation failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// Header value contains bytes that cannot be sent.
	#[error("Header value is invalid.")]
	InvalidHeader(#[from] ::http::header::InvalidHeaderValue),
	/// A URL could not be parsed or joined.
	#[error("URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than http or https.
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// URL that failed validation.
		url: String,
	},
	/// Refresh path is not absolute.
	#[error("Refresh path must start with `/`: {path}.")]
	InvalidRefreshPath {
		/// Path that failed validation.
		path: String,
	},
	/// Refresh timeout must be positive.
	#[error("The refresh timeout must be positive.")]
	NonPositiveTimeout,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<url::ParseError> for ConfigError {
	fn from(source: url::ParseError) -> Self {
		Self::InvalidUrl { source }
	}
}

/// Transport-level failures (network, timeout, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded its deadline.
	#[error("Request timed out while calling the API.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, ThisError)]
	#[error("socket closed")]
	struct SocketClosed;

	#[test]
	fn auth_failures_require_login() {
		let missing: Error = AuthError::MissingRefreshToken.into();
		let rejected: Error =
			RefreshError::Rejected { status: 401, message: "revoked".into() }.into();
		let plain = Error::Status { status: 500, body: "boom".into() };
		let unauthenticated = Error::Unauthenticated { status: 401, body: "Not authenticated".into() };

		assert!(missing.requires_login());
		assert!(missing.is_missing_refresh_token());
		assert!(unauthenticated.requires_login());
		assert!(unauthenticated.is_missing_refresh_token());
		assert_eq!(unauthenticated.status(), Some(401));
		assert!(!rejected.is_missing_refresh_token());
		assert!(rejected.requires_login());
		assert_eq!(rejected.status(), Some(401));
		assert!(!plain.requires_login());
		assert_eq!(plain.status(), Some(500));
	}

	#[test]
	fn transport_timeouts_map_to_refresh_timeouts() {
		let timeout = RefreshError::from(TransportError::timeout(SocketClosed));
		let network = RefreshError::from(TransportError::network(SocketClosed));

		assert!(matches!(timeout, RefreshError::Timeout));
		assert!(matches!(network, RefreshError::Transport(_)));

		let source = StdError::source(&network)
			.expect("Refresh transport failures should expose the transport error as source.");

		assert_eq!(source.to_string(), "Network error occurred while calling the API.");
	}

	#[test]
	fn store_error_converts_with_source() {
		let store_error = StoreError::Backend { message: "disk full".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("disk full"));
		assert!(!error.requires_login());
	}
}
