//! Gateway configuration and its validating builder.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable consulted by [`GatewayConfig::from_env`].
pub const API_URL_ENV: &str = "DOCFLOW_API_URL";
/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
/// Path of the upstream refresh endpoint.
pub const DEFAULT_REFRESH_PATH: &str = "/api/auth/refresh";
/// Upper bound for a single refresh call.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::seconds(30);

/// Immutable settings shared by every request a [`Gateway`](crate::gateway::Gateway) sends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
	/// Root URL of the API; request paths are appended to it.
	pub base_url: Url,
	/// Path of the refresh endpoint, relative to `base_url`.
	pub refresh_path: String,
	/// Deadline for the refresh call; exceeding it counts as a refresh failure.
	pub refresh_timeout: Duration,
}
impl GatewayConfig {
	/// Creates a new builder seeded with the defaults.
	pub fn builder() -> GatewayConfigBuilder {
		GatewayConfigBuilder::default()
	}

	/// Builds a configuration from `DOCFLOW_API_URL`, falling back to the local default.
	pub fn from_env() -> Result<Self, ConfigError> {
		let raw = env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.into());

		Self::builder().base_url(Url::parse(&raw)?).build()
	}

	/// Resolves `path` (with an optional query already attached) against the base URL.
	///
	/// The base URL's own path prefix is preserved, so `http://host/backend` plus
	/// `/api/documents` becomes `http://host/backend/api/documents`.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let path = path.trim_start_matches('/');

		Ok(Url::parse(&format!("{base}/{path}"))?)
	}

	/// Full URL of the refresh endpoint.
	pub fn refresh_endpoint(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.refresh_path)
	}
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
	/// Root URL override.
	pub base_url: Option<Url>,
	/// Refresh path override.
	pub refresh_path: Option<String>,
	/// Refresh timeout override.
	pub refresh_timeout: Option<Duration>,
}
impl GatewayConfigBuilder {
	/// Sets the API root URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = Some(path.into());

		self
	}

	/// Overrides the refresh deadline.
	pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
		self.refresh_timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<GatewayConfig, ConfigError> {
		let base_url = match self.base_url {
			Some(url) => url,
			None => Url::parse(DEFAULT_BASE_URL)?,
		};
		let config = GatewayConfig {
			base_url,
			refresh_path: self.refresh_path.unwrap_or_else(|| DEFAULT_REFRESH_PATH.into()),
			refresh_timeout: self.refresh_timeout.unwrap_or(DEFAULT_REFRESH_TIMEOUT),
		};

		config.validate()?;

		Ok(config)
	}
}

impl GatewayConfig {
	fn validate(&self) -> Result<(), ConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if !self.refresh_path.starts_with('/') {
			return Err(ConfigError::InvalidRefreshPath { path: self.refresh_path.clone() });
		}
		if !self.refresh_timeout.is_positive() {
			return Err(ConfigError::NonPositiveTimeout);
		}

		Ok(())
	}
}
