//! Route guard deciding whether a client-side navigation needs a signed-in user.

// crates.io
use url::form_urlencoded;
// self
use crate::{_prelude::*, store::CredentialStore};

/// Route of the login page.
pub const LOGIN_ROUTE: &str = "/login";
/// Routes reachable without credentials.
pub const DEFAULT_PUBLIC_ROUTES: [&str; 3] = ["/login", "/register", "/forgot-password"];

/// Result of [`RouteGuard::check`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteDecision {
	/// Navigation may proceed.
	Allow,
	/// Navigation must go to the login page first.
	RedirectToLogin {
		/// Login route carrying the original path in its `redirect` parameter.
		location: String,
	},
}

/// Public-route allowlist plus the login redirect rule.
#[derive(Clone, Debug)]
pub struct RouteGuard {
	public_routes: BTreeSet<String>,
	login_route: String,
}
impl RouteGuard {
	/// Creates a guard with [`DEFAULT_PUBLIC_ROUTES`].
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `route` to the public allowlist.
	pub fn with_public_route(mut self, route: impl Into<String>) -> Self {
		self.public_routes.insert(route.into());

		self
	}

	/// Returns `true` when `path` (query and fragment ignored) needs no credentials.
	pub fn is_public(&self, path: &str) -> bool {
		let route = path.split(['?', '#']).next().unwrap_or_default();

		self.public_routes.contains(route)
	}

	/// Login location that returns the user to `path` after signing in.
	pub fn login_location(&self, path: &str) -> String {
		let redirect: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();

		format!("{}?redirect={redirect}", self.login_route)
	}

	/// Allows public routes and any route while an access token is stored.
	pub async fn check(&self, path: &str, store: &dyn CredentialStore) -> Result<RouteDecision> {
		if self.is_public(path) || store.access_token().await?.is_some() {
			return Ok(RouteDecision::Allow);
		}

		Ok(RouteDecision::RedirectToLogin { location: self.login_location(path) })
	}
}
impl Default for RouteGuard {
	fn default() -> Self {
		Self {
			public_routes: DEFAULT_PUBLIC_ROUTES.into_iter().map(String::from).collect(),
			login_route: LOGIN_ROUTE.into(),
		}
	}
}
