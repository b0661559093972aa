//! Access/refresh token pairs and the payload returned by the auth endpoints.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access + refresh credentials persisted by a [`CredentialStore`](crate::store::CredentialStore).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Short-lived bearer credential attached to outbound requests.
	pub access_token: TokenSecret,
	/// Longer-lived credential exchanged for a new pair once the access token expires.
	pub refresh_token: TokenSecret,
}
impl TokenPair {
	/// Builds a pair from raw token strings.
	pub fn new(access_token: impl Into<TokenSecret>, refresh_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
	}
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}

/// Body returned by the login, registration, and refresh endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Newly minted access token.
	pub access_token: TokenSecret,
	/// Newly minted refresh token.
	pub refresh_token: TokenSecret,
	/// Token type tag; the API always issues `bearer`.
	#[serde(default = "default_token_type")]
	pub token_type: String,
}
impl TokenResponse {
	/// Returns `true` if the tag names the bearer scheme (case-insensitive).
	pub fn is_bearer(&self) -> bool {
		self.token_type.eq_ignore_ascii_case("bearer")
	}

	/// Drops the type tag and keeps the storable pair.
	pub fn into_pair(self) -> TokenPair {
		TokenPair { access_token: self.access_token, refresh_token: self.refresh_token }
	}
}

fn default_token_type() -> String {
	"bearer".into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_response_defaults_type_tag() {
		let response: TokenResponse =
			serde_json::from_str(r#"{"access_token":"A2","refresh_token":"R2"}"#)
				.expect("Token response without a type tag should deserialize.");

		assert!(response.is_bearer());

		let pair = response.into_pair();

		assert_eq!(pair, TokenPair::new("A2", "R2"));
	}

	#[test]
	fn pair_debug_redacts_both_secrets() {
		let rendered = format!("{:?}", TokenPair::new("A1", "R1"));

		assert!(!rendered.contains("A1"));
		assert!(!rendered.contains("R1"));
	}
}
