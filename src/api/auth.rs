//! Payloads and paths of the authentication endpoints.

// self
use crate::_prelude::*;

/// Password login endpoint (form-encoded `username` + `password`).
pub const LOGIN_PATH: &str = "/api/auth/login";
/// Company + administrator registration endpoint.
pub const REGISTER_PATH: &str = "/api/auth/register";
/// Profile of the signed-in user.
pub const CURRENT_USER_PATH: &str = "/api/auth/me";

/// Registration form for a new company and its first administrator.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
	/// Administrator e-mail, also the login name.
	pub email: String,
	/// Administrator password.
	pub password: String,
	/// Administrator display name.
	pub full_name: String,
	/// Legal name of the company.
	pub company_name: String,
	/// Taxpayer identification number (INN) of the company.
	pub inn: String,
}
impl Debug for RegisterRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RegisterRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.field("full_name", &self.full_name)
			.field("company_name", &self.company_name)
			.field("inn", &self.inn)
			.finish()
	}
}

/// Profile returned by [`CURRENT_USER_PATH`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
	/// User identifier.
	pub id: u64,
	/// Login e-mail.
	pub email: String,
	/// Display name.
	pub full_name: String,
	/// Role inside the company (`admin`, `user`, ...).
	pub role: String,
	/// Whether the account may sign in.
	pub is_active: bool,
	/// Owning company.
	pub company_id: u64,
	/// Creation timestamp as sent by the API.
	#[serde(default)]
	pub created_at: Option<String>,
}
