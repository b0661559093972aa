//! Credential models: redacted secrets, token pairs, and the token endpoint payload.

pub mod pair;
pub mod secret;

pub use pair::*;
pub use secret::*;
