//! Credential material that must reach the wire but never the logs.
//!
//! The same wrapper carries the client secret posted to the token endpoint and the bearer
//! token returned by it. Serde sees the plain string so both can travel in JSON bodies, while
//! `Debug` and `Display` print a placeholder so a stray `{:?}` on a config or response does not
//! leak either value.

// self
use crate::_prelude::*;

const REDACTED: &str = "<redacted>";

/// Client secret or bearer token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
	/// Wraps `value`.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw value, for the request body or the `Authorization` header only.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Empty or whitespace-only; such values are rejected as credentials and ignored as seeds.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl AsRef<str> for Secret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<&str> for Secret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for Secret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}
