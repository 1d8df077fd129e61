//! Stored credential input values.

// self
use crate::_prelude::*;

/// One input value of a [`StoredCredential`](crate::credential::StoredCredential).
///
/// Every value is wrapped, secret or not; which inputs are shown on read-back is decided by
/// [`Redaction`](crate::credential::Redaction) against the descriptor. `Debug` and `Display`
/// never print the contents, so stored credentials can be logged whole.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);
impl SecretValue {
	/// Wraps a submitted or OAuth-obtained value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Cleartext value, for validation and for inputs the descriptor does not mark secret.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for SecretValue {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for SecretValue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SecretValue").field(&"<redacted>").finish()
	}
}
impl Display for SecretValue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = SecretValue::new("super-secret");

		assert_eq!(format!("{secret:?}"), "SecretValue(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), "super-secret");
	}
}
