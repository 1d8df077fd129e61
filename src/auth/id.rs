//! Strongly typed opaque identifiers for sessions and persisted credentials.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}

			/// Generates a fresh random identifier.
			pub fn generate() -> Self {
				Self(random_token(GENERATED_LEN))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;
const GENERATED_LEN: usize = 32;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (session, credential).
		kind: &'static str,
	},
	/// The identifier contains characters outside `[A-Za-z0-9_-]`.
	#[error("{kind} identifier contains unsupported characters.")]
	InvalidCharacters {
		/// Kind of identifier (session, credential).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (session, credential).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! {
	SessionId,
	"Authorization session identifier; doubles as the correlation token carried by the callback.",
	"Session"
}
def_id! {
	CredentialId,
	"Opaque identifier of a persisted credential, distinct from its descriptor name.",
	"Credential"
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	// Ids travel inside URLs and message payloads unescaped.
	if !view.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
		return Err(IdentifierError::InvalidCharacters { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

fn random_token(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_validate_characters() {
		assert!(SessionId::new(" session").is_err(), "Leading whitespace must be rejected.");
		assert!(SessionId::new("a/b").is_err(), "Path separators must be rejected.");
		assert!(CredentialId::new("").is_err());

		let id = CredentialId::new("cred_42-a").expect("Credential fixture should be valid.");

		assert_eq!(id.as_ref(), "cred_42-a");
	}

	#[test]
	fn generated_ids_are_valid_and_distinct() {
		let a = SessionId::generate();
		let b = SessionId::generate();

		assert_eq!(a.len(), GENERATED_LEN);
		assert_ne!(a, b);
		assert!(SessionId::new(a.as_ref()).is_ok());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let id: SessionId =
			serde_json::from_str("\"abc123\"").expect("Session id should deserialize.");

		assert_eq!(id.as_ref(), "abc123");
		assert!(serde_json::from_str::<SessionId>("\"with space\"").is_err());
	}

	#[test]
	fn length_limits() {
		let exact = "a".repeat(IDENTIFIER_MAX_LEN);

		CredentialId::new(&exact).expect("Exact length should succeed.");

		assert!(CredentialId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<SessionId, u8> = HashMap::from_iter([(
			SessionId::new("session-123").expect("Session used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("session-123"), Some(&7));
	}
}
