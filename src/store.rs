//! Storage contract and the built-in in-memory backend for configured credentials.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::CredentialId, credential::StoredCredential};

/// Boxed future returned by every [`CredentialStore`] operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for configured credentials.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the credential keyed by its id.
	fn save(&self, credential: StoredCredential) -> StoreFuture<'_, ()>;

	/// Fetches the credential with the provided id, if present.
	fn fetch<'a>(&'a self, id: &'a CredentialId) -> StoreFuture<'a, Option<StoredCredential>>;

	/// Removes the credential; resolves to `false` when nothing was stored under `id`.
	fn delete<'a>(&'a self, id: &'a CredentialId) -> StoreFuture<'a, bool>;

	/// Lists every credential configured against the named credential descriptor.
	fn list_for<'a>(
		&'a self,
		credential_name: &'a str,
	) -> StoreFuture<'a, Vec<StoredCredential>>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
impl From<serde_json::Error> for StoreError {
	fn from(e: serde_json::Error) -> Self {
		Self::Serialization { message: e.to_string() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("database unreachable"));

		let source =
			StdError::source(&error).expect("Crate error should expose the store error as source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn serde_failures_map_to_serialization_errors() {
		let e = serde_json::from_str::<StoredCredential>("{").expect_err("Truncated JSON must fail.");
		let store_error = StoreError::from(e);

		assert!(matches!(store_error, StoreError::Serialization { .. }));
	}
}
