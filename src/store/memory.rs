//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::CredentialId,
	credential::StoredCredential,
	store::{CredentialStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<CredentialId, StoredCredential>>>;

/// Thread-safe storage backend that keeps credentials in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored credentials.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn save_now(map: StoreMap, credential: StoredCredential) -> Result<(), StoreError> {
		map.write().insert(credential.id.clone(), credential);

		Ok(())
	}

	fn list_now(map: StoreMap, credential_name: &str) -> Vec<StoredCredential> {
		let mut matches = map
			.read()
			.values()
			.filter(|credential| credential.credential_name == credential_name)
			.cloned()
			.collect::<Vec<_>>();

		matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

		matches
	}
}
impl CredentialStore for MemoryStore {
	fn save(&self, credential: StoredCredential) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(map, credential) })
	}

	fn fetch<'a>(&'a self, id: &'a CredentialId) -> StoreFuture<'a, Option<StoredCredential>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(id).cloned()) })
	}

	fn delete<'a>(&'a self, id: &'a CredentialId) -> StoreFuture<'a, bool> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(id).is_some()) })
	}

	fn list_for<'a>(
		&'a self,
		credential_name: &'a str,
	) -> StoreFuture<'a, Vec<StoredCredential>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::list_now(map, credential_name)) })
	}
}
