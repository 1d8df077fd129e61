#![cfg(feature = "test")]

// crates.io
use color_eyre::Result;
use time::macros;
// self
use plugin_registry::{
	_preludet::*,
	auth::{CredentialId, SecretValue},
	credential::{
		CredentialService, CredentialValues, REDACTED_PLACEHOLDER, Redaction, StoredCredential,
	},
	oauth::{CallbackStatus, CompletionMessage},
	registry::Registry,
	store::{CredentialStore, MemoryStore},
};

fn values(pairs: &[(&str, &str)]) -> CredentialValues {
	pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
}

fn build_service() -> (CredentialService, MemoryStore) {
	let registry = Registry::new();

	registry.register(google_api_credential()).expect("googleApi should register.");

	let store = MemoryStore::default();
	let service =
		CredentialService::new(Arc::new(registry), Arc::new(store.clone()), Redaction::default());

	(service, store)
}

fn stored(id: &str, name: &str, minute: u8) -> StoredCredential {
	let at = macros::datetime!(2025-11-10 12:00 UTC) + Duration::minutes(minute.into());

	StoredCredential {
		id: CredentialId::new(id).expect("Credential id fixture should be valid."),
		credential_name: name.into(),
		credential_version: 1.into(),
		display_name: format!("{name} #{minute}"),
		values: [("googleApiKey".to_owned(), SecretValue::new("token"))].into_iter().collect(),
		authorized: BTreeMap::new(),
		created_at: at,
		updated_at: at,
	}
}

async fn stored_secret(store: &MemoryStore, id: &CredentialId) -> String {
	let credential = store
		.fetch(id)
		.await
		.expect("Fetching should succeed.")
		.expect("Credential should be stored.");

	credential.values["googleApiKey"].expose().to_owned()
}

#[tokio::test]
async fn memory_store_round_trips_and_lists_by_descriptor() {
	let store = MemoryStore::default();

	store.save(stored("b", "googleApi", 2)).await.expect("Saving b should succeed.");
	store.save(stored("a", "googleApi", 1)).await.expect("Saving a should succeed.");
	store.save(stored("c", "notionApi", 0)).await.expect("Saving c should succeed.");

	let id = CredentialId::new("a").expect("Id should be valid.");
	let fetched = store
		.fetch(&id)
		.await
		.expect("Fetching should succeed.")
		.expect("Stored credential should be present.");

	assert_eq!(fetched.values["googleApiKey"].expose(), "token");

	let listed = store.list_for("googleApi").await.expect("Listing should succeed.");

	assert_eq!(listed.iter().map(|c| &*c.id).collect::<Vec<_>>(), ["a", "b"]);
	assert!(store.delete(&id).await.expect("Delete should succeed."));
	assert!(!store.delete(&id).await.expect("Second delete should succeed."));
	assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn read_back_never_returns_secrets() {
	let (service, store) = build_service();
	let created = service
		.create("googleApi", "Workspace", values(&[("googleApiKey", "ya29.secret")]))
		.await
		.expect("Credential should be created.");

	assert_ne!(&*created.id, "googleApi");
	assert_eq!(created.values["googleApiKey"], REDACTED_PLACEHOLDER);

	let json = serde_json::to_string(&service.redacted(&created.id).await.expect("Read-back."))
		.expect("Redacted credential should serialize.");

	assert!(!json.contains("ya29.secret"));
	assert!(json.contains(REDACTED_PLACEHOLDER));

	let raw = store
		.fetch(&created.id)
		.await
		.expect("Fetching should succeed.")
		.expect("Credential should be stored.");

	assert_eq!(raw.values["googleApiKey"].expose(), "ya29.secret");
}

#[tokio::test]
async fn placeholder_updates_keep_the_stored_secret() {
	let (service, store) = build_service();
	let created = service
		.create("googleApi", "Workspace", values(&[("googleApiKey", "ya29.first")]))
		.await
		.expect("Credential should be created.");
	let renamed = service
		.update(
			&created.id,
			Some("Renamed".into()),
			values(&[("googleApiKey", REDACTED_PLACEHOLDER)]),
		)
		.await
		.expect("Placeholder update should succeed.");

	assert_eq!(renamed.display_name, "Renamed");

	assert_eq!(stored_secret(&store, &created.id).await, "ya29.first");

	service
		.update(&created.id, None, values(&[("googleApiKey", "ya29.second")]))
		.await
		.expect("Replacing the secret should succeed.");

	assert_eq!(stored_secret(&store, &created.id).await, "ya29.second");

	let err = service
		.update(&created.id, None, values(&[("googleApiKey", "")]))
		.await
		.expect_err("An empty secret must fail validation.");

	assert!(matches!(err, Error::InvalidValueForType(_)));
	assert_eq!(stored_secret(&store, &created.id).await, "ya29.second");
}

#[tokio::test]
async fn oauth_inputs_are_satisfied_by_a_succeeded_session() -> Result<()> {
	let (service, store) = build_service();
	let channel = build_test_channel();
	let opener = MockOpener::default();
	let created = service.create("googleApi", "Workspace", values(&[])).await?;

	assert!(created.values.is_empty());
	assert!(created.authorized.is_empty());
	assert!(created.awaiting_authorization.contains("googleApiKey"));

	let failed =
		channel.authorize(&google_api_credential(), &test_authorization_endpoint(), &opener)?;
	let failure = channel.deliver(
		TEST_PLATFORM_ORIGIN,
		&CompletionMessage::new(failed.session.id.clone(), CallbackStatus::Failure),
	)?;
	let err = service
		.mark_authorized(&created.id, "googleApiKey", &failure, Some("ya29.denied".into()))
		.await
		.expect_err("Failed sessions must not mark the credential.");

	assert!(matches!(err, Error::AuthorizationFailed));
	assert!(service.redacted(&created.id).await?.awaiting_authorization.contains("googleApiKey"));

	let pending =
		channel.authorize(&google_api_credential(), &test_authorization_endpoint(), &opener)?;
	let success = channel.deliver(
		TEST_PLATFORM_ORIGIN,
		&CompletionMessage::new(pending.session.id.clone(), CallbackStatus::Success),
	)?;
	let marked = service
		.mark_authorized(&created.id, "googleApiKey", &success, Some("ya29.obtained".into()))
		.await?;

	assert!(marked.authorized.contains("googleApiKey"));
	assert!(marked.awaiting_authorization.is_empty());
	assert_eq!(marked.values["googleApiKey"], REDACTED_PLACEHOLDER);
	assert_eq!(stored_secret(&store, &created.id).await, "ya29.obtained");
	assert!(matches!(
		service.mark_authorized(&created.id, "otherKey", &success, None).await,
		Err(Error::UnknownInput { .. })
	));

	let renamed = service.update(&created.id, Some("Renamed".into()), values(&[])).await?;

	assert!(renamed.authorized.contains("googleApiKey"));
	assert!(renamed.awaiting_authorization.is_empty());

	service.delete(&created.id).await?;

	assert!(matches!(
		service.redacted(&created.id).await,
		Err(Error::NotFound { what: "credential", .. })
	));

	Ok(())
}
