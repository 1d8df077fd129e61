//! Configured credentials: submitted-value validation, the redaction boundary, and OAuth marking.
//!
//! Secret values never leave [`CredentialService`] in cleartext. Read-backs substitute the
//! placeholder carried by the service's [`Redaction`], and an update that echoes the placeholder
//! keeps the stored secret.
//!
//! `oauth2Secret` inputs are not typed by the user. A credential may be created without them and
//! reports them in [`RedactedCredential::awaiting_authorization`] until
//! [`CredentialService::mark_authorized`] records a succeeded authorization session.

// self
use crate::{
	_prelude::*,
	auth::{CredentialId, SecretValue},
	descriptor::{CredentialDescriptor, DescriptorKind, Version},
	obs::{self, OpKind, OpOutcome, OpSpan},
	oauth::Resolution,
	registry::Registry,
	schema::{InputParam, InputType},
	store::CredentialStore,
};

/// Platform-wide placeholder returned in place of secret values.
pub const REDACTED_PLACEHOLDER: &str = "_REDACTED_SECRET_7f1c9a4e";

/// Submitted credential values keyed by input name.
pub type CredentialValues = BTreeMap<String, String>;

/// Placeholder substitution applied at the serialization boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redaction {
	placeholder: String,
}
impl Redaction {
	/// Uses a custom placeholder.
	pub fn new(placeholder: impl Into<String>) -> Self {
		Self { placeholder: placeholder.into() }
	}

	/// Placeholder string.
	pub fn placeholder(&self) -> &str {
		&self.placeholder
	}

	/// Returns true when `value` is exactly the placeholder.
	pub fn is_placeholder(&self, value: &str) -> bool {
		value == self.placeholder
	}

	/// Produces the read-back view of `credential`.
	///
	/// Inputs the descriptor marks secret, and inputs it no longer declares, are replaced by the
	/// placeholder.
	pub fn apply(
		&self,
		descriptor: &CredentialDescriptor,
		credential: &StoredCredential,
	) -> RedactedCredential {
		let values = credential
			.values
			.iter()
			.map(|(name, value)| {
				let shown = match find_input(descriptor, name) {
					Some(input) if !input.is_secret() => value.expose().to_owned(),
					_ => self.placeholder.clone(),
				};

				(name.clone(), shown)
			})
			.collect();

		let awaiting_authorization = descriptor
			.inputs
			.iter()
			.filter(|input| {
				!input.optional
					&& input.input_type() == Some(InputType::OAuth2Secret)
					&& !credential.values.contains_key(&input.name)
					&& !credential.authorized.contains_key(&input.name)
			})
			.map(|input| input.name.clone())
			.collect();

		RedactedCredential {
			id: credential.id.clone(),
			credential_name: credential.credential_name.clone(),
			credential_version: credential.credential_version,
			display_name: credential.display_name.clone(),
			values,
			authorized: credential.authorized.keys().cloned().collect(),
			awaiting_authorization,
			created_at: credential.created_at,
			updated_at: credential.updated_at,
		}
	}
}
impl Default for Redaction {
	fn default() -> Self {
		Self::new(REDACTED_PLACEHOLDER)
	}
}

/// Persisted credential configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
	/// Stable opaque identifier, distinct from the descriptor name.
	pub id: CredentialId,
	/// Credential descriptor this configuration satisfies.
	pub credential_name: String,
	/// Descriptor version the values were validated against.
	pub credential_version: Version,
	/// User-facing name of this configuration.
	pub display_name: String,
	/// Submitted values keyed by input name.
	pub values: BTreeMap<String, SecretValue>,
	/// `oauth2Secret` inputs completed through an authorization session, with the instant.
	#[serde(default)]
	pub authorized: BTreeMap<String, OffsetDateTime>,
	/// Creation instant.
	pub created_at: OffsetDateTime,
	/// Last modification instant.
	pub updated_at: OffsetDateTime,
}

/// Read-back view safe to hand to a rendering layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactedCredential {
	/// Stable opaque identifier.
	pub id: CredentialId,
	/// Credential descriptor name.
	pub credential_name: String,
	/// Descriptor version the values were validated against.
	pub credential_version: Version,
	/// User-facing name.
	pub display_name: String,
	/// Values with every secret replaced by the placeholder.
	pub values: BTreeMap<String, String>,
	/// Inputs completed through an authorization session.
	pub authorized: BTreeSet<String>,
	/// Required `oauth2Secret` inputs still waiting for an authorization session.
	pub awaiting_authorization: BTreeSet<String>,
	/// Creation instant.
	pub created_at: OffsetDateTime,
	/// Last modification instant.
	pub updated_at: OffsetDateTime,
}

/// Validates, persists, and redacts credential configurations.
pub struct CredentialService {
	registry: Arc<Registry>,
	store: Arc<dyn CredentialStore>,
	redaction: Redaction,
}
impl CredentialService {
	/// Creates a service over `registry` and `store` using `redaction` for every read-back.
	pub fn new(
		registry: Arc<Registry>,
		store: Arc<dyn CredentialStore>,
		redaction: Redaction,
	) -> Self {
		Self { registry, store, redaction }
	}

	/// Redaction applied to read-backs.
	pub fn redaction(&self) -> &Redaction {
		&self.redaction
	}

	/// Checks submitted values against the descriptor's inputs.
	///
	/// Undeclared inputs fail with [`Error::UnknownInput`], absent non-optional inputs with
	/// [`Error::MissingRequiredInput`], and values breaking their type rule with
	/// [`Error::InvalidValueForType`]. An absent `oauth2Secret` input is left to
	/// [`mark_authorized`](Self::mark_authorized).
	pub fn validate(descriptor: &CredentialDescriptor, values: &CredentialValues) -> Result<()> {
		if let Some(input) = values.keys().find(|name| find_input(descriptor, name).is_none()) {
			return Err(Error::UnknownInput {
				descriptor: descriptor.name.clone(),
				input: input.clone(),
			});
		}

		for input in &descriptor.inputs {
			match values.get(&input.name) {
				Some(value) => input.validate(value)?,
				None if input.optional || input.input_type() == Some(InputType::OAuth2Secret) => (),
				None => return Err(Error::MissingRequiredInput { input: input.name.clone() }),
			}
		}

		Ok(())
	}

	/// Validates and stores a new configuration of the latest `credential_name` descriptor.
	pub async fn create(
		&self,
		credential_name: &str,
		display_name: impl Into<String>,
		values: CredentialValues,
	) -> Result<RedactedCredential> {
		self.create_at(credential_name, display_name, values, OffsetDateTime::now_utc()).await
	}

	/// Same as [`create`](Self::create) with an explicit creation instant.
	pub async fn create_at(
		&self,
		credential_name: &str,
		display_name: impl Into<String>,
		values: CredentialValues,
		now: OffsetDateTime,
	) -> Result<RedactedCredential> {
		let display_name = display_name.into();
		let span = OpSpan::new(OpKind::Credential, "create");

		span.instrument(observed(async move {
			let descriptor = self.descriptor(credential_name, None)?;

			Self::validate(&descriptor, &values)?;

			let credential = StoredCredential {
				id: CredentialId::generate(),
				credential_name: descriptor.name.clone(),
				credential_version: descriptor.version,
				display_name,
				values: values.into_iter().map(|(k, v)| (k, SecretValue::new(v))).collect(),
				authorized: BTreeMap::new(),
				created_at: now,
				updated_at: now,
			};

			self.store.save(credential.clone()).await?;

			Ok(self.redaction.apply(&descriptor, &credential))
		}))
		.await
	}

	/// Returns the redacted read-back of a stored credential.
	pub async fn redacted(&self, id: &CredentialId) -> Result<RedactedCredential> {
		let credential = self.fetch(id).await?;
		let descriptor =
			self.descriptor(&credential.credential_name, Some(credential.credential_version))?;

		Ok(self.redaction.apply(&descriptor, &credential))
	}

	/// Lists redacted read-backs of every configuration of `credential_name`.
	pub async fn list(&self, credential_name: &str) -> Result<Vec<RedactedCredential>> {
		self.store
			.list_for(credential_name)
			.await?
			.iter()
			.map(|credential| -> Result<RedactedCredential> {
				let descriptor = self
					.descriptor(&credential.credential_name, Some(credential.credential_version))?;

				Ok(self.redaction.apply(&descriptor, credential))
			})
			.collect()
	}

	/// Replaces a credential's values.
	///
	/// A submitted value equal to the placeholder keeps the stored value for that input; an
	/// input omitted from `values` is cleared. Authorization markers are dropped for inputs that
	/// receive a newly typed value.
	pub async fn update(
		&self,
		id: &CredentialId,
		display_name: Option<String>,
		values: CredentialValues,
	) -> Result<RedactedCredential> {
		self.update_at(id, display_name, values, OffsetDateTime::now_utc()).await
	}

	/// Same as [`update`](Self::update) with an explicit modification instant.
	pub async fn update_at(
		&self,
		id: &CredentialId,
		display_name: Option<String>,
		values: CredentialValues,
		now: OffsetDateTime,
	) -> Result<RedactedCredential> {
		let span = OpSpan::new(OpKind::Credential, "update");

		span.instrument(observed(async move {
			let mut credential = self.fetch(id).await?;
			let descriptor = self.descriptor(&credential.credential_name, None)?;
			let mut retyped = BTreeSet::new();
			let mut merged = BTreeMap::new();

			for (name, value) in values {
				if self.redaction.is_placeholder(&value) {
					if let Some(stored) = credential.values.remove(&name) {
						merged.insert(name, stored);
					}
				} else {
					retyped.insert(name.clone());
					merged.insert(name, SecretValue::new(value));
				}
			}

			let plain = merged
				.iter()
				.map(|(name, value)| (name.clone(), value.expose().to_owned()))
				.collect::<CredentialValues>();

			Self::validate(&descriptor, &plain)?;

			credential.values = merged;
			credential.authorized.retain(|name, _| {
				!retyped.contains(name) && find_input(&descriptor, name).is_some()
			});
			credential.credential_version = descriptor.version;
			credential.updated_at = now;

			if let Some(display_name) = display_name {
				credential.display_name = display_name;
			}

			self.store.save(credential.clone()).await?;

			Ok(self.redaction.apply(&descriptor, &credential))
		}))
		.await
	}

	/// Records that `input` was completed by the authorization session in `resolution`.
	///
	/// Only a `Succeeded` session for the same credential descriptor is accepted; failed and
	/// abandoned sessions surface their distinct errors. `obtained` is the secret the host got
	/// from the provider for this session, if any; it replaces the stored value for `input`.
	pub async fn mark_authorized(
		&self,
		id: &CredentialId,
		input: &str,
		resolution: &Resolution,
		obtained: Option<String>,
	) -> Result<RedactedCredential> {
		let span =
			OpSpan::new(OpKind::Credential, "mark_authorized").with_session(&resolution.session.id);

		span.instrument(observed(async move {
			resolution.outcome.into_result()?;

			let mut credential = self.fetch(id).await?;

			if resolution.session.credential_name != credential.credential_name {
				return Err(Error::NotFound {
					what: "authorization session",
					key: resolution.session.id.to_string(),
				});
			}

			let descriptor = self
				.descriptor(&credential.credential_name, Some(credential.credential_version))?;

			let param = find_input(&descriptor, input).ok_or_else(|| Error::UnknownInput {
				descriptor: descriptor.name.clone(),
				input: input.into(),
			})?;

			if param.input_type() != Some(InputType::OAuth2Secret) {
				return Err(Error::NotFound { what: "oauth2Secret", key: input.into() });
			}
			if let Some(value) = obtained {
				param.validate(&value)?;
				credential.values.insert(input.to_owned(), SecretValue::new(value));
			}

			let at = resolution.session.resolved_at().unwrap_or(resolution.session.created_at);

			credential.authorized.insert(input.to_owned(), at);
			credential.updated_at = at;

			self.store.save(credential.clone()).await?;

			Ok(self.redaction.apply(&descriptor, &credential))
		}))
		.await
	}

	/// Deletes a stored credential.
	pub async fn delete(&self, id: &CredentialId) -> Result<()> {
		if self.store.delete(id).await? {
			Ok(())
		} else {
			Err(Error::NotFound { what: "credential", key: id.to_string() })
		}
	}

	async fn fetch(&self, id: &CredentialId) -> Result<StoredCredential> {
		self.store
			.fetch(id)
			.await?
			.ok_or_else(|| Error::NotFound { what: "credential", key: id.to_string() })
	}

	fn descriptor(
		&self,
		credential_name: &str,
		version: Option<Version>,
	) -> Result<CredentialDescriptor> {
		let descriptor =
			self.registry.lookup(DescriptorKind::Credential, credential_name, version)?;

		descriptor.as_credential().cloned().ok_or_else(|| Error::NotFound {
			what: "credential descriptor",
			key: credential_name.into(),
		})
	}
}
impl Debug for CredentialService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialService").field("redaction", &self.redaction).finish()
	}
}

fn find_input<'a>(descriptor: &'a CredentialDescriptor, name: &str) -> Option<&'a InputParam> {
	descriptor.inputs.iter().find(|input| input.name == name)
}

async fn observed<T, Fut>(fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	obs::record_op_outcome(OpKind::Credential, OpOutcome::Attempt);

	let result = fut.await;

	obs::record_op_outcome(OpKind::Credential, OpOutcome::of(&result));

	result
}
