//! Node and credential descriptors: the typed contract every plugin registers with.
//!
//! Descriptors are immutable plain records. They are assembled through validating builders
//! (see [`builder`]) and validated again on registration, so records decoded from manifests or
//! mutated through public fields can never reach the registry in a malformed state.

/// Builder API for assembling descriptors.
pub mod builder;
/// Capability tag sets declared by nodes.
pub mod capability;

pub use builder::*;
pub use capability::*;

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserializer, de::Error as DeError};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, schema::InputParam};

/// Which half of the plugin contract a descriptor belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
	/// Workflow step.
	Node,
	/// Authentication material.
	Credential,
}
impl DescriptorKind {
	/// Returns a stable label suitable for logs and error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			DescriptorKind::Node => "node",
			DescriptorKind::Credential => "credential",
		}
	}
}
impl Display for DescriptorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Monotonically increasing schema version of a descriptor.
///
/// The wire form is a JSON number; integral floats such as `2.0` are accepted. Zero is
/// representable so validation can report it instead of failing the decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Version(u32);
impl Version {
	/// Wraps a raw version number.
	pub const fn new(value: u32) -> Self {
		Self(value)
	}

	/// Returns the raw version number.
	pub const fn get(self) -> u32 {
		self.0
	}

	/// Returns true for versions accepted by the registry.
	pub const fn is_positive(self) -> bool {
		self.0 > 0
	}
}
impl From<u32> for Version {
	fn from(value: u32) -> Self {
		Self(value)
	}
}
impl Display for Version {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}", self.0)
	}
}
impl<'de> Deserialize<'de> for Version {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let number = serde_json::Number::deserialize(deserializer)?;

		if let Some(value) = number.as_u64() {
			return u32::try_from(value)
				.map(Self)
				.map_err(|_| DeError::custom("version exceeds the supported range"));
		}

		match number.as_f64() {
			Some(value) if value >= 0. && value.fract() == 0. && value <= f64::from(u32::MAX) =>
				Ok(Self(value as u32)),
			_ => Err(DeError::custom("version must be a non-negative whole number")),
		}
	}
}

/// Declarative description of one workflow step type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
	/// Display text.
	pub label: String,
	/// Registry key, stable across versions.
	pub name: String,
	/// Schema version.
	pub version: Version,
	/// Optional long description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Presentation grouping.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	/// Capability tags used for compatibility checks.
	#[serde(default)]
	pub base_classes: CapabilitySet,
	/// Ordered configurable inputs.
	#[serde(default)]
	pub inputs: Vec<InputParam>,
}
impl NodeDescriptor {
	/// Creates a new builder for the provided label and name.
	pub fn builder(label: impl Into<String>, name: impl Into<String>) -> NodeDescriptorBuilder {
		NodeDescriptorBuilder::new(label, name)
	}

	/// Returns true if the node declares every tag in `required`.
	pub fn satisfies(&self, required: &CapabilitySet) -> bool {
		self.base_classes.is_superset(required)
	}
}

/// Declarative description of one kind of authentication material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDescriptor {
	/// Display text.
	pub label: String,
	/// Registry key, e.g. `googleApi`.
	pub name: String,
	/// Schema version.
	pub version: Version,
	/// Optional long description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Ordered configurable inputs.
	#[serde(default)]
	pub inputs: Vec<InputParam>,
}
impl CredentialDescriptor {
	/// Creates a new builder for the provided label and name.
	pub fn builder(
		label: impl Into<String>,
		name: impl Into<String>,
	) -> CredentialDescriptorBuilder {
		CredentialDescriptorBuilder::new(label, name)
	}

	/// Returns true when at least one input is completed through the OAuth channel.
	pub fn requires_oauth(&self) -> bool {
		self.inputs.iter().any(|input| {
			input.input_type().is_some_and(|kind| kind == crate::schema::InputType::OAuth2Secret)
		})
	}
}

/// Either half of the plugin contract, as stored by the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Descriptor {
	/// Workflow step descriptor.
	Node(NodeDescriptor),
	/// Credential descriptor.
	Credential(CredentialDescriptor),
}
impl Descriptor {
	/// Descriptor kind.
	pub fn kind(&self) -> DescriptorKind {
		match self {
			Descriptor::Node(_) => DescriptorKind::Node,
			Descriptor::Credential(_) => DescriptorKind::Credential,
		}
	}

	/// Display text.
	pub fn label(&self) -> &str {
		match self {
			Descriptor::Node(node) => &node.label,
			Descriptor::Credential(credential) => &credential.label,
		}
	}

	/// Registry key.
	pub fn name(&self) -> &str {
		match self {
			Descriptor::Node(node) => &node.name,
			Descriptor::Credential(credential) => &credential.name,
		}
	}

	/// Schema version.
	pub fn version(&self) -> Version {
		match self {
			Descriptor::Node(node) => node.version,
			Descriptor::Credential(credential) => credential.version,
		}
	}

	/// Optional long description.
	pub fn description(&self) -> Option<&str> {
		match self {
			Descriptor::Node(node) => node.description.as_deref(),
			Descriptor::Credential(credential) => credential.description.as_deref(),
		}
	}

	/// Presentation grouping; credentials never carry one.
	pub fn category(&self) -> Option<&str> {
		match self {
			Descriptor::Node(node) => node.category.as_deref(),
			Descriptor::Credential(_) => None,
		}
	}

	/// Ordered configurable inputs.
	pub fn inputs(&self) -> &[InputParam] {
		match self {
			Descriptor::Node(node) => &node.inputs,
			Descriptor::Credential(credential) => &credential.inputs,
		}
	}

	/// Finds an input by name.
	pub fn input(&self, name: &str) -> Option<&InputParam> {
		self.inputs().iter().find(|input| input.name == name)
	}

	/// Node view, when this is a node descriptor.
	pub fn as_node(&self) -> Option<&NodeDescriptor> {
		match self {
			Descriptor::Node(node) => Some(node),
			Descriptor::Credential(_) => None,
		}
	}

	/// Credential view, when this is a credential descriptor.
	pub fn as_credential(&self) -> Option<&CredentialDescriptor> {
		match self {
			Descriptor::Credential(credential) => Some(credential),
			Descriptor::Node(_) => None,
		}
	}

	/// Stable content digest (base64url, no padding, SHA-256) for render caches.
	///
	/// Covers identity, version, category, capability tags, and the input schema; display-only
	/// help text is excluded.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		feed(&mut hasher, self.kind().as_str());
		feed(&mut hasher, self.name());
		feed(&mut hasher, self.label());
		feed(&mut hasher, &self.version().to_string());
		feed(&mut hasher, self.category().unwrap_or_default());

		if let Descriptor::Node(node) = self {
			for tag in &node.base_classes {
				feed(&mut hasher, tag);
			}
		}
		for input in self.inputs() {
			feed(&mut hasher, &input.name);
			feed(&mut hasher, &input.kind);
			feed(&mut hasher, if input.optional { "optional" } else { "required" });
		}

		URL_SAFE_NO_PAD.encode(hasher.finalize())
	}
}
impl From<NodeDescriptor> for Descriptor {
	fn from(value: NodeDescriptor) -> Self {
		Descriptor::Node(value)
	}
}
impl From<CredentialDescriptor> for Descriptor {
	fn from(value: CredentialDescriptor) -> Self {
		Descriptor::Credential(value)
	}
}

fn feed(hasher: &mut Sha256, field: &str) {
	hasher.update((field.len() as u64).to_be_bytes());
	hasher.update(field.as_bytes());
}
