// self
use crate::{
	_prelude::*,
	descriptor::{
		CapabilityError, CapabilitySet, CredentialDescriptor, Descriptor, NodeDescriptor, Version,
	},
	schema::{self, InputParam},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DescriptorError {
	/// Label is empty or whitespace.
	#[error("Descriptor label cannot be empty.")]
	EmptyLabel,
	/// Name is empty or whitespace.
	#[error("Descriptor name cannot be empty.")]
	EmptyName,
	/// Version must be greater than zero.
	#[error("Descriptor `{name}` must declare a positive version.")]
	NonPositiveVersion {
		/// Descriptor name.
		name: String,
	},
	/// An input has an empty name.
	#[error("Input #{index} of descriptor `{name}` has an empty name.")]
	EmptyInputName {
		/// Descriptor name.
		name: String,
		/// Zero-based input position.
		index: usize,
	},
	/// Two inputs share a name.
	#[error("Input `{input}` is declared more than once.")]
	DuplicateInputName {
		/// Repeated input name.
		input: String,
	},
	/// An input uses a type tag outside the known enumeration.
	#[error("Input `{input}` uses unknown type `{tag}`.")]
	UnknownInputType {
		/// Input name.
		input: String,
		/// Offending tag.
		tag: String,
	},
	/// Capability tags failed validation.
	#[error(transparent)]
	InvalidCapability(#[from] CapabilityError),
}

/// Builder for [`NodeDescriptor`] values.
#[derive(Debug)]
pub struct NodeDescriptorBuilder {
	/// Display text.
	pub label: String,
	/// Registry key.
	pub name: String,
	/// Schema version (defaults to 1).
	pub version: Version,
	/// Optional long description.
	pub description: Option<String>,
	/// Optional presentation grouping.
	pub category: Option<String>,
	/// Raw capability tags, normalized on build.
	pub base_classes: Vec<String>,
	/// Ordered inputs.
	pub inputs: Vec<InputParam>,
}
impl NodeDescriptorBuilder {
	/// Creates a new builder seeded with the provided label and name.
	pub fn new(label: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			name: name.into(),
			version: Version::new(1),
			description: None,
			category: None,
			base_classes: Vec::new(),
			inputs: Vec::new(),
		}
	}

	/// Sets the schema version.
	pub fn version(mut self, version: impl Into<Version>) -> Self {
		self.version = version.into();

		self
	}

	/// Sets the long description.
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}

	/// Sets the presentation category.
	pub fn category(mut self, category: impl Into<String>) -> Self {
		self.category = Some(category.into());

		self
	}

	/// Adds capability tags.
	pub fn base_classes<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.base_classes.extend(tags.into_iter().map(Into::into));

		self
	}

	/// Appends a single input.
	pub fn input(mut self, input: InputParam) -> Self {
		self.inputs.push(input);

		self
	}

	/// Appends multiple inputs in order.
	pub fn inputs<I>(mut self, inputs: I) -> Self
	where
		I: IntoIterator<Item = InputParam>,
	{
		self.inputs.extend(inputs);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<NodeDescriptor, DescriptorError> {
		let descriptor = NodeDescriptor {
			label: self.label,
			name: self.name,
			version: self.version,
			description: self.description,
			category: self.category,
			base_classes: CapabilitySet::new(self.base_classes)?,
			inputs: self.inputs,
		};

		validate_parts(&descriptor.label, &descriptor.name, descriptor.version, &descriptor.inputs)?;

		Ok(descriptor)
	}
}

/// Builder for [`CredentialDescriptor`] values.
#[derive(Debug)]
pub struct CredentialDescriptorBuilder {
	/// Display text.
	pub label: String,
	/// Registry key.
	pub name: String,
	/// Schema version (defaults to 1).
	pub version: Version,
	/// Optional long description.
	pub description: Option<String>,
	/// Ordered inputs.
	pub inputs: Vec<InputParam>,
}
impl CredentialDescriptorBuilder {
	/// Creates a new builder seeded with the provided label and name.
	pub fn new(label: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			name: name.into(),
			version: Version::new(1),
			description: None,
			inputs: Vec::new(),
		}
	}

	/// Sets the schema version.
	pub fn version(mut self, version: impl Into<Version>) -> Self {
		self.version = version.into();

		self
	}

	/// Sets the long description.
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}

	/// Appends a single input.
	pub fn input(mut self, input: InputParam) -> Self {
		self.inputs.push(input);

		self
	}

	/// Appends multiple inputs in order.
	pub fn inputs<I>(mut self, inputs: I) -> Self
	where
		I: IntoIterator<Item = InputParam>,
	{
		self.inputs.extend(inputs);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<CredentialDescriptor, DescriptorError> {
		let descriptor = CredentialDescriptor {
			label: self.label,
			name: self.name,
			version: self.version,
			description: self.description,
			inputs: self.inputs,
		};

		validate_parts(&descriptor.label, &descriptor.name, descriptor.version, &descriptor.inputs)?;

		Ok(descriptor)
	}
}

impl Descriptor {
	/// Validates the invariants every registered descriptor must hold.
	pub fn validate(&self) -> Result<(), DescriptorError> {
		validate_parts(self.label(), self.name(), self.version(), self.inputs())
	}
}

fn validate_parts(
	label: &str,
	name: &str,
	version: Version,
	inputs: &[InputParam],
) -> Result<(), DescriptorError> {
	if label.trim().is_empty() {
		return Err(DescriptorError::EmptyLabel);
	}
	if name.trim().is_empty() {
		return Err(DescriptorError::EmptyName);
	}
	if !version.is_positive() {
		return Err(DescriptorError::NonPositiveVersion { name: name.to_owned() });
	}

	let mut seen = BTreeSet::new();

	for (index, input) in inputs.iter().enumerate() {
		if input.name.trim().is_empty() {
			return Err(DescriptorError::EmptyInputName { name: name.to_owned(), index });
		}
		if !seen.insert(input.name.as_str()) {
			return Err(DescriptorError::DuplicateInputName { input: input.name.clone() });
		}
		if !schema::is_known_type(&input.kind) {
			return Err(DescriptorError::UnknownInputType {
				input: input.name.clone(),
				tag: input.kind.clone(),
			});
		}
	}

	Ok(())
}
