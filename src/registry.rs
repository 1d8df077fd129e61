//! Descriptor registry enforcing identity and versioning invariants.
//!
//! Every `(kind, name, version)` triple is unique for the registry's lifetime and a name belongs
//! to exactly one kind. Writers are serialized through a single write lock; reads take the
//! shared lock and never observe a partially applied registration.

mod manifest;

pub use manifest::*;

// self
use crate::{
	_prelude::*,
	descriptor::{Descriptor, DescriptorKind, Version},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Process-wide store of node and credential descriptors.
#[derive(Debug, Default)]
pub struct Registry {
	state: RwLock<RegistryState>,
}
impl Registry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Validates and stores a descriptor.
	///
	/// Fails with [`Error::InvalidDescriptor`], [`Error::DuplicateDescriptor`], or
	/// [`Error::NameConflict`]; on failure the registry is left untouched.
	pub fn register(&self, descriptor: impl Into<Descriptor>) -> Result<Arc<Descriptor>> {
		const KIND: OpKind = OpKind::Register;

		let _span = OpSpan::new(KIND, "register").entered();

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = self.state.write().insert(descriptor.into());

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	/// Decodes a plugin manifest and registers every entry atomically.
	///
	/// Either all descriptors become visible or none do.
	pub fn load_manifest(&self, json: &str) -> Result<Vec<Arc<Descriptor>>> {
		const KIND: OpKind = OpKind::LoadManifest;

		let _span = OpSpan::new(KIND, "load_manifest").entered();

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = PluginManifest::from_json(json).map_err(Error::from).and_then(|manifest| {
			let mut state = self.state.write();
			let mut staged = state.clone();
			let registered = manifest
				.into_descriptors()
				.map(|descriptor| staged.insert(descriptor))
				.collect::<Result<Vec<_>>>()?;

			*state = staged;

			Ok(registered)
		});

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	/// Looks up a descriptor; without a version the highest registered version is returned.
	///
	/// A pinned version resolves to exactly that version or [`Error::NotFound`].
	pub fn lookup(
		&self,
		kind: DescriptorKind,
		name: &str,
		version: Option<Version>,
	) -> Result<Arc<Descriptor>> {
		let state = self.state.read();
		let entry = state.entry(kind, name).ok_or_else(|| not_found(kind, name, version))?;
		let found = match version {
			Some(version) => entry.versions.get(&version),
			None => entry.versions.values().next_back(),
		};

		found.cloned().ok_or_else(|| not_found(kind, name, version))
	}

	/// Lists the latest version of every descriptor of `kind`, ordered by label then name.
	///
	/// The category filter is an exact match; credentials never match a category.
	pub fn list(&self, kind: DescriptorKind, category: Option<&str>) -> Vec<Arc<Descriptor>> {
		self.collect_latest(|descriptor| {
			descriptor.kind() == kind
				&& category.is_none_or(|category| descriptor.category() == Some(category))
		})
	}

	/// Lists the latest node descriptors declaring the capability `tag`.
	pub fn with_capability(&self, tag: &str) -> Vec<Arc<Descriptor>> {
		self.collect_latest(|descriptor| {
			descriptor.as_node().is_some_and(|node| node.base_classes.contains(tag))
		})
	}

	/// Registered versions of `name`, ascending; empty when the name is unknown.
	pub fn versions(&self, kind: DescriptorKind, name: &str) -> Vec<Version> {
		self.state
			.read()
			.entry(kind, name)
			.map(|entry| entry.versions.keys().copied().collect())
			.unwrap_or_default()
	}

	/// Total number of registered `(kind, name, version)` triples.
	pub fn len(&self) -> usize {
		self.state.read().entries.values().map(|entry| entry.versions.len()).sum()
	}

	/// Returns true when nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.state.read().entries.is_empty()
	}

	fn collect_latest<F>(&self, keep: F) -> Vec<Arc<Descriptor>>
	where
		F: Fn(&Descriptor) -> bool,
	{
		let state = self.state.read();
		let mut latest = state
			.entries
			.values()
			.filter_map(|entry| entry.versions.values().next_back())
			.filter(|descriptor| keep(descriptor))
			.cloned()
			.collect::<Vec<_>>();

		latest.sort_by(|a, b| a.label().cmp(b.label()).then_with(|| a.name().cmp(b.name())));

		latest
	}
}

#[derive(Clone, Debug, Default)]
struct RegistryState {
	entries: HashMap<String, NameEntry>,
}
impl RegistryState {
	fn entry(&self, kind: DescriptorKind, name: &str) -> Option<&NameEntry> {
		self.entries.get(name).filter(|entry| entry.kind == kind)
	}

	fn insert(&mut self, descriptor: Descriptor) -> Result<Arc<Descriptor>> {
		descriptor.validate()?;

		let kind = descriptor.kind();
		let version = descriptor.version();

		if let Some(entry) = self.entries.get(descriptor.name()) {
			if entry.kind != kind {
				return Err(Error::NameConflict {
					name: descriptor.name().to_owned(),
					existing: entry.kind,
				});
			}
			if entry.versions.contains_key(&version) {
				return Err(Error::DuplicateDescriptor {
					kind,
					name: descriptor.name().to_owned(),
					version,
				});
			}
		}

		let descriptor = Arc::new(descriptor);

		self.entries
			.entry(descriptor.name().to_owned())
			.or_insert_with(|| NameEntry { kind, versions: BTreeMap::new() })
			.versions
			.insert(version, descriptor.clone());

		Ok(descriptor)
	}
}

#[derive(Clone, Debug)]
struct NameEntry {
	kind: DescriptorKind,
	versions: BTreeMap<Version, Arc<Descriptor>>,
}

fn not_found(kind: DescriptorKind, name: &str, version: Option<Version>) -> Error {
	let key = match version {
		Some(version) => format!("{name}@{version}"),
		None => name.to_owned(),
	};

	Error::NotFound { what: kind.as_str(), key }
}
