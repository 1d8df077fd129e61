//! Capability tags (`baseClasses`) declared by node descriptors.

// std
use std::slice::Iter;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Errors emitted when validating capability tags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CapabilityError {
	/// Empty tags are not allowed.
	#[error("Capability tags cannot be empty.")]
	Empty,
	/// Tags cannot contain whitespace.
	#[error("Capability tag contains whitespace: {tag}.")]
	ContainsWhitespace {
		/// The offending tag.
		tag: String,
	},
}

/// Normalized set of capability tags compared by set intersection.
///
/// Tags are deduplicated and sorted so equality and serialization stay deterministic; the
/// execution engine checks compatibility with [`intersects`](Self::intersects) or
/// [`is_superset`](Self::is_superset), never through a type hierarchy.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(Arc<[String]>);
impl CapabilitySet {
	/// Creates a normalized tag set from any iterator.
	pub fn new<I, S>(tags: I) -> Result<Self, CapabilityError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut set = BTreeSet::new();

		for tag in tags {
			let owned: String = tag.into();

			if owned.is_empty() {
				return Err(CapabilityError::Empty);
			}
			if owned.chars().any(char::is_whitespace) {
				return Err(CapabilityError::ContainsWhitespace { tag: owned });
			}

			set.insert(owned);
		}

		Ok(Self(Arc::from(set.into_iter().collect::<Vec<_>>())))
	}

	/// Number of distinct tags.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no tags are declared.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains the provided tag.
	pub fn contains(&self, tag: &str) -> bool {
		self.0.binary_search_by(|candidate| candidate.as_str().cmp(tag)).is_ok()
	}

	/// Returns true if at least one tag is shared with `other`.
	pub fn intersects(&self, other: &CapabilitySet) -> bool {
		other.iter().any(|tag| self.contains(tag))
	}

	/// Tags present in both sets, sorted.
	pub fn intersection<'a>(&'a self, other: &'a CapabilitySet) -> impl Iterator<Item = &'a str> {
		self.iter().filter(|tag| other.contains(tag))
	}

	/// Returns true if every tag of `required` is present.
	pub fn is_superset(&self, required: &CapabilitySet) -> bool {
		required.iter().all(|tag| self.contains(tag))
	}

	/// Iterator over the sorted tags.
	pub fn iter(&self) -> CapabilityIter<'_> {
		CapabilityIter { inner: self.0.iter() }
	}

	/// Returns the underlying slice of tags.
	pub fn as_slice(&self) -> &[String] {
		&self.0
	}
}
impl Debug for CapabilitySet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("CapabilitySet").field(&self.0).finish()
	}
}
impl Display for CapabilitySet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0.join(","))
	}
}
impl<'a> IntoIterator for &'a CapabilitySet {
	type IntoIter = CapabilityIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
impl Serialize for CapabilitySet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.0.len()))?;

		for tag in self.0.iter() {
			seq.serialize_element(tag)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for CapabilitySet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		CapabilitySet::new(values).map_err(DeError::custom)
	}
}

/// Iterator over capability tags.
pub struct CapabilityIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for CapabilityIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn tags_normalize_and_compare_by_set() {
		let lhs = CapabilitySet::new(["Runnable", "BaseChatModel", "Runnable"])
			.expect("Left-hand tag set should be valid.");
		let rhs = CapabilitySet::new(["BaseChatModel", "Runnable"])
			.expect("Right-hand tag set should be valid.");

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.to_string(), "BaseChatModel,Runnable");
	}

	#[test]
	fn intersection_drives_compatibility() {
		let chat = CapabilitySet::new(["BaseChatModel", "BaseLanguageModel", "Runnable"])
			.expect("Chat tags should be valid.");
		let wants_llm =
			CapabilitySet::new(["BaseLanguageModel"]).expect("Required tags should be valid.");
		let wants_tool = CapabilitySet::new(["Tool"]).expect("Tool tags should be valid.");

		assert!(chat.intersects(&wants_llm));
		assert!(chat.is_superset(&wants_llm));
		assert!(!chat.intersects(&wants_tool));
		assert_eq!(chat.intersection(&wants_llm).collect::<Vec<_>>(), vec!["BaseLanguageModel"]);
	}

	#[test]
	fn invalid_tags_error() {
		assert_eq!(CapabilitySet::new([""]), Err(CapabilityError::Empty));
		assert!(matches!(
			CapabilitySet::new(["Base Chat"]),
			Err(CapabilityError::ContainsWhitespace { .. })
		));
		assert!(serde_json::from_str::<CapabilitySet>("[\"ok\", \" bad\"]").is_err());
	}
}
