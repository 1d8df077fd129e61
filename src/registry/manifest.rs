// self
use crate::{
	_prelude::*,
	descriptor::{CredentialDescriptor, Descriptor, NodeDescriptor},
};

/// Errors raised while decoding a plugin manifest.
#[derive(Debug, ThisError)]
pub enum ManifestError {
	/// Manifest JSON is malformed or does not match the descriptor shape.
	#[error("Plugin manifest is invalid at `{path}`.")]
	Decode {
		/// JSON path of the offending value.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_json::Error,
	},
}

/// Bundle of descriptors shipped by one plugin package.
///
/// ```json
/// { "nodes": [ { "label": "...", "name": "...", "version": 1, "inputs": [] } ],
///   "credentials": [ { "label": "...", "name": "...", "version": 1, "inputs": [] } ] }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginManifest {
	/// Node descriptors, registered in order.
	#[serde(default)]
	pub nodes: Vec<NodeDescriptor>,
	/// Credential descriptors, registered after the nodes.
	#[serde(default)]
	pub credentials: Vec<CredentialDescriptor>,
}
impl PluginManifest {
	/// Decodes a manifest, reporting the JSON path of the first failure.
	pub fn from_json(json: &str) -> Result<Self, ManifestError> {
		let mut deserializer = serde_json::Deserializer::from_str(json);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
			let path = err.path().to_string();

			ManifestError::Decode { path, source: err.into_inner() }
		})
	}

	/// Number of descriptors carried.
	pub fn len(&self) -> usize {
		self.nodes.len() + self.credentials.len()
	}

	/// Returns true when the manifest carries nothing.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.credentials.is_empty()
	}

	/// Consumes the manifest, yielding nodes first and then credentials.
	pub fn into_descriptors(self) -> impl Iterator<Item = Descriptor> {
		self.nodes
			.into_iter()
			.map(Descriptor::from)
			.chain(self.credentials.into_iter().map(Descriptor::from))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::schema::InputType;

	#[test]
	fn manifest_decodes_both_kinds() {
		let manifest = PluginManifest::from_json(
			r#"{
				"nodes": [{
					"label": "ChatOpenAI",
					"name": "chatOpenAI",
					"version": 2.0,
					"category": "Chat Models",
					"baseClasses": ["BaseChatModel"],
					"inputs": [{ "label": "Temperature", "name": "temperature", "type": "number", "optional": true }]
				}],
				"credentials": [{
					"label": "Google API",
					"name": "googleApi",
					"version": 1,
					"inputs": [{ "label": "Key", "name": "googleApiKey", "type": "oauth2Secret" }]
				}]
			}"#,
		)
		.expect("Manifest should decode.");

		assert_eq!(manifest.len(), 2);
		assert_eq!(manifest.nodes[0].version.get(), 2);
		assert_eq!(manifest.credentials[0].inputs[0].input_type(), Some(InputType::OAuth2Secret));

		let kinds = manifest.into_descriptors().map(|d| d.kind()).collect::<Vec<_>>();

		assert_eq!(kinds.len(), 2);
	}

	#[test]
	fn decode_errors_carry_json_paths() {
		let err = PluginManifest::from_json(
			r#"{ "nodes": [{ "label": "A", "name": "a", "version": 1 }, { "label": "B", "name": "b", "version": 1.5 }] }"#,
		)
		.expect_err("Fractional versions must be rejected.");
		let ManifestError::Decode { path, .. } = err;

		assert_eq!(path, "nodes[1].version");
	}
}
