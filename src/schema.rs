//! Input schema model: the closed vocabulary of parameter kinds a descriptor may declare.
//!
//! Each [`InputType`] maps to a single validation rule. Secret kinds (`password`,
//! `oauth2Secret`) accept any non-empty text but fall under the redaction rule enforced by
//! [`crate::credential::Redaction`].

// self
use crate::_prelude::*;

/// Errors raised while validating a submitted value against its type tag.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SchemaError {
	/// Tag is not part of the known enumeration; every value is rejected.
	#[error("Input type `{tag}` is not supported.")]
	UnknownType {
		/// Offending tag.
		tag: String,
	},
	/// Value does not satisfy the rule attached to the tag.
	#[error("Value is not valid for input type `{tag}`: {reason}.")]
	InvalidValue {
		/// Known tag the value was checked against.
		tag: &'static str,
		/// Short human-readable reason.
		reason: &'static str,
	},
}

/// Closed, platform-defined enumeration of input kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputType {
	/// Free text.
	#[serde(rename = "string")]
	String,
	/// Secret text typed by the user.
	#[serde(rename = "password")]
	Password,
	/// Secret obtained through the OAuth completion channel instead of typed input.
	#[serde(rename = "oauth2Secret")]
	OAuth2Secret,
	/// Finite decimal number.
	#[serde(rename = "number")]
	Number,
	/// `true` or `false`.
	#[serde(rename = "boolean")]
	Boolean,
	/// Any JSON document.
	#[serde(rename = "json")]
	Json,
	/// Source code snippet.
	#[serde(rename = "code")]
	Code,
}
impl InputType {
	/// All known kinds in declaration order.
	pub const ALL: [InputType; 7] = [
		InputType::String,
		InputType::Password,
		InputType::OAuth2Secret,
		InputType::Number,
		InputType::Boolean,
		InputType::Json,
		InputType::Code,
	];

	/// Returns the wire tag for the kind.
	pub const fn as_str(self) -> &'static str {
		match self {
			InputType::String => "string",
			InputType::Password => "password",
			InputType::OAuth2Secret => "oauth2Secret",
			InputType::Number => "number",
			InputType::Boolean => "boolean",
			InputType::Json => "json",
			InputType::Code => "code",
		}
	}

	/// Resolves a wire tag; `None` for anything outside the enumeration.
	pub fn from_tag(tag: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
	}

	/// Returns true when values of this kind must never be echoed back in cleartext.
	pub const fn is_secret(self) -> bool {
		matches!(self, InputType::Password | InputType::OAuth2Secret)
	}

	/// Checks a value against the rule attached to this kind.
	pub fn check(self, value: &str) -> Result<(), SchemaError> {
		let invalid = |reason| Err(SchemaError::InvalidValue { tag: self.as_str(), reason });

		match self {
			InputType::String | InputType::Code => Ok(()),
			InputType::Password | InputType::OAuth2Secret =>
				if value.is_empty() {
					invalid("secret values cannot be empty")
				} else {
					Ok(())
				},
			InputType::Number => match value.trim().parse::<f64>() {
				Ok(number) if number.is_finite() => Ok(()),
				_ => invalid("expected a finite number"),
			},
			InputType::Boolean =>
				if matches!(value, "true" | "false") {
					Ok(())
				} else {
					invalid("expected `true` or `false`")
				},
			InputType::Json =>
				if serde_json::from_str::<serde_json::Value>(value).is_ok() {
					Ok(())
				} else {
					invalid("expected a JSON document")
				},
		}
	}
}
impl Display for InputType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Returns true when `tag` names a known input kind.
pub fn is_known_type(tag: &str) -> bool {
	InputType::from_tag(tag).is_some()
}

/// Validates `value` against the rule for `tag`; unknown tags reject every value.
pub fn validate(tag: &str, value: &str) -> Result<(), SchemaError> {
	match InputType::from_tag(tag) {
		Some(kind) => kind.check(value),
		None => Err(SchemaError::UnknownType { tag: tag.to_owned() }),
	}
}

/// One configurable field of a descriptor.
///
/// `kind` keeps the raw wire tag so manifests carrying an unknown tag decode successfully and
/// are then rejected by descriptor validation with a precise error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputParam {
	/// Display text.
	pub label: String,
	/// Stable machine key, unique within the owning descriptor.
	pub name: String,
	/// Wire tag of the input kind.
	#[serde(rename = "type")]
	pub kind: String,
	/// Whether the value may be omitted.
	#[serde(default, skip_serializing_if = "is_false")]
	pub optional: bool,
	/// Textarea height hint for renderers.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rows: Option<u32>,
	/// Optional help text.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Optional placeholder text.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub placeholder: Option<String>,
}
impl InputParam {
	/// Creates a required input of the given kind.
	pub fn new(label: impl Into<String>, name: impl Into<String>, kind: InputType) -> Self {
		Self::with_tag(label, name, kind.as_str())
	}

	/// Creates a required input carrying a raw type tag.
	pub fn with_tag(
		label: impl Into<String>,
		name: impl Into<String>,
		tag: impl Into<String>,
	) -> Self {
		Self {
			label: label.into(),
			name: name.into(),
			kind: tag.into(),
			optional: false,
			rows: None,
			description: None,
			placeholder: None,
		}
	}

	/// Marks the input as optional.
	pub fn optional(mut self) -> Self {
		self.optional = true;

		self
	}

	/// Sets the textarea height hint.
	pub fn rows(mut self, rows: u32) -> Self {
		self.rows = Some(rows);

		self
	}

	/// Sets the help text.
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}

	/// Sets the placeholder text.
	pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
		self.placeholder = Some(placeholder.into());

		self
	}

	/// Resolved input kind, if the tag is known.
	pub fn input_type(&self) -> Option<InputType> {
		InputType::from_tag(&self.kind)
	}

	/// Returns true when the input holds secret material.
	pub fn is_secret(&self) -> bool {
		self.input_type().is_some_and(InputType::is_secret)
	}

	/// Validates a submitted value against this input's type tag.
	pub fn validate(&self, value: &str) -> Result<(), SchemaError> {
		validate(&self.kind, value)
	}
}

fn is_false(value: &bool) -> bool {
	!*value
}
