//! Crate-level error types shared across the registry, credential store, and OAuth channel.

// self
use crate::{
	_prelude::*,
	descriptor::{DescriptorError, DescriptorKind, Version},
	oauth::AbandonReason,
	registry::ManifestError,
	schema::SchemaError,
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
///
/// Every variant is a local, recoverable condition; nothing here is process-fatal.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Descriptor failed validation and was not stored.
	#[error(transparent)]
	InvalidDescriptor(#[from] DescriptorError),
	/// Submitted value does not satisfy its input type rule.
	#[error(transparent)]
	InvalidValueForType(#[from] SchemaError),
	/// Plugin manifest could not be decoded.
	#[error(transparent)]
	Manifest(#[from] ManifestError),

	/// A descriptor with the same kind, name, and version is already registered.
	#[error("{kind} descriptor `{name}` version {version} is already registered.")]
	DuplicateDescriptor {
		/// Kind of the rejected descriptor.
		kind: DescriptorKind,
		/// Descriptor name.
		name: String,
		/// Colliding version.
		version: Version,
	},
	/// The name already belongs to a plugin of another kind.
	#[error("Descriptor name `{name}` is already owned by a {existing} plugin.")]
	NameConflict {
		/// Descriptor name.
		name: String,
		/// Kind that owns the name.
		existing: DescriptorKind,
	},
	/// Lookup miss.
	#[error("{what} `{key}` was not found.")]
	NotFound {
		/// Kind of entity that was looked up.
		what: &'static str,
		/// Lookup key rendered for diagnostics.
		key: String,
	},
	/// A required (non-optional) input was not supplied.
	#[error("Required input `{input}` is missing.")]
	MissingRequiredInput {
		/// Input name.
		input: String,
	},
	/// Submitted configuration references an input the descriptor does not declare.
	#[error("Input `{input}` is not declared by descriptor `{descriptor}`.")]
	UnknownInput {
		/// Descriptor name.
		descriptor: String,
		/// Undeclared input name.
		input: String,
	},

	/// Identity provider reported a failed authorization.
	#[error("Authorization was rejected by the identity provider.")]
	AuthorizationFailed,
	/// Authorization popup went away before completing.
	#[error("Authorization was abandoned: {reason}.")]
	AuthorizationAbandoned {
		/// Why the session was abandoned.
		reason: AbandonReason,
	},
	/// Completion message arrived from an unexpected origin.
	#[error("Completion message from untrusted origin `{origin}` was rejected.")]
	UntrustedOrigin {
		/// Origin reported by the message event.
		origin: String,
	},
	/// Completion message carried an unexpected literal.
	#[error("Unexpected completion message type `{message_type}`.")]
	UnexpectedMessage {
		/// Literal carried by the message.
		message_type: String,
	},
	/// Unscoped completion message while several sessions are pending.
	#[error("Unscoped completion message cannot be matched: {pending} sessions are pending.")]
	AmbiguousCompletion {
		/// Number of pending sessions at delivery time.
		pending: usize,
	},
	/// Session already reached a terminal state.
	#[error("Authorization session `{session}` is already resolved.")]
	AlreadyResolved {
		/// Session identifier.
		session: String,
	},
	/// The host could not open the authorization popup.
	#[error("Authorization popup could not be opened.")]
	PopupBlocked,
}

/// Configuration and validation failures raised while wiring the channel.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// Platform origin must be an absolute http(s) origin with no path.
	#[error("Platform origin `{origin}` must be an http(s) origin without a path.")]
	InvalidOrigin {
		/// Offending origin.
		origin: String,
	},
	/// Callback path prefix must start with `/` and must not end with one.
	#[error("Callback path `{path}` must start with `/` and must not end with `/`.")]
	InvalidCallbackPath {
		/// Offending path.
		path: String,
	},
	/// Maximum pending duration must be positive.
	#[error("The maximum pending duration must be positive.")]
	NonPositiveTimeout,
	/// Completion message literal cannot be empty.
	#[error("The completion message type cannot be empty.")]
	EmptyMessageType,
	/// Callback URL could not be assembled.
	#[error("Callback URL could not be built.")]
	CallbackUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Identifier validation failed.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn abandoned_and_failed_render_distinct_messages() {
		let failed = Error::AuthorizationFailed.to_string();
		let abandoned =
			Error::AuthorizationAbandoned { reason: AbandonReason::WindowClosed }.to_string();

		assert_ne!(failed, abandoned);
		assert!(abandoned.contains("window closed"));
	}

	#[test]
	fn descriptor_errors_convert_into_invalid_descriptor() {
		let err: Error = DescriptorError::EmptyLabel.into();

		assert!(matches!(err, Error::InvalidDescriptor(DescriptorError::EmptyLabel)));
		assert!(StdError::source(&err).is_none());
	}
}
