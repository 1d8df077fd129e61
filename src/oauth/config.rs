// self
use crate::{
	_prelude::*,
	auth::SessionId,
	error::ConfigError,
	oauth::{COMPLETION_MESSAGE_TYPE, CallbackStatus},
};

/// Wiring for the completion channel and its callback route.
///
/// Deserializable so hosts can load it with the rest of their settings; validated by
/// [`ChannelConfig::validate`] before a channel accepts it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
	/// Origin the callback page is served from; completion messages from anywhere else are
	/// rejected.
	pub platform_origin: Url,
	/// Path prefix of the callback route (`/oauth` serves `/oauth/{status}`).
	#[serde(default = "ChannelConfig::default_callback_path")]
	pub callback_path: String,
	/// Maximum time a session may stay pending before the watchdog abandons it.
	#[serde(default = "ChannelConfig::default_max_pending_seconds")]
	pub max_pending_seconds: i64,
	/// Literal carried by completion messages.
	#[serde(default = "ChannelConfig::default_message_type")]
	pub message_type: String,
}
impl ChannelConfig {
	const DEFAULT_CALLBACK_PATH: &'static str = "/oauth";
	const DEFAULT_MAX_PENDING: Duration = Duration::minutes(10);

	/// Creates a configuration for `platform_origin` with default route and timeout.
	pub fn new(platform_origin: Url) -> Result<Self, ConfigError> {
		let config = Self {
			platform_origin,
			callback_path: Self::default_callback_path(),
			max_pending_seconds: Self::default_max_pending_seconds(),
			message_type: Self::default_message_type(),
		};

		config.validate()?;

		Ok(config)
	}

	/// Overrides the callback path prefix.
	pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
		self.callback_path = path.into();

		self
	}

	/// Overrides the maximum pending duration.
	pub fn with_max_pending(mut self, max_pending: Duration) -> Self {
		self.max_pending_seconds = max_pending.whole_seconds();

		self
	}

	/// Overrides the completion message literal.
	pub fn with_message_type(mut self, message_type: impl Into<String>) -> Self {
		self.message_type = message_type.into();

		self
	}

	/// Maximum pending duration.
	pub fn max_pending(&self) -> Duration {
		Duration::seconds(self.max_pending_seconds)
	}

	/// Serialized origin, e.g. `https://app.example.com`.
	pub fn origin(&self) -> String {
		self.platform_origin.origin().ascii_serialization()
	}

	/// Returns true when `origin` names the configured platform origin.
	pub fn is_trusted_origin(&self, origin: &str) -> bool {
		Url::parse(origin).is_ok_and(|url| url.origin() == self.platform_origin.origin())
	}

	/// URL handed to the identity provider as `redirect_uri`.
	pub fn redirect_uri(&self) -> Result<Url, ConfigError> {
		self.platform_origin
			.join(&self.callback_path)
			.map_err(|source| ConfigError::CallbackUrl { source })
	}

	/// Callback URL carrying `status` and, when present, the session correlation token.
	pub fn callback_url(
		&self,
		status: CallbackStatus,
		session: Option<&SessionId>,
	) -> Result<Url, ConfigError> {
		let mut url = self
			.platform_origin
			.join(&format!("{}/{}", self.callback_path, status.as_str()))
			.map_err(|source| ConfigError::CallbackUrl { source })?;

		if let Some(session) = session {
			url.query_pairs_mut().append_pair("session", session);
		}

		Ok(url)
	}

	/// Validates the configuration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let origin = &self.platform_origin;

		if !matches!(origin.scheme(), "http" | "https")
			|| !origin.has_host()
			|| origin.path() != "/"
			|| origin.query().is_some()
			|| origin.fragment().is_some()
		{
			return Err(ConfigError::InvalidOrigin { origin: origin.to_string() });
		}
		if !self.callback_path.starts_with('/')
			|| self.callback_path.len() < 2
			|| self.callback_path.ends_with('/')
		{
			return Err(ConfigError::InvalidCallbackPath { path: self.callback_path.clone() });
		}
		if self.max_pending_seconds <= 0 {
			return Err(ConfigError::NonPositiveTimeout);
		}
		if self.message_type.is_empty() {
			return Err(ConfigError::EmptyMessageType);
		}

		Ok(())
	}

	fn default_callback_path() -> String {
		Self::DEFAULT_CALLBACK_PATH.into()
	}

	fn default_max_pending_seconds() -> i64 {
		Self::DEFAULT_MAX_PENDING.whole_seconds()
	}

	fn default_message_type() -> String {
		COMPLETION_MESSAGE_TYPE.into()
	}
}
