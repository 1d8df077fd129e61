//! Typed node/credential descriptor registry plus the cross-window OAuth completion channel used
//! by visual integration builders to finish third-party logins inside a popup.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod credential;
pub mod descriptor;
pub mod error;
pub mod oauth;
pub mod obs;
pub mod registry;
pub mod schema;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
	// self
	use crate::{
		descriptor::{CredentialDescriptor, NodeDescriptor},
		oauth::{ChannelConfig, CompletionChannel, PopupWindow, WindowOpener},
		schema::{InputParam, InputType},
	};

	/// Origin every test channel treats as the platform origin.
	pub const TEST_PLATFORM_ORIGIN: &str = "https://app.example.com";

	/// Popup double whose closed flag is flipped by the test body.
	#[derive(Debug, Default)]
	pub struct MockPopup {
		closed: AtomicBool,
		close_calls: AtomicUsize,
	}
	impl MockPopup {
		/// Simulates the end-user closing the popup.
		pub fn close_by_user(&self) {
			self.closed.store(true, Ordering::SeqCst);
		}

		/// Number of times the channel asked the popup to close.
		pub fn close_calls(&self) -> usize {
			self.close_calls.load(Ordering::SeqCst)
		}
	}
	impl PopupWindow for MockPopup {
		fn is_closed(&self) -> bool {
			self.closed.load(Ordering::SeqCst)
		}

		fn close(&self) {
			self.close_calls.fetch_add(1, Ordering::SeqCst);
			self.closed.store(true, Ordering::SeqCst);
		}
	}

	/// Opener double that records every URL it was asked to open.
	#[derive(Debug, Default)]
	pub struct MockOpener {
		/// URLs passed to [`WindowOpener::open`], in call order.
		pub opened: Mutex<Vec<Url>>,
		/// Popups handed out, in call order.
		pub popups: Mutex<Vec<Arc<MockPopup>>>,
		/// Makes every `open` call fail as if the browser blocked the popup.
		pub blocked: bool,
	}
	impl MockOpener {
		/// Creates an opener that refuses to open windows.
		pub fn blocked() -> Self {
			Self { blocked: true, ..Default::default() }
		}

		/// Returns the most recently opened popup.
		pub fn last_popup(&self) -> Arc<MockPopup> {
			self.popups.lock().last().cloned().expect("At least one popup should have been opened.")
		}

		/// Returns the most recently opened URL.
		pub fn last_url(&self) -> Url {
			self.opened.lock().last().cloned().expect("At least one URL should have been opened.")
		}
	}
	impl WindowOpener for MockOpener {
		fn open(&self, url: &Url) -> Option<Arc<dyn PopupWindow>> {
			if self.blocked {
				return None;
			}

			let popup = Arc::new(MockPopup::default());

			self.opened.lock().push(url.clone());
			self.popups.lock().push(popup.clone());

			Some(popup)
		}
	}

	/// Builds a channel bound to [`TEST_PLATFORM_ORIGIN`] with default timeouts.
	pub fn build_test_channel() -> CompletionChannel {
		let origin = Url::parse(TEST_PLATFORM_ORIGIN).expect("Test platform origin should parse.");
		let config = ChannelConfig::new(origin).expect("Test channel configuration should be valid.");

		CompletionChannel::new(config).expect("Test channel should build.")
	}

	/// Provider authorization endpoint used across OAuth tests.
	pub fn test_authorization_endpoint() -> Url {
		Url::parse("https://accounts.example.com/o/oauth2/auth")
			.expect("Authorization endpoint fixture should parse.")
	}

	/// `googleApi` credential fixture with a single oauth2Secret input.
	pub fn google_api_credential() -> CredentialDescriptor {
		CredentialDescriptor::builder("Google API", "googleApi")
			.version(1)
			.input(InputParam::new("Google API Key", "googleApiKey", InputType::OAuth2Secret))
			.build()
			.expect("googleApi credential fixture should build.")
	}

	/// Minimal node fixture with the provided name, version, and category.
	pub fn chat_node(name: &str, label: &str, version: u32, category: &str) -> NodeDescriptor {
		NodeDescriptor::builder(label, name)
			.version(version)
			.category(category)
			.base_classes(["BaseChatModel", "Runnable"])
			.input(InputParam::new("Model Name", "modelName", InputType::String))
			.input(InputParam::new("Temperature", "temperature", InputType::Number).optional())
			.build()
			.expect("Node fixture should build.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
#[cfg(test)] use {color_eyre as _, tokio as _};
