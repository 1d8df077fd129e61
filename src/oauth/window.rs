//! Host-side window seams used by the channel to open popups and detect their closure.

// self
use crate::_prelude::*;

/// Handle to an authorization popup.
pub trait PopupWindow
where
	Self: Send + Sync,
{
	/// Returns true once the window is gone, whether the user or the page closed it.
	fn is_closed(&self) -> bool;

	/// Asks the window to close; a no-op when it already is.
	fn close(&self);
}

/// Opens authorization popups on behalf of the channel.
pub trait WindowOpener
where
	Self: Send + Sync,
{
	/// Opens a popup at `url`; `None` when the host refused (e.g. a popup blocker).
	fn open(&self, url: &Url) -> Option<Arc<dyn PopupWindow>>;
}
