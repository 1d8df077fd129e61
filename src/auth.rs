//! Opaque identifiers and secret wrappers shared by the credential store and OAuth channel.

pub mod id;
pub mod secret;

pub use id::*;
pub use secret::*;
