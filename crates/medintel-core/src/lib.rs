pub mod conference;
pub mod config;
pub mod error;
pub mod identity;
pub mod prescription;

// Re-export common error type
pub use error::MedintelError;
pub use identity::{Identity, IdentityResolver};
