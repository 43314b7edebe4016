//! Client credentials, redacted secrets, and the shared bearer-token cache.

pub mod secret;
pub mod token;

pub use secret::*;
pub use token::*;
