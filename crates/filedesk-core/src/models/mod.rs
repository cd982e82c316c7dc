//! Data models for the application
//!
//! Everything here is transient: the view holds these values in memory, the external
//! store owns the durable copies.

mod identity;
mod mfa;
mod operation;
mod signed_url;
mod stored_file;
mod upload;

// Re-export all models for convenient imports
pub use identity::*;
pub use mfa::*;
pub use operation::*;
pub use signed_url::*;
pub use stored_file::*;
pub use upload::*;
