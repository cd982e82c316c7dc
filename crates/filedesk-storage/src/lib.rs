//! Filedesk Storage Library
//!
//! This crate provides the storage abstraction the file view talks to, and two
//! implementations: the Supabase Storage REST API and the local filesystem.
//!
//! # Storage key format
//!
//! Keys are identity-scoped: `{identity_id}/{file_name}`. The identity id is the list
//! prefix, so one identity never sees another identity's objects.
//!
//! Keys must not contain `..`, a leading `/`, or extra path segments. Key generation is
//! centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-local")]
pub mod signing;
#[cfg(feature = "storage-supabase")]
pub mod supabase;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use filedesk_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-supabase")]
pub use supabase::SupabaseStorage;
pub use traits::{Storage, StorageError, StorageResult, StorageResultExt};
