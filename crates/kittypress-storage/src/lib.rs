//! KittyPress Storage - Scoped storage adapters
//!
//! Provides:
//! - [`LocalScopedStorage`], an [`IScopedStorage`] implementation over a
//!   local directory exposed as the `primary` volume
//! - Per-tree write grants, optionally persisted as JSON
//!
//! ## Modules
//!
//! - [`local`] - Local directory adapter
//! - [`grants`] - Write grant set and its JSON persistence
//!
//! [`IScopedStorage`]: kittypress_core::ports::IScopedStorage

pub mod grants;
pub mod local;

pub use grants::GrantStore;
pub use local::LocalScopedStorage;
