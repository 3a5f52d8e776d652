//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IScopedStorage`] - Permission-scoped file and folder access
//! - [`ICompressionEngine`] - Opaque archive compression/decompression
//! - [`IStatusSink`] - User-visible status lines

pub mod compression_engine;
pub mod scoped_storage;
pub mod status;

pub use compression_engine::ICompressionEngine;
pub use scoped_storage::{DocumentInfo, IScopedStorage, ReadStream, WriteStream};
pub use status::{IStatusSink, NullStatusSink};
