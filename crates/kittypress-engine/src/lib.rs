//! KittyPress Engine - Compression engine adapters
//!
//! Provides [`CommandEngine`], an [`ICompressionEngine`] implementation that
//! drives an external archiver program.
//!
//! [`ICompressionEngine`]: kittypress_core::ports::ICompressionEngine

pub mod command;

pub use command::CommandEngine;
