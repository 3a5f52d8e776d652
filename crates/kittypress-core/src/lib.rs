//! KittyPress Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `InputItem`, `InputSelection`, `PendingSave`, archive naming rules
//! - **Use cases** - staging, archive pipeline, destination resolution, deferred saves,
//!   tree mirroring, and the compress/decompress orchestrators
//! - **Port definitions** - Traits for adapters: `IScopedStorage`, `ICompressionEngine`, `IStatusSink`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;

#[cfg(test)]
pub(crate) mod testing;
