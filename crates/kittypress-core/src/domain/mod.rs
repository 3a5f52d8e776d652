//! Domain entities and business logic
//!
//! This module contains the core domain types for KittyPress:
//! - Newtypes for provider-issued references and request tokens
//! - Input items and the ordered selection (Input Normalizer)
//! - Naming and sanitization rules
//! - Deferred save records
//! - Domain-specific error types

pub mod errors;
pub mod input;
pub mod naming;
pub mod newtypes;
pub mod pending;

// Re-export commonly used types
pub use errors::{DomainError, EngineOperation, PipelineError, StorageError};
pub use input::{InputItem, InputKind, InputSelection};
pub use newtypes::*;
pub use pending::{PendingArtifact, PendingSave, PermissionRequest, SaveState};
