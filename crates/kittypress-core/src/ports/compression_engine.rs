//! Compression engine port (driven/secondary port)
//!
//! The engine is an opaque service: its archive format and diagnostics are
//! out of reach of the core. Only the result signal crosses the boundary.

use std::path::{Path, PathBuf};

/// Port trait for the external compression engine
#[async_trait::async_trait]
pub trait ICompressionEngine: Send + Sync {
    /// Compresses `inputs` (absolute local paths, in order) into `output`
    ///
    /// Returns `0` on success; any other value is an opaque failure.
    async fn compress(&self, inputs: &[PathBuf], output: &Path) -> i32;

    /// Extracts `archive` into `output_dir`
    ///
    /// Returns the name of the single top-level entry created under
    /// `output_dir`, or `None` on failure.
    async fn decompress(&self, archive: &Path, output_dir: &Path) -> Option<String>;
}
