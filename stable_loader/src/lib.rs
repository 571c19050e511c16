//! Schema File Loading and Version Manifest Persistence
//!
//! This crate provides functionality for loading codec schema files from
//! disk, resolving path imports between them, and reading/writing the
//! version manifest sidecar that carries frozen per-version encode bodies
//! across regenerations.

pub mod file;
pub mod manifest;

// Re-export commonly used types at the crate root
pub use file::{PathImport, SchemaFile, SchemaMetadata, SchemaSet};
pub use manifest::{FrozenBody, TypeManifest, VersionEntry, VersionManifest, MANIFEST_VERSION};

// Re-export stable_types for convenience
pub use stable_types;
