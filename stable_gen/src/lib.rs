//! Stable codec generator engine.
//!
//! Turns declarative shape schemas into Rust encode/size routines with a
//! hash-stability guarantee, carrying per-type version histories across
//! regenerations through a sidecar manifest.

pub mod cmds;
pub mod codegen;
pub mod model;
pub mod version;
