//! Shape and instruction definitions for the stable codec generator.
//!
//! This crate contains pure data structures: the element model describing
//! the shape of a value, the directive surface attached to declarations, and
//! the serializable instruction IR that encode/size generation produces.
//! No file I/O or code generation logic lives here.

pub mod elem;
pub mod instr;

// Re-export commonly used types at the crate root
pub use elem::*;
pub use instr::*;
