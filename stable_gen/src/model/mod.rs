pub mod bound;
pub mod passes;

pub use bound::{Binding, BoundElem, BoundField, BoundRecord, BoundType};
pub use passes::{PassContext, PassError, Pipeline, process_order};
