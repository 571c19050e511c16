pub mod encode;
pub mod fuse;
pub mod render;
pub mod size;
pub mod testgen;

/* Re-export main public functions */
pub use encode::encode_instructions;
pub use fuse::{fold_consts, fuse};
pub use render::{render_encode_fn, render_plain_impl, render_size_fn, sanitize_version_id};
pub use size::size_terms;
pub use testgen::render_type_test;

use crate::model::bound::BoundType;
use stable_loader::manifest::FrozenBody;

/* Fused encode stream plus folded size terms for one type: the unit the
   renderer consumes and the manifest freezes */
pub fn generate_body(ty: &BoundType) -> FrozenBody {
  FrozenBody {
    encode: fuse(encode_instructions(ty)),
    size: fold_consts(size_terms(ty)),
  }
}

/* Statically-known wire chunks, computed with the same append routines the
   generated code calls so the two can never drift */

pub fn array_header_bytes(n: u32) -> Vec<u8> {
  let mut o = Vec::new();
  stable_wire::append_array_header(&mut o, n);
  o
}

pub fn map_header_bytes(n: u32) -> Vec<u8> {
  let mut o = Vec::new();
  stable_wire::append_map_header(&mut o, n);
  o
}
