/* Size-routine generation: mirrors the encode traversal so that for every
   value the computed size equals the encoded length exactly */

use crate::codegen::fuse::fold_consts;
use crate::model::bound::{BoundElem, BoundType};
use stable_types::{ShimMode, SizeTerm, WireType};
use stable_wire::HEADER_SIZE;

pub fn size_terms(ty: &BoundType) -> Vec<SizeTerm> {
  let mut out = Vec::new();
  gen_elem(&ty.elem, &mut out);
  out
}

fn gen_elem(elem: &BoundElem, out: &mut Vec<SizeTerm>) {
  match elem {
    BoundElem::Primitive { bind, wire, shim, .. } => match shim {
      Some(s) => match s.wire.fixed_width() {
        Some(w) => out.push(SizeTerm::Const { n: w as u64 }),
        /* Only cast shims reach here; fallible ones are fixed-width by
           construction */
        None => {
          debug_assert_eq!(s.mode, ShimMode::Cast);
          let converted = format!("&{}({})", s.to_wire, bind.ref_expr());
          out.push(match s.wire {
            WireType::Str => SizeTerm::StrLen { value: converted },
            WireType::Bin => SizeTerm::BinLen { value: converted },
            _ => SizeTerm::ExtSize { value: converted },
          });
        }
      },
      None => match wire {
        WireType::Str => out.push(SizeTerm::StrLen { value: bind.ref_expr() }),
        WireType::Bin => out.push(SizeTerm::BinLen { value: bind.ref_expr() }),
        WireType::Ext => out.push(SizeTerm::ExtSize { value: bind.ref_expr() }),
        _ => {
          let w = wire.fixed_width().expect("fixed-width wire kind");
          out.push(SizeTerm::Const { n: w as u64 });
        }
      },
    },

    BoundElem::Named { bind, .. } => out.push(SizeTerm::Nested {
      value: bind.place_expr().to_string(),
    }),

    BoundElem::Record(record) => {
      out.push(SizeTerm::Const { n: HEADER_SIZE as u64 });
      for field in &record.fields {
        gen_elem(&field.elem, out);
      }
    }

    BoundElem::Mapping { bind, depth, value } => {
      out.push(SizeTerm::Const { n: HEADER_SIZE as u64 });
      let mut body = Vec::new();
      gen_elem(value, &mut body);
      out.push(SizeTerm::MapSum {
        value: bind.place_expr().to_string(),
        key: format!("k{}", depth),
        val: format!("v{}", depth),
        body: fold_consts(body),
      });
    }

    BoundElem::Sequence { bind, depth, elem } => {
      out.push(SizeTerm::Const { n: HEADER_SIZE as u64 });
      let body = fold_consts(collect(elem));
      match constant_body(&body) {
        Some(each) => out.push(SizeTerm::LenTimes {
          value: bind.place_expr().to_string(),
          each,
        }),
        None => out.push(SizeTerm::SeqSum {
          value: bind.place_expr().to_string(),
          bind: format!("x{}", depth),
          body,
        }),
      }
    }

    BoundElem::FixedArray { bind, depth, len, elem, byte_block } => {
      if *byte_block {
        out.push(SizeTerm::Const { n: (HEADER_SIZE as u64) + len });
        return;
      }
      out.push(SizeTerm::Const { n: HEADER_SIZE as u64 });
      let body = fold_consts(collect(elem));
      match constant_body(&body) {
        /* Fully static: fold the whole array into one constant */
        Some(each) => out.push(SizeTerm::Const { n: len * each }),
        None => out.push(SizeTerm::ArraySum {
          value: bind.place_expr().to_string(),
          bind: format!("x{}", depth),
          body,
        }),
      }
    }

    BoundElem::Nullable { bind, depth, inner } => {
      let body = fold_consts(collect(inner));
      out.push(SizeTerm::Nullable {
        value: bind.ref_expr(),
        bind: format!("p{}", depth),
        body,
      });
    }
  }
}

fn collect(elem: &BoundElem) -> Vec<SizeTerm> {
  let mut out = Vec::new();
  gen_elem(elem, &mut out);
  out
}

fn constant_body(body: &[SizeTerm]) -> Option<u64> {
  match body {
    [SizeTerm::Const { n }] => Some(*n),
    _ => None,
  }
}
