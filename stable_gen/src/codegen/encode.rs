/* Encode-routine generation: bound tree -> emit instruction stream */

use crate::codegen::{array_header_bytes, map_header_bytes};
use crate::model::bound::{BoundElem, BoundType};
use stable_types::{Instr, WireType};

/* Traverse a bound type into its ordered emit instructions. The stream is
   un-fused; run `fuse` before rendering or freezing. */
pub fn encode_instructions(ty: &BoundType) -> Vec<Instr> {
  let mut out = Vec::new();
  gen_elem(&ty.elem, &mut out);
  out
}

fn gen_elem(elem: &BoundElem, out: &mut Vec<Instr>) {
  match elem {
    BoundElem::Primitive { bind, depth, wire, shim, .. } => match shim {
      Some(s) => out.push(Instr::Convert {
        wire: s.wire,
        mode: s.mode,
        func: s.to_wire.clone(),
        value: bind.ref_expr(),
        temp: format!("w{}", depth),
      }),
      None => match wire {
        WireType::Ext => out.push(Instr::Ext { value: bind.ref_expr() }),
        WireType::Str | WireType::Bin => out.push(Instr::Scalar {
          wire: *wire,
          value: bind.ref_expr(),
        }),
        _ => out.push(Instr::Scalar {
          wire: *wire,
          value: bind.value_expr(),
        }),
      },
    },

    /* Delegate to the target's own routine and splice the bytes */
    BoundElem::Named { bind, depth, .. } => out.push(Instr::Opaque {
      value: bind.place_expr().to_string(),
      temp: format!("nb{}", depth),
    }),

    BoundElem::Record(record) => {
      /* Field count is known statically for both modes; only the header
         tag differs. Field identity rides on position, never on a key. */
      let n = record.fields.len() as u32;
      let bytes = if record.tuple {
        array_header_bytes(n)
      } else {
        map_header_bytes(n)
      };
      out.push(Instr::Static { bytes });
      for field in &record.fields {
        gen_elem(&field.elem, out);
      }
    }

    BoundElem::Mapping { bind, depth, value } => {
      let mut body = Vec::new();
      gen_elem(value, &mut body);
      out.push(Instr::MapIter {
        value: bind.place_expr().to_string(),
        keys: format!("ks{}", depth),
        key: format!("k{}", depth),
        val: format!("v{}", depth),
        body,
      });
    }

    BoundElem::Sequence { bind, depth, elem } => {
      let mut body = Vec::new();
      gen_elem(elem, &mut body);
      out.push(Instr::SeqIter {
        value: bind.place_expr().to_string(),
        bind: format!("x{}", depth),
        body,
      });
    }

    BoundElem::FixedArray { bind, depth, len, elem, byte_block } => {
      if *byte_block {
        out.push(Instr::RawBytes { value: bind.ref_expr() });
      } else {
        out.push(Instr::Static {
          bytes: array_header_bytes(*len as u32),
        });
        let mut body = Vec::new();
        gen_elem(elem, &mut body);
        out.push(Instr::ArrayIter {
          value: bind.place_expr().to_string(),
          bind: format!("x{}", depth),
          body,
        });
      }
    }

    BoundElem::Nullable { bind, depth, inner } => {
      let mut body = Vec::new();
      gen_elem(inner, &mut body);
      out.push(Instr::Nullable {
        value: bind.ref_expr(),
        bind: format!("p{}", depth),
        body,
      });
    }
  }
}
