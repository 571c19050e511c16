/* Instruction fusion: a peephole pass over the emit instruction list that
   coalesces adjacent statically-known byte chunks into one blob, flushing
   before any runtime-dependent instruction. Pure list-to-list rewrite with
   no effect on emitted bytes. */

use stable_types::{Instr, SizeTerm};

pub fn fuse(instrs: Vec<Instr>) -> Vec<Instr> {
  let mut out = Vec::with_capacity(instrs.len());
  let mut pending: Vec<u8> = Vec::new();

  for instr in instrs {
    match instr {
      Instr::Static { bytes } => pending.extend_from_slice(&bytes),
      other => {
        flush(&mut out, &mut pending);
        out.push(fuse_bodies(other));
      }
    }
  }
  flush(&mut out, &mut pending);
  out
}

fn flush(out: &mut Vec<Instr>, pending: &mut Vec<u8>) {
  if !pending.is_empty() {
    out.push(Instr::Static {
      bytes: std::mem::take(pending),
    });
  }
}

/* Conditional and loop bodies fuse independently; their static chunks can
   never merge across the runtime boundary */
fn fuse_bodies(instr: Instr) -> Instr {
  match instr {
    Instr::Nullable { value, bind, body } => Instr::Nullable {
      value,
      bind,
      body: fuse(body),
    },
    Instr::MapIter { value, keys, key, val, body } => Instr::MapIter {
      value,
      keys,
      key,
      val,
      body: fuse(body),
    },
    Instr::SeqIter { value, bind, body } => Instr::SeqIter {
      value,
      bind,
      body: fuse(body),
    },
    Instr::ArrayIter { value, bind, body } => Instr::ArrayIter {
      value,
      bind,
      body: fuse(body),
    },
    other => other,
  }
}

/* The size-side mirror: adjacent constant terms fold into one */
pub fn fold_consts(terms: Vec<SizeTerm>) -> Vec<SizeTerm> {
  let mut out: Vec<SizeTerm> = Vec::with_capacity(terms.len());

  for term in terms {
    let term = fold_bodies(term);
    match (out.last_mut(), &term) {
      (Some(SizeTerm::Const { n }), SizeTerm::Const { n: m }) => *n += m,
      _ => out.push(term),
    }
  }
  out
}

fn fold_bodies(term: SizeTerm) -> SizeTerm {
  match term {
    SizeTerm::Nullable { value, bind, body } => SizeTerm::Nullable {
      value,
      bind,
      body: fold_consts(body),
    },
    SizeTerm::MapSum { value, key, val, body } => SizeTerm::MapSum {
      value,
      key,
      val,
      body: fold_consts(body),
    },
    SizeTerm::SeqSum { value, bind, body } => SizeTerm::SeqSum {
      value,
      bind,
      body: fold_consts(body),
    },
    SizeTerm::ArraySum { value, bind, body } => SizeTerm::ArraySum {
      value,
      bind,
      body: fold_consts(body),
    },
    other => other,
  }
}
