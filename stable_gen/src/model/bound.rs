use stable_types::{Shim, VersionDirective, WireType};

/* A rendered Rust expression naming a value during traversal, plus how the
   expression holds it. Field accesses are places; loop and match bindings
   hold references. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
  pub expr: String,
  pub by_ref: bool,
}

impl Binding {
  pub fn place(expr: impl Into<String>) -> Self {
    Self { expr: expr.into(), by_ref: false }
  }

  pub fn borrowed(expr: impl Into<String>) -> Self {
    Self { expr: expr.into(), by_ref: true }
  }

  /* Expression yielding the value itself (for Copy scalars) */
  pub fn value_expr(&self) -> String {
    if self.by_ref {
      format!("*{}", self.expr)
    } else {
      self.expr.clone()
    }
  }

  /* Expression yielding a shared reference */
  pub fn ref_expr(&self) -> String {
    if self.by_ref {
      self.expr.clone()
    } else {
      format!("&{}", self.expr)
    }
  }

  /* Bare place expression; method calls and field accesses auto-deref */
  pub fn place_expr(&self) -> &str {
    &self.expr
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundField {
  pub name: String,
  pub tag: Option<u32>,
  pub decl_index: usize,
  pub elem: BoundElem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundRecord {
  pub bind: Binding,
  pub tuple: bool,
  pub fields: Vec<BoundField>,
}

/* Resolved, binding-named form of an element tree. Binding identifiers are
   derived from tree depth, so two runs over the same declaration produce
   identical trees and identical rendered output. */
#[derive(Debug, Clone, PartialEq)]
pub enum BoundElem {
  Primitive {
    bind: Binding,
    depth: usize,
    wire: WireType,
    shim: Option<Shim>,
    /* Declaration the primitive was inlined from, if any; used by the
       shim-attachment pass */
    shim_source: Option<String>,
  },
  /* Delegation to another type's own routines; target is never inlined */
  Named {
    bind: Binding,
    depth: usize,
    target: String,
  },
  Record(BoundRecord),
  Mapping {
    bind: Binding,
    depth: usize,
    value: Box<BoundElem>,
  },
  Sequence {
    bind: Binding,
    depth: usize,
    elem: Box<BoundElem>,
  },
  FixedArray {
    bind: Binding,
    depth: usize,
    len: u64,
    elem: Box<BoundElem>,
    /* FixedArray of the byte primitive encodes as one raw block */
    byte_block: bool,
  },
  Nullable {
    bind: Binding,
    depth: usize,
    inner: Box<BoundElem>,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundType {
  pub name: String,
  pub printable: bool,
  /* First wire-mapping gap found when unprintable */
  pub unprintable_reason: Option<String>,
  pub versioned: Option<VersionDirective>,
  pub elem: BoundElem,
}

impl BoundType {
  pub fn as_record(&self) -> Option<&BoundRecord> {
    match &self.elem {
      BoundElem::Record(record) => Some(record),
      _ => None,
    }
  }

  /* Only record declarations get generated impl blocks */
  pub fn generates_impl(&self) -> bool {
    self.printable && matches!(self.elem, BoundElem::Record(_))
  }
}
