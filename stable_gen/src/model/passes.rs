/* Transformation passes: declaration table -> bound, generation-ready trees */

use crate::model::bound::{Binding, BoundElem, BoundField, BoundRecord, BoundType};
use indexmap::IndexMap;
use stable_types::{ElemKind, RecordElem, ShimMode, TypeDecl, WireType};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PassError {
  #[error("duplicate type declaration '{0}'")]
  DuplicateType(String),

  #[error("type '{type_name}': versioned record has no field '{field}'")]
  MissingVersionField { type_name: String, field: String },

  #[error("type '{type_name}': version field '{field}' must be an unsigned integer primitive")]
  BadVersionField { type_name: String, field: String },

  #[error("type '{type_name}': fallible shim from '{shim_source}' must target a fixed-width wire kind")]
  FallibleShimWidth { type_name: String, shim_source: String },
}

/* Read-only declaration table shared by every pass and generator.
   Insertion order is preserved, which keeps processing order and all
   diagnostics deterministic. */
pub struct PassContext {
  decls: IndexMap<String, TypeDecl>,
}

impl PassContext {
  pub fn new(decls: &[TypeDecl]) -> Result<Self, PassError> {
    let mut table = IndexMap::new();
    for decl in decls {
      if table.insert(decl.name.clone(), decl.clone()).is_some() {
        return Err(PassError::DuplicateType(decl.name.clone()));
      }
    }
    Ok(Self { decls: table })
  }

  pub fn decl(&self, name: &str) -> Option<&TypeDecl> {
    self.decls.get(name)
  }

  pub fn type_names(&self) -> impl Iterator<Item = &str> {
    self.decls.keys().map(|s| s.as_str())
  }
}

pub struct Pass {
  pub name: &'static str,
  pub run: fn(&PassContext, BoundType) -> Result<BoundType, PassError>,
}

/* The pass pipeline is an explicit ordered list threaded through one call,
   so individual passes can be tested (and reordered) in isolation. Every
   pass is a total, idempotent function of its input. */
pub struct Pipeline {
  passes: Vec<Pass>,
}

impl Pipeline {
  pub fn standard() -> Self {
    Self {
      passes: vec![
        Pass { name: "resolve-names", run: resolve_names },
        Pass { name: "attach-shims", run: attach_shims },
        Pass { name: "order-fields", run: order_fields },
        Pass { name: "mark-printable", run: mark_printable },
      ],
    }
  }

  pub fn pass_names(&self) -> Vec<&'static str> {
    self.passes.iter().map(|p| p.name).collect()
  }

  /* Bind a declaration and run every pass over it. `None` means the
     declaration is removed from generation (`ignore` directive). */
  pub fn run(&self, ctx: &PassContext, decl: &TypeDecl) -> Result<Option<BoundType>, PassError> {
    if decl.ignore {
      return Ok(None);
    }
    let mut ty = bind(decl)?;
    for pass in &self.passes {
      ty = (pass.run)(ctx, ty)?;
    }
    Ok(Some(ty))
  }
}

/* ------------------------------------------------------------------ */
/* Binding: assign traversal expressions and depth-scoped identifiers */
/* ------------------------------------------------------------------ */

fn bind(decl: &TypeDecl) -> Result<BoundType, PassError> {
  let versioned = decl.kind.as_record().and_then(|r| r.versioned.clone());

  if let (Some(directive), Some(record)) = (&versioned, decl.kind.as_record()) {
    let field = record
      .fields
      .iter()
      .find(|f| !f.ignore && f.name == directive.version_field);
    match field {
      None => {
        return Err(PassError::MissingVersionField {
          type_name: decl.name.clone(),
          field: directive.version_field.clone(),
        });
      }
      Some(f) => {
        let ok = matches!(
          &f.elem,
          ElemKind::Primitive(p)
            if matches!(p.wire, WireType::U8 | WireType::U16 | WireType::U32 | WireType::U64)
        );
        if !ok {
          return Err(PassError::BadVersionField {
            type_name: decl.name.clone(),
            field: directive.version_field.clone(),
          });
        }
      }
    }
  }

  Ok(BoundType {
    name: decl.name.clone(),
    printable: false,
    unprintable_reason: None,
    versioned,
    elem: bind_elem(&decl.kind, Binding::place("self"), 0),
  })
}

fn bind_elem(kind: &ElemKind, bind: Binding, depth: usize) -> BoundElem {
  match kind {
    ElemKind::Primitive(p) => BoundElem::Primitive {
      bind,
      depth,
      wire: p.wire,
      shim: p.shim.clone(),
      shim_source: None,
    },

    ElemKind::Named(n) => BoundElem::Named {
      bind,
      depth,
      target: n.target.clone(),
    },

    ElemKind::Record(record) => BoundElem::Record(bind_record(record, bind, depth)),

    ElemKind::Mapping(m) => {
      let val = Binding::borrowed(format!("v{}", depth + 1));
      BoundElem::Mapping {
        bind,
        depth: depth + 1,
        value: Box::new(bind_elem(&m.value, val, depth + 1)),
      }
    }

    ElemKind::Sequence(s) => {
      let item = Binding::borrowed(format!("x{}", depth + 1));
      BoundElem::Sequence {
        bind,
        depth: depth + 1,
        elem: Box::new(bind_elem(&s.elem, item, depth + 1)),
      }
    }

    ElemKind::FixedArray(a) => {
      let item = Binding::borrowed(format!("x{}", depth + 1));
      let byte_block = is_plain_byte(&a.elem);
      BoundElem::FixedArray {
        bind,
        depth: depth + 1,
        len: a.len,
        elem: Box::new(bind_elem(&a.elem, item, depth + 1)),
        byte_block,
      }
    }

    ElemKind::Nullable(n) => {
      let inner = Binding::borrowed(format!("p{}", depth + 1));
      BoundElem::Nullable {
        bind,
        depth: depth + 1,
        inner: Box::new(bind_elem(&n.inner, inner, depth + 1)),
      }
    }
  }
}

fn bind_record(record: &RecordElem, bind: Binding, depth: usize) -> BoundRecord {
  let mut fields = Vec::new();
  for (decl_index, field) in record.fields.iter().enumerate() {
    if field.ignore {
      continue;
    }
    let place = Binding::place(format!(
      "{}.{}",
      bind.place_expr(),
      escape_keyword(&field.name)
    ));
    fields.push(BoundField {
      name: field.name.clone(),
      tag: field.tag,
      decl_index,
      elem: bind_elem(&field.elem, place, depth + 1),
    });
  }
  BoundRecord {
    bind,
    tuple: record.tuple,
    fields,
  }
}

fn is_plain_byte(kind: &ElemKind) -> bool {
  matches!(kind, ElemKind::Primitive(p) if p.wire == WireType::Byte && p.shim.is_none())
}

/* Escape Rust keywords to raw identifiers in generated field accesses */
pub fn escape_keyword(name: &str) -> String {
  const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where", "while",
    "async", "await", "dyn", "abstract", "become", "box", "do", "final", "macro", "override",
    "priv", "typeof", "unsized", "virtual", "yield", "try",
  ];

  if RUST_KEYWORDS.contains(&name) {
    format!("r#{}", name)
  } else {
    name.to_string()
  }
}

/* ------------------------------------------------------------------ */
/* Pass (a): resolve named references                                 */
/* ------------------------------------------------------------------ */

/* Named references to record declarations stay by-name (delegation keeps
   cyclic type graphs finite); references to anything else are inlined
   structurally, cycle-guarded. */
fn resolve_names(ctx: &PassContext, mut ty: BoundType) -> Result<BoundType, PassError> {
  let mut stack = Vec::new();
  ty.elem = resolve_elem(ctx, ty.elem, &mut stack);
  Ok(ty)
}

fn resolve_elem(ctx: &PassContext, elem: BoundElem, stack: &mut Vec<String>) -> BoundElem {
  match elem {
    BoundElem::Named { bind, depth, target } => {
      let decl = match ctx.decl(&target) {
        Some(d) if !d.ignore => d,
        _ => return BoundElem::Named { bind, depth, target },
      };
      match &decl.kind {
        ElemKind::Record(_) => BoundElem::Named { bind, depth, target },
        other => {
          if stack.contains(&target) {
            /* cyclic non-record reference; printability will reject it */
            return BoundElem::Named { bind, depth, target };
          }
          stack.push(target.clone());
          let mut inlined = resolve_elem(ctx, bind_elem(other, bind, depth), stack);
          stack.pop();
          if let BoundElem::Primitive { shim, shim_source, .. } = &mut inlined {
            *shim = None;
            *shim_source = Some(target);
          }
          inlined
        }
      }
    }

    BoundElem::Record(mut record) => {
      record.fields = record
        .fields
        .into_iter()
        .map(|mut f| {
          f.elem = resolve_elem(ctx, f.elem, stack);
          f
        })
        .collect();
      BoundElem::Record(record)
    }

    BoundElem::Mapping { bind, depth, value } => BoundElem::Mapping {
      bind,
      depth,
      value: Box::new(resolve_elem(ctx, *value, stack)),
    },

    BoundElem::Sequence { bind, depth, elem } => BoundElem::Sequence {
      bind,
      depth,
      elem: Box::new(resolve_elem(ctx, *elem, stack)),
    },

    BoundElem::FixedArray { bind, depth, len, elem, .. } => {
      let resolved = resolve_elem(ctx, *elem, stack);
      let byte_block = matches!(
        &resolved,
        BoundElem::Primitive { wire: WireType::Byte, shim: None, .. }
      );
      BoundElem::FixedArray {
        bind,
        depth,
        len,
        elem: Box::new(resolved),
        byte_block,
      }
    }

    BoundElem::Nullable { bind, depth, inner } => BoundElem::Nullable {
      bind,
      depth,
      inner: Box::new(resolve_elem(ctx, *inner, stack)),
    },

    prim @ BoundElem::Primitive { .. } => prim,
  }
}

/* ------------------------------------------------------------------ */
/* Pass (d): attach shim metadata from directive declarations         */
/* ------------------------------------------------------------------ */

fn attach_shims(ctx: &PassContext, mut ty: BoundType) -> Result<BoundType, PassError> {
  let type_name = ty.name.clone();
  attach_elem(ctx, &type_name, &mut ty.elem)?;
  Ok(ty)
}

fn attach_elem(ctx: &PassContext, type_name: &str, elem: &mut BoundElem) -> Result<(), PassError> {
  match elem {
    BoundElem::Primitive { wire, shim, shim_source, .. } => {
      if let Some(source) = shim_source {
        if let Some(ElemKind::Primitive(p)) = ctx.decl(source).map(|d| &d.kind) {
          *shim = p.shim.clone();
        }
      }
      if let Some(s) = shim {
        *wire = s.wire;
        if s.mode == ShimMode::Fallible && s.wire.fixed_width().is_none() {
          return Err(PassError::FallibleShimWidth {
            type_name: type_name.to_string(),
            shim_source: shim_source.clone().unwrap_or_else(|| "inline".to_string()),
          });
        }
      }
      Ok(())
    }
    BoundElem::Named { .. } => Ok(()),
    BoundElem::Record(record) => {
      for field in &mut record.fields {
        attach_elem(ctx, type_name, &mut field.elem)?;
      }
      Ok(())
    }
    BoundElem::Mapping { value, .. } => attach_elem(ctx, type_name, value),
    BoundElem::Sequence { elem, .. } => attach_elem(ctx, type_name, elem),
    BoundElem::FixedArray { elem, .. } => attach_elem(ctx, type_name, elem),
    BoundElem::Nullable { inner, .. } => attach_elem(ctx, type_name, inner),
  }
}

/* ------------------------------------------------------------------ */
/* Pass (c): deterministic field ordering                             */
/* ------------------------------------------------------------------ */

/* Total order derived from declared tags: tagged fields first by
   (tag, declaration index), untagged fields after in declaration order.
   Stable and keyed on immutable inputs, so repeated runs agree. */
fn order_fields(_ctx: &PassContext, mut ty: BoundType) -> Result<BoundType, PassError> {
  order_elem(&mut ty.elem);
  Ok(ty)
}

fn order_elem(elem: &mut BoundElem) {
  match elem {
    BoundElem::Record(record) => {
      record
        .fields
        .sort_by_key(|f| (f.tag.is_none(), f.tag.unwrap_or(0), f.decl_index));
      for field in &mut record.fields {
        order_elem(&mut field.elem);
      }
    }
    BoundElem::Mapping { value, .. } => order_elem(value),
    BoundElem::Sequence { elem, .. } => order_elem(elem),
    BoundElem::FixedArray { elem, .. } => order_elem(elem),
    BoundElem::Nullable { inner, .. } => order_elem(inner),
    BoundElem::Primitive { .. } | BoundElem::Named { .. } => {}
  }
}

/* ------------------------------------------------------------------ */
/* Pass (b): printability marking                                     */
/* ------------------------------------------------------------------ */

/* A type is printable when every reachable sub-element has a wire mapping.
   Unprintable types are skipped by every generator without error. */
fn mark_printable(ctx: &PassContext, mut ty: BoundType) -> Result<BoundType, PassError> {
  ty.unprintable_reason = elem_gap(ctx, &ty.elem);
  ty.printable = ty.unprintable_reason.is_none();
  Ok(ty)
}

fn elem_gap(ctx: &PassContext, elem: &BoundElem) -> Option<String> {
  match elem {
    BoundElem::Primitive { .. } => None,
    BoundElem::Named { target, .. } => match ctx.decl(target) {
      None => Some(format!("unresolved reference to '{}'", target)),
      Some(d) if d.ignore => Some(format!("reference to ignored type '{}'", target)),
      Some(d) if !matches!(d.kind, ElemKind::Record(_)) => Some(format!(
        "reference to '{}' is cyclic and cannot be delegated",
        target
      )),
      Some(_) => {
        let mut visiting = Vec::new();
        decl_gap(ctx, target, &mut visiting)
      }
    },
    BoundElem::Record(record) => record
      .fields
      .iter()
      .find_map(|f| elem_gap(ctx, &f.elem)),
    BoundElem::Mapping { value, .. } => elem_gap(ctx, value),
    BoundElem::Sequence { elem, .. } => elem_gap(ctx, elem),
    BoundElem::FixedArray { elem, byte_block, .. } => {
      if *byte_block {
        None
      } else {
        elem_gap(ctx, elem)
      }
    }
    BoundElem::Nullable { inner, .. } => elem_gap(ctx, inner),
  }
}

/* Reachability over the declaration table. Cycles through record
   declarations are fine (delegation by name); any other cycle has no
   finite wire form. */
fn decl_gap(ctx: &PassContext, name: &str, visiting: &mut Vec<String>) -> Option<String> {
  let decl = match ctx.decl(name) {
    None => return Some(format!("unresolved reference to '{}'", name)),
    Some(d) if d.ignore => return Some(format!("reference to ignored type '{}'", name)),
    Some(d) => d,
  };
  if visiting.iter().any(|n| n == name) {
    return if matches!(decl.kind, ElemKind::Record(_)) {
      None
    } else {
      Some(format!("cyclic reference through '{}'", name))
    };
  }
  visiting.push(name.to_string());
  let gap = kind_gap(ctx, &decl.kind, visiting);
  visiting.pop();
  gap
}

fn kind_gap(ctx: &PassContext, kind: &ElemKind, visiting: &mut Vec<String>) -> Option<String> {
  match kind {
    ElemKind::Primitive(_) => None,
    ElemKind::Named(n) => decl_gap(ctx, &n.target, visiting),
    ElemKind::Record(record) => record
      .fields
      .iter()
      .filter(|f| !f.ignore)
      .find_map(|f| kind_gap(ctx, &f.elem, visiting)),
    ElemKind::Mapping(m) => kind_gap(ctx, &m.value, visiting),
    ElemKind::Sequence(s) => kind_gap(ctx, &s.elem, visiting),
    ElemKind::FixedArray(a) => kind_gap(ctx, &a.elem, visiting),
    ElemKind::Nullable(n) => kind_gap(ctx, &n.inner, visiting),
  }
}

/* ------------------------------------------------------------------ */
/* Processing order                                                   */
/* ------------------------------------------------------------------ */

/* Dependency-safe order: referenced types before referrers, declaration
   order as the tie-break, cycle members appended in declaration order. */
pub fn process_order(ctx: &PassContext) -> Vec<String> {
  let names: Vec<String> = ctx.type_names().map(|s| s.to_string()).collect();
  let mut emitted: HashSet<String> = HashSet::new();
  let mut order = Vec::with_capacity(names.len());

  loop {
    let mut progressed = false;
    for name in &names {
      if emitted.contains(name) {
        continue;
      }
      let decl = ctx.decl(name).expect("name from table");
      let mut refs = Vec::new();
      named_refs(&decl.kind, &mut refs);
      let ready = refs
        .iter()
        .all(|r| r == name || emitted.contains(r) || ctx.decl(r).is_none());
      if ready {
        order.push(name.clone());
        emitted.insert(name.clone());
        progressed = true;
      }
    }
    if order.len() == names.len() {
      break;
    }
    if !progressed {
      /* cyclic remainder, declaration order */
      for name in &names {
        if !emitted.contains(name) {
          order.push(name.clone());
        }
      }
      break;
    }
  }

  order
}

fn named_refs(kind: &ElemKind, out: &mut Vec<String>) {
  match kind {
    ElemKind::Primitive(_) => {}
    ElemKind::Named(n) => out.push(n.target.clone()),
    ElemKind::Record(record) => {
      for field in record.fields.iter().filter(|f| !f.ignore) {
        named_refs(&field.elem, out);
      }
    }
    ElemKind::Mapping(m) => named_refs(&m.value, out),
    ElemKind::Sequence(s) => named_refs(&s.elem, out),
    ElemKind::FixedArray(a) => named_refs(&a.elem, out),
    ElemKind::Nullable(n) => named_refs(&n.inner, out),
  }
}
