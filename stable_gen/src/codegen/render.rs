/* Rendering: instruction and size-term streams -> Rust source text */

use stable_types::{Instr, ShimMode, SizeTerm, WireType};
use std::fmt::Write;

fn ind(out: &mut String, level: usize) {
  for _ in 0..level {
    out.push_str("    ");
  }
}

pub fn wire_append_fn(wire: WireType) -> &'static str {
  match wire {
    WireType::U8 => "append_u8",
    WireType::U16 => "append_u16",
    WireType::U32 => "append_u32",
    WireType::U64 => "append_u64",
    WireType::I8 => "append_i8",
    WireType::I16 => "append_i16",
    WireType::I32 => "append_i32",
    WireType::I64 => "append_i64",
    WireType::F32 => "append_f32",
    WireType::F64 => "append_f64",
    WireType::Bool => "append_bool",
    WireType::Str => "append_str",
    WireType::Bin => "append_bin",
    WireType::Byte => "append_byte",
    WireType::Ext => "append_ext",
  }
}

/* Version identifiers become routine-name suffixes */
pub fn sanitize_version_id(id: &str) -> String {
  id.chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() {
        c.to_ascii_lowercase()
      } else {
        '_'
      }
    })
    .collect()
}

fn suffix_of(version_suffix: &str) -> String {
  if version_suffix.is_empty() {
    String::new()
  } else {
    format!("_{}", sanitize_version_id(version_suffix))
  }
}

fn hex_bytes(bytes: &[u8]) -> String {
  let mut s = String::with_capacity(bytes.len() * 6);
  for (i, b) in bytes.iter().enumerate() {
    if i > 0 {
      s.push_str(", ");
    }
    write!(s, "0x{:02x}", b).unwrap();
  }
  s
}

/* One encode routine, rendered at impl-block level */
pub fn render_encode_fn(version_suffix: &str, instrs: &[Instr]) -> String {
  let sfx = suffix_of(version_suffix);
  let mut out = String::new();

  ind(&mut out, 1);
  writeln!(
    out,
    "pub fn stable_bytes{}(&self) -> Result<Vec<u8>, stable_wire::WireError> {{",
    sfx
  )
  .unwrap();
  ind(&mut out, 2);
  writeln!(out, "let mut o = Vec::with_capacity(self.stable_size{}());", sfx).unwrap();

  for instr in instrs {
    render_instr(&mut out, instr, 2);
  }

  ind(&mut out, 2);
  out.push_str("Ok(o)\n");
  ind(&mut out, 1);
  out.push_str("}\n");
  out
}

fn render_instr(out: &mut String, instr: &Instr, level: usize) {
  match instr {
    Instr::Static { bytes } => {
      ind(out, level);
      writeln!(out, "o.extend_from_slice(&[{}]);", hex_bytes(bytes)).unwrap();
    }

    Instr::Scalar { wire, value } => {
      ind(out, level);
      writeln!(out, "stable_wire::{}(&mut o, {});", wire_append_fn(*wire), value).unwrap();
    }

    Instr::Convert { wire, mode, func, value, temp } => match mode {
      ShimMode::Cast => {
        let call = match wire {
          WireType::Str | WireType::Bin | WireType::Ext => format!("&{}({})", func, value),
          _ => format!("{}({})", func, value),
        };
        ind(out, level);
        writeln!(out, "stable_wire::{}(&mut o, {});", wire_append_fn(*wire), call).unwrap();
      }
      ShimMode::Fallible => {
        ind(out, level);
        writeln!(out, "let {} = {}({})?;", temp, func, value).unwrap();
        ind(out, level);
        writeln!(out, "stable_wire::{}(&mut o, {});", wire_append_fn(*wire), temp).unwrap();
      }
    },

    Instr::Ext { value } => {
      ind(out, level);
      writeln!(out, "stable_wire::append_ext(&mut o, {});", value).unwrap();
    }

    Instr::Opaque { value, temp } => {
      ind(out, level);
      writeln!(out, "let {} = {}.stable_bytes()?;", temp, value).unwrap();
      ind(out, level);
      writeln!(out, "stable_wire::append_opaque(&mut o, &{});", temp).unwrap();
    }

    Instr::RawBytes { value } => {
      ind(out, level);
      writeln!(out, "stable_wire::append_bin(&mut o, {});", value).unwrap();
    }

    Instr::Nullable { value, bind, body } => {
      ind(out, level);
      writeln!(out, "match {} {{", value).unwrap();
      ind(out, level + 1);
      out.push_str("None => stable_wire::append_nil(&mut o),\n");
      ind(out, level + 1);
      writeln!(out, "Some({}) => {{", bind).unwrap();
      for instr in body {
        render_instr(out, instr, level + 2);
      }
      ind(out, level + 1);
      out.push_str("}\n");
      ind(out, level);
      out.push_str("}\n");
    }

    Instr::MapIter { value, keys, key, val, body } => {
      ind(out, level);
      writeln!(out, "stable_wire::append_map_header(&mut o, {}.len() as u32);", value).unwrap();
      ind(out, level);
      writeln!(out, "let mut {}: Vec<&String> = {}.keys().collect();", keys, value).unwrap();
      ind(out, level);
      writeln!(out, "{}.sort();", keys).unwrap();
      ind(out, level);
      writeln!(out, "for {} in {} {{", key, keys).unwrap();
      ind(out, level + 1);
      writeln!(out, "let {} = &{}[{}];", val, value, key).unwrap();
      ind(out, level + 1);
      writeln!(out, "stable_wire::append_str(&mut o, {});", key).unwrap();
      for instr in body {
        render_instr(out, instr, level + 1);
      }
      ind(out, level);
      out.push_str("}\n");
    }

    Instr::SeqIter { value, bind, body } => {
      ind(out, level);
      writeln!(out, "stable_wire::append_array_header(&mut o, {}.len() as u32);", value).unwrap();
      ind(out, level);
      writeln!(out, "for {} in {}.iter() {{", bind, value).unwrap();
      for instr in body {
        render_instr(out, instr, level + 1);
      }
      ind(out, level);
      out.push_str("}\n");
    }

    Instr::ArrayIter { value, bind, body } => {
      ind(out, level);
      writeln!(out, "for {} in {}.iter() {{", bind, value).unwrap();
      for instr in body {
        render_instr(out, instr, level + 1);
      }
      ind(out, level);
      out.push_str("}\n");
    }
  }
}

/* One size routine, rendered at impl-block level. A fully static stream
   collapses to a bare constant. */
pub fn render_size_fn(version_suffix: &str, terms: &[SizeTerm]) -> String {
  let sfx = suffix_of(version_suffix);
  let mut out = String::new();

  ind(&mut out, 1);
  writeln!(out, "pub fn stable_size{}(&self) -> usize {{", sfx).unwrap();

  if let [SizeTerm::Const { n }] = terms {
    ind(&mut out, 2);
    writeln!(out, "{}", n).unwrap();
  } else {
    ind(&mut out, 2);
    out.push_str("let mut n: usize = 0;\n");
    for term in terms {
      render_term(&mut out, term, 2);
    }
    ind(&mut out, 2);
    out.push_str("n\n");
  }

  ind(&mut out, 1);
  out.push_str("}\n");
  out
}

fn render_term(out: &mut String, term: &SizeTerm, level: usize) {
  match term {
    SizeTerm::Const { n } => {
      ind(out, level);
      writeln!(out, "n += {};", n).unwrap();
    }

    SizeTerm::StrLen { value } => {
      ind(out, level);
      writeln!(out, "n += stable_wire::str_size({});", value).unwrap();
    }

    SizeTerm::BinLen { value } => {
      ind(out, level);
      writeln!(out, "n += stable_wire::bin_size({});", value).unwrap();
    }

    SizeTerm::ExtSize { value } => {
      ind(out, level);
      writeln!(out, "n += stable_wire::ext_size({});", value).unwrap();
    }

    SizeTerm::Nested { value } => {
      ind(out, level);
      writeln!(out, "n += {}.stable_size();", value).unwrap();
    }

    SizeTerm::LenTimes { value, each } => {
      ind(out, level);
      writeln!(out, "n += {}.len() * {};", value, each).unwrap();
    }

    SizeTerm::Nullable { value, bind, body } => {
      ind(out, level);
      writeln!(out, "match {} {{", value).unwrap();
      ind(out, level + 1);
      out.push_str("None => n += stable_wire::NIL_SIZE,\n");
      if let [SizeTerm::Const { n }] = body.as_slice() {
        ind(out, level + 1);
        writeln!(out, "Some(_) => n += {},", n).unwrap();
      } else {
        ind(out, level + 1);
        writeln!(out, "Some({}) => {{", bind).unwrap();
        for term in body {
          render_term(out, term, level + 2);
        }
        ind(out, level + 1);
        out.push_str("}\n");
      }
      ind(out, level);
      out.push_str("}\n");
    }

    SizeTerm::MapSum { value, key, val, body } => {
      if let [SizeTerm::Const { n }] = body.as_slice() {
        ind(out, level);
        writeln!(out, "for {} in {}.keys() {{", key, value).unwrap();
        ind(out, level + 1);
        writeln!(out, "n += stable_wire::str_size({}) + {};", key, n).unwrap();
      } else {
        ind(out, level);
        writeln!(out, "for ({}, {}) in {}.iter() {{", key, val, value).unwrap();
        ind(out, level + 1);
        writeln!(out, "n += stable_wire::str_size({});", key).unwrap();
        for term in body {
          render_term(out, term, level + 1);
        }
      }
      ind(out, level);
      out.push_str("}\n");
    }

    SizeTerm::SeqSum { value, bind, body } | SizeTerm::ArraySum { value, bind, body } => {
      ind(out, level);
      writeln!(out, "for {} in {}.iter() {{", bind, value).unwrap();
      for term in body {
        render_term(out, term, level + 1);
      }
      ind(out, level);
      out.push_str("}\n");
    }
  }
}

/* Assemble rendered routines into one impl block */
pub fn render_plain_impl(type_name: &str, fns: &[String]) -> String {
  let mut out = String::new();
  writeln!(out, "impl {} {{", type_name).unwrap();
  for (i, f) in fns.iter().enumerate() {
    if i > 0 {
      out.push('\n');
    }
    out.push_str(f);
  }
  out.push_str("}\n");
  out
}
