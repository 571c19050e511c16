/* Test generation: one hash-stability assertion per printable type */

use std::fmt::Write;

/* Lower-snake form of a type name for test function names */
fn snake_name(type_name: &str) -> String {
  let mut out = String::with_capacity(type_name.len() + 4);
  for (i, c) in type_name.chars().enumerate() {
    if c.is_ascii_uppercase() {
      if i > 0 {
        out.push('_');
      }
      out.push(c.to_ascii_lowercase());
    } else if c.is_ascii_alphanumeric() {
      out.push(c);
    } else {
      out.push('_');
    }
  }
  out
}

/* Encode twice, compare byte-for-byte, and check the size contract. The
   stability property is value-independent, so the default value is enough
   to exercise every emitted instruction on the non-null path. */
pub fn render_type_test(type_name: &str) -> String {
  let fn_name = snake_name(type_name);
  let mut out = String::new();

  writeln!(out, "#[test]").unwrap();
  writeln!(out, "fn stable_bytes_{}_is_hash_stable() {{", fn_name).unwrap();
  writeln!(out, "    let v = {}::default();", type_name).unwrap();
  writeln!(out, "    let first = v.stable_bytes().expect(\"encode\");").unwrap();
  writeln!(out, "    let second = v.stable_bytes().expect(\"encode\");").unwrap();
  writeln!(out, "    assert_eq!(first, second, \"hash not stable\");").unwrap();
  writeln!(out, "    assert_eq!(v.stable_size(), first.len(), \"size mismatch\");").unwrap();
  writeln!(out, "}}").unwrap();
  out
}
