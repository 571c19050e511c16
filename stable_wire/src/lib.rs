//! Wire-append runtime for generated stable codecs.
//!
//! One canonical, fixed-width representation per operation: headers and
//! length prefixes are always their 32-bit forms and integers are always
//! full-width tagged values. This makes every size helper exact (never an
//! upper bound), which the generated `stable_size` routines rely on, and it
//! trivially guarantees that equal values produce identical bytes.

use thiserror::Error;

pub const TAG_NIL: u8 = 0xc0;
pub const TAG_FALSE: u8 = 0xc2;
pub const TAG_TRUE: u8 = 0xc3;
pub const TAG_BIN32: u8 = 0xc6;
pub const TAG_EXT32: u8 = 0xc9;
pub const TAG_F32: u8 = 0xca;
pub const TAG_F64: u8 = 0xcb;
pub const TAG_U8: u8 = 0xcc;
pub const TAG_U16: u8 = 0xcd;
pub const TAG_U32: u8 = 0xce;
pub const TAG_U64: u8 = 0xcf;
pub const TAG_I8: u8 = 0xd0;
pub const TAG_I16: u8 = 0xd1;
pub const TAG_I32: u8 = 0xd2;
pub const TAG_I64: u8 = 0xd3;
pub const TAG_STR32: u8 = 0xdb;
pub const TAG_ARRAY32: u8 = 0xdd;
pub const TAG_MAP32: u8 = 0xdf;

/* Header and length prefixes are 1 tag byte + u32 BE */
pub const HEADER_SIZE: usize = 5;
pub const NIL_SIZE: usize = 1;
pub const BOOL_SIZE: usize = 1;
/* ext: tag + u32 len + i8 type */
pub const EXT_OVERHEAD: usize = 6;

/// Runtime failure surface of generated encode routines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("unrecognized stored version index {0}")]
    UnknownVersion(usize),

    #[error("shim conversion failed: {0}")]
    Convert(String),
}

/// A value carried in the generic extension slot.
pub trait ExtValue {
    fn ext_type(&self) -> i8;
    fn ext_payload(&self) -> &[u8];
}

pub fn append_array_header(o: &mut Vec<u8>, n: u32) {
    o.push(TAG_ARRAY32);
    o.extend_from_slice(&n.to_be_bytes());
}

pub fn append_map_header(o: &mut Vec<u8>, n: u32) {
    o.push(TAG_MAP32);
    o.extend_from_slice(&n.to_be_bytes());
}

pub fn append_nil(o: &mut Vec<u8>) {
    o.push(TAG_NIL);
}

pub fn append_bool(o: &mut Vec<u8>, v: bool) {
    o.push(if v { TAG_TRUE } else { TAG_FALSE });
}

pub fn append_u8(o: &mut Vec<u8>, v: u8) {
    o.push(TAG_U8);
    o.push(v);
}

pub fn append_u16(o: &mut Vec<u8>, v: u16) {
    o.push(TAG_U16);
    o.extend_from_slice(&v.to_be_bytes());
}

pub fn append_u32(o: &mut Vec<u8>, v: u32) {
    o.push(TAG_U32);
    o.extend_from_slice(&v.to_be_bytes());
}

pub fn append_u64(o: &mut Vec<u8>, v: u64) {
    o.push(TAG_U64);
    o.extend_from_slice(&v.to_be_bytes());
}

pub fn append_i8(o: &mut Vec<u8>, v: i8) {
    o.push(TAG_I8);
    o.push(v as u8);
}

pub fn append_i16(o: &mut Vec<u8>, v: i16) {
    o.push(TAG_I16);
    o.extend_from_slice(&v.to_be_bytes());
}

pub fn append_i32(o: &mut Vec<u8>, v: i32) {
    o.push(TAG_I32);
    o.extend_from_slice(&v.to_be_bytes());
}

pub fn append_i64(o: &mut Vec<u8>, v: i64) {
    o.push(TAG_I64);
    o.extend_from_slice(&v.to_be_bytes());
}

pub fn append_f32(o: &mut Vec<u8>, v: f32) {
    o.push(TAG_F32);
    o.extend_from_slice(&v.to_be_bytes());
}

pub fn append_f64(o: &mut Vec<u8>, v: f64) {
    o.push(TAG_F64);
    o.extend_from_slice(&v.to_be_bytes());
}

/* A lone byte travels as u8 */
pub fn append_byte(o: &mut Vec<u8>, v: u8) {
    append_u8(o, v);
}

pub fn append_str(o: &mut Vec<u8>, v: &str) {
    o.push(TAG_STR32);
    o.extend_from_slice(&(v.len() as u32).to_be_bytes());
    o.extend_from_slice(v.as_bytes());
}

pub fn append_bin(o: &mut Vec<u8>, v: &[u8]) {
    o.push(TAG_BIN32);
    o.extend_from_slice(&(v.len() as u32).to_be_bytes());
    o.extend_from_slice(v);
}

pub fn append_ext(o: &mut Vec<u8>, v: &dyn ExtValue) {
    let payload = v.ext_payload();
    o.push(TAG_EXT32);
    o.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    o.push(v.ext_type() as u8);
    o.extend_from_slice(payload);
}

/* Splice a nested type's already-encoded output */
pub fn append_opaque(o: &mut Vec<u8>, encoded: &[u8]) {
    o.extend_from_slice(encoded);
}

pub fn str_size(v: &str) -> usize {
    HEADER_SIZE + v.len()
}

pub fn bin_size(v: &[u8]) -> usize {
    HEADER_SIZE + v.len()
}

pub fn ext_size(v: &dyn ExtValue) -> usize {
    EXT_OVERHEAD + v.ext_payload().len()
}
