use crate::elem::{ShimMode, WireType};
use serde_derive::{Deserialize, Serialize};

/* One emit step of a generated encode routine.
 *
 * `value` fields hold rendered Rust expressions (field accesses or binding
 * identifiers assigned during traversal). Binding identifiers are derived
 * from tree depth, so an instruction stream is reproducible byte-for-byte
 * across regenerations — which is what allows frozen streams in the version
 * manifest to render identically forever.
 */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum Instr {
    /* Statically-known bytes; adjacent runs are coalesced by fusion */
    Static { bytes: Vec<u8> },

    /* Append one primitive value of the given wire kind */
    Scalar { wire: WireType, value: String },

    /* Shim conversion, then append the converted value */
    Convert {
        wire: WireType,
        mode: ShimMode,
        func: String,
        value: String,
        temp: String,
    },

    /* Append a generic extension value through the ExtValue trait */
    Ext { value: String },

    /* Splice a nested type's own encoded output as an opaque block */
    Opaque { value: String, temp: String },

    /* Whole fixed byte array as a single binary block */
    RawBytes { value: String },

    /* Null check: absent emits the nil sentinel, present runs `body`
       with `bind` holding the unwrapped value */
    Nullable {
        value: String,
        bind: String,
        body: Vec<Instr>,
    },

    /* Mapping: runtime header from entry count, keys collected and sorted
       lexicographically, each entry emits the key string then `body` */
    MapIter {
        value: String,
        keys: String,
        key: String,
        val: String,
        body: Vec<Instr>,
    },

    /* Sequence: runtime header from length, then `body` per element */
    SeqIter {
        value: String,
        bind: String,
        body: Vec<Instr>,
    },

    /* Fixed array body loop; the static header is emitted separately */
    ArrayIter {
        value: String,
        bind: String,
        body: Vec<Instr>,
    },
}

/* One additive term of a generated size routine. Mirrors `Instr` so the
 * size of any value equals the length of its encoding exactly. */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum SizeTerm {
    Const { n: u64 },

    /* Length-carrying primitives: header + payload length */
    StrLen { value: String },
    BinLen { value: String },
    ExtSize { value: String },

    /* A nested type's own size routine */
    Nested { value: String },

    /* Container of constant-size elements: length * per-element bytes */
    LenTimes { value: String, each: u64 },

    Nullable {
        value: String,
        bind: String,
        body: Vec<SizeTerm>,
    },

    /* Mapping: header + per-entry key string + value terms */
    MapSum {
        value: String,
        key: String,
        val: String,
        body: Vec<SizeTerm>,
    },

    /* Sequence: header + per-element terms */
    SeqSum {
        value: String,
        bind: String,
        body: Vec<SizeTerm>,
    },

    /* Fixed array elements; the static header is a separate Const */
    ArraySum {
        value: String,
        bind: String,
        body: Vec<SizeTerm>,
    },
}
