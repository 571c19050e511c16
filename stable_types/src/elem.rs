use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum WireType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    Str,
    Bin,
    Byte,
    Ext,
}

impl WireType {
    /// Encoded width in bytes when it is value-independent; `None` for
    /// length-carrying kinds (`Str`, `Bin`, `Ext`).
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            WireType::U8 | WireType::I8 | WireType::Byte => Some(2),
            WireType::U16 | WireType::I16 => Some(3),
            WireType::U32 | WireType::I32 | WireType::F32 => Some(5),
            WireType::U64 | WireType::I64 | WireType::F64 => Some(9),
            WireType::Bool => Some(1),
            WireType::Str | WireType::Bin | WireType::Ext => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum ShimMode {
    /* Conversion cannot fail; applied inline */
    Cast,
    /* Conversion returns Result; failure aborts the encode routine */
    Fallible,
}

/* User-declared conversion between a value representation and a wire kind */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Shim {
    pub wire: WireType,
    pub mode: ShimMode,
    /* Path of the value-to-wire converter function */
    pub to_wire: String,
    /* Path of the wire-to-value converter; kept for symmetry, unused by
       encode-only generation */
    pub from_wire: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct PrimitiveElem {
    pub wire: WireType,
    #[serde(default)]
    pub shim: Option<Shim>,
}

/* By-name reference to another declared type; never inlined structurally,
   which keeps cyclic type graphs finite */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct NamedElem {
    pub target: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct RecordField {
    pub name: String,
    /* Explicit order key; fields sort by (tag, declaration index) */
    #[serde(default)]
    pub tag: Option<u32>,
    #[serde(default)]
    pub ignore: bool,
    pub elem: ElemKind,
}

/* Versioning directive for a record type */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct VersionDirective {
    /* Declared current version identifier */
    pub current: String,
    /* Record field holding the stored version index at runtime */
    pub version_field: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct RecordElem {
    /* Tuple mode: sequence-style header, no mapping framing */
    #[serde(default)]
    pub tuple: bool,
    #[serde(default)]
    pub versioned: Option<VersionDirective>,
    pub fields: Vec<RecordField>,
}

/* String-keyed associative container; keys sort lexicographically on the
   wire so insertion order never reaches the output */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct MappingElem {
    pub value: Box<ElemKind>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct SequenceElem {
    pub elem: Box<ElemKind>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct FixedArrayElem {
    pub len: u64,
    pub elem: Box<ElemKind>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct NullableElem {
    pub inner: Box<ElemKind>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum ElemKind {
    Primitive(PrimitiveElem),
    Named(NamedElem),
    Record(RecordElem),
    Mapping(MappingElem),
    Sequence(SequenceElem),
    FixedArray(FixedArrayElem),
    Nullable(NullableElem),
}

impl ElemKind {
    pub fn as_record(&self) -> Option<&RecordElem> {
        match self {
            ElemKind::Record(record) => Some(record),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct TypeDecl {
    pub name: String,
    /* Excluded from generation entirely */
    #[serde(default)]
    pub ignore: bool,
    #[serde(with = "serde_yml::with::singleton_map_recursive")]
    pub kind: ElemKind,
}
