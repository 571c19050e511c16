use stable_gen::codegen::encode_instructions;
use stable_gen::model::{BoundElem, BoundType, PassContext, PassError, Pipeline, process_order};
use stable_types::{
    ElemKind, MappingElem, NamedElem, PrimitiveElem, RecordElem, RecordField, SequenceElem, Shim,
    ShimMode, TypeDecl, VersionDirective, WireType,
};

fn prim(wire: WireType) -> ElemKind {
    ElemKind::Primitive(PrimitiveElem { wire, shim: None })
}

fn named(target: &str) -> ElemKind {
    ElemKind::Named(NamedElem { target: target.to_string() })
}

fn field(name: &str, elem: ElemKind) -> RecordField {
    RecordField { name: name.to_string(), tag: None, ignore: false, elem }
}

fn tagged(name: &str, tag: u32, elem: ElemKind) -> RecordField {
    RecordField { name: name.to_string(), tag: Some(tag), ignore: false, elem }
}

fn record(fields: Vec<RecordField>) -> ElemKind {
    ElemKind::Record(RecordElem { tuple: false, versioned: None, fields })
}

fn decl(name: &str, kind: ElemKind) -> TypeDecl {
    TypeDecl { name: name.to_string(), ignore: false, kind }
}

fn run_one(decls: &[TypeDecl], name: &str) -> Result<Option<BoundType>, PassError> {
    let ctx = PassContext::new(decls).unwrap();
    let decl = ctx.decl(name).unwrap().clone();
    Pipeline::standard().run(&ctx, &decl)
}

#[test]
fn ignored_type_is_removed_from_generation() {
    let mut d = decl("Gone", record(vec![field("id", prim(WireType::U32))]));
    d.ignore = true;
    assert_eq!(run_one(&[d], "Gone").unwrap(), None);
}

#[test]
fn ignored_field_is_dropped_and_count_shrinks() {
    let mut skipped = field("secret", prim(WireType::Str));
    skipped.ignore = true;
    let decls = vec![decl(
        "Rec",
        record(vec![
            field("id", prim(WireType::U32)),
            skipped,
            field("name", prim(WireType::Str)),
        ]),
    )];

    let ty = run_one(&decls, "Rec").unwrap().unwrap();
    let rec = ty.as_record().unwrap();
    assert_eq!(rec.fields.len(), 2);
    assert_eq!(rec.fields[0].name, "id");
    assert_eq!(rec.fields[1].name, "name");

    /* the mapping-shaped header must carry the post-filter count */
    let instrs = encode_instructions(&ty);
    match &instrs[0] {
        stable_types::Instr::Static { bytes } => assert_eq!(bytes, &vec![0xdf, 0, 0, 0, 2]),
        other => panic!("expected static header, got {:?}", other),
    }
}

#[test]
fn fields_order_by_tag_then_declaration() {
    let decls = vec![decl(
        "Rec",
        record(vec![
            tagged("b", 2, prim(WireType::U32)),
            tagged("a", 1, prim(WireType::U32)),
            field("z", prim(WireType::U32)),
        ]),
    )];

    let ty = run_one(&decls, "Rec").unwrap().unwrap();
    let names: Vec<&str> = ty
        .as_record()
        .unwrap()
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, vec!["a", "b", "z"]);
}

#[test]
fn pipeline_is_idempotent_across_runs() {
    let decls = vec![
        decl(
            "Rec",
            record(vec![
                tagged("b", 2, prim(WireType::U32)),
                tagged("a", 1, prim(WireType::Str)),
                field("attrs", ElemKind::Mapping(MappingElem { value: Box::new(prim(WireType::U64)) })),
            ]),
        ),
        decl("Other", record(vec![field("r", named("Rec"))])),
    ];

    let first = run_one(&decls, "Rec").unwrap().unwrap();
    let second = run_one(&decls, "Rec").unwrap().unwrap();
    assert_eq!(first, second);
}

#[test]
fn shim_metadata_attaches_from_the_target_declaration() {
    let shim = Shim {
        wire: WireType::I64,
        mode: ShimMode::Cast,
        to_wire: "shims::nanos_of".to_string(),
        from_wire: "shims::nanos_to".to_string(),
    };
    let decls = vec![
        decl(
            "Duration",
            ElemKind::Primitive(PrimitiveElem { wire: WireType::I64, shim: Some(shim.clone()) }),
        ),
        decl("Rec", record(vec![field("ttl", named("Duration"))])),
    ];

    let ty = run_one(&decls, "Rec").unwrap().unwrap();
    match &ty.as_record().unwrap().fields[0].elem {
        BoundElem::Primitive { wire, shim: attached, shim_source, .. } => {
            assert_eq!(*wire, WireType::I64);
            assert_eq!(attached.as_ref(), Some(&shim));
            assert_eq!(shim_source.as_deref(), Some("Duration"));
        }
        other => panic!("expected inlined primitive, got {:?}", other),
    }
}

#[test]
fn fallible_shim_must_target_fixed_width() {
    let shim = Shim {
        wire: WireType::Str,
        mode: ShimMode::Fallible,
        to_wire: "shims::render".to_string(),
        from_wire: "shims::parse".to_string(),
    };
    let decls = vec![decl(
        "Rec",
        record(vec![field(
            "id",
            ElemKind::Primitive(PrimitiveElem { wire: WireType::Str, shim: Some(shim) }),
        )]),
    )];

    match run_one(&decls, "Rec") {
        Err(PassError::FallibleShimWidth { type_name, .. }) => assert_eq!(type_name, "Rec"),
        other => panic!("expected FallibleShimWidth, got {:?}", other),
    }
}

#[test]
fn unresolved_reference_marks_type_unprintable() {
    let decls = vec![decl("Rec", record(vec![field("x", named("Missing"))]))];
    let ty = run_one(&decls, "Rec").unwrap().unwrap();
    assert!(!ty.printable);
    assert!(ty.unprintable_reason.as_deref().unwrap().contains("Missing"));
}

#[test]
fn reference_to_ignored_type_is_unprintable() {
    let mut gone = decl("Gone", record(vec![field("id", prim(WireType::U32))]));
    gone.ignore = true;
    let decls = vec![gone, decl("Rec", record(vec![field("g", named("Gone"))]))];
    let ty = run_one(&decls, "Rec").unwrap().unwrap();
    assert!(!ty.printable);
}

#[test]
fn record_cycles_are_printable_via_delegation() {
    let decls = vec![decl(
        "Node",
        record(vec![
            field("id", prim(WireType::U64)),
            field(
                "next",
                ElemKind::Nullable(stable_types::NullableElem { inner: Box::new(named("Node")) }),
            ),
        ]),
    )];

    let ty = run_one(&decls, "Node").unwrap().unwrap();
    assert!(ty.printable, "reason: {:?}", ty.unprintable_reason);
}

#[test]
fn non_record_cycles_are_unprintable() {
    let decls = vec![
        decl("Loop", ElemKind::Sequence(SequenceElem { elem: Box::new(named("Loop")) })),
        decl("Rec", record(vec![field("l", named("Loop"))])),
    ];

    let ty = run_one(&decls, "Rec").unwrap().unwrap();
    assert!(!ty.printable);
    assert!(ty.unprintable_reason.as_deref().unwrap().contains("Loop"));
}

#[test]
fn non_record_declarations_inline_structurally() {
    let decls = vec![
        decl("Tags", ElemKind::Sequence(SequenceElem { elem: Box::new(prim(WireType::Str)) })),
        decl("Rec", record(vec![field("tags", named("Tags"))])),
    ];

    let ty = run_one(&decls, "Rec").unwrap().unwrap();
    assert!(ty.printable);
    match &ty.as_record().unwrap().fields[0].elem {
        BoundElem::Sequence { .. } => {}
        other => panic!("expected inlined sequence, got {:?}", other),
    }
}

#[test]
fn processing_order_puts_referenced_types_first() {
    let decls = vec![
        decl("B", record(vec![field("a", named("A"))])),
        decl("A", record(vec![field("id", prim(WireType::U32))])),
        decl("C", record(vec![field("b", named("B"))])),
    ];
    let ctx = PassContext::new(&decls).unwrap();
    assert_eq!(process_order(&ctx), vec!["A", "B", "C"]);
}

#[test]
fn cyclic_types_keep_declaration_order() {
    let decls = vec![
        decl("X", record(vec![field("y", named("Y"))])),
        decl("Y", record(vec![field("x", named("X"))])),
    ];
    let ctx = PassContext::new(&decls).unwrap();
    assert_eq!(process_order(&ctx), vec!["X", "Y"]);
}

#[test]
fn duplicate_declarations_are_rejected() {
    let decls = vec![
        decl("A", record(vec![])),
        decl("A", record(vec![field("id", prim(WireType::U8))])),
    ];
    match PassContext::new(&decls) {
        Err(PassError::DuplicateType(name)) => assert_eq!(name, "A"),
        other => panic!("expected DuplicateType, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn versioned_record_requires_its_version_field() {
    let mut rec = RecordElem {
        tuple: false,
        versioned: Some(VersionDirective {
            current: "v1".to_string(),
            version_field: "ver".to_string(),
        }),
        fields: vec![field("id", prim(WireType::U32))],
    };

    let decls = vec![decl("Rec", ElemKind::Record(rec.clone()))];
    match run_one(&decls, "Rec") {
        Err(PassError::MissingVersionField { field, .. }) => assert_eq!(field, "ver"),
        other => panic!("expected MissingVersionField, got {:?}", other.map(|_| ())),
    }

    /* a string-typed version field is rejected too */
    rec.fields.push(field("ver", prim(WireType::Str)));
    let decls = vec![decl("Rec", ElemKind::Record(rec))];
    match run_one(&decls, "Rec") {
        Err(PassError::BadVersionField { field, .. }) => assert_eq!(field, "ver"),
        other => panic!("expected BadVersionField, got {:?}", other.map(|_| ())),
    }
}
