/* Versioning subsystem tests: history recovery, legacy freezing,
 * append-only enforcement, and dispatcher emission across regenerations. */

use stable_gen::cmds::codegen::emit_type;
use stable_gen::codegen::{generate_body, render_encode_fn};
use stable_gen::model::{BoundType, PassContext, Pipeline};
use stable_gen::version::{
    LEGACY_VERSION_ID, VersionError, merge_manifest, plan_versions,
};
use stable_loader::manifest::{FrozenBody, TypeManifest, VersionEntry, VersionManifest};
use stable_types::{
    ElemKind, PrimitiveElem, RecordElem, RecordField, TypeDecl, VersionDirective, WireType,
};

fn prim(wire: WireType) -> ElemKind {
    ElemKind::Primitive(PrimitiveElem { wire, shim: None })
}

fn field(name: &str, elem: ElemKind) -> RecordField {
    RecordField { name: name.to_string(), tag: None, ignore: false, elem }
}

fn account_decl(versioned: Option<&str>, extra_field: bool) -> TypeDecl {
    let mut fields = vec![
        field("ver", prim(WireType::U32)),
        field("name", prim(WireType::Str)),
    ];
    if extra_field {
        fields.push(field("balance", prim(WireType::U64)));
    }
    TypeDecl {
        name: "Account".to_string(),
        ignore: false,
        kind: ElemKind::Record(RecordElem {
            tuple: false,
            versioned: versioned.map(|current| VersionDirective {
                current: current.to_string(),
                version_field: "ver".to_string(),
            }),
            fields,
        }),
    }
}

fn bind(decl: &TypeDecl) -> BoundType {
    let decls = vec![decl.clone()];
    let ctx = PassContext::new(&decls).unwrap();
    Pipeline::standard().run(&ctx, decl).unwrap().unwrap()
}

#[test]
fn first_generation_has_no_history() {
    let ty = bind(&account_decl(Some("v1"), false));
    let plan = plan_versions("Account", "v1", None).unwrap();
    assert_eq!(plan.slots.len(), 1);
    assert_eq!(plan.slots[0].id, "v1");
    assert!(plan.slots[0].frozen.is_none());
    assert_eq!(plan.current_index, 0);
    assert_eq!(plan.max_index(), 0);

    let (text, entry) = emit_type(&ty, None).unwrap();
    assert!(text.contains("pub fn stable_bytes_v1"));
    assert!(text.contains("pub fn stable_version(&self)"));
    assert_eq!(entry.version_ids(), vec!["v1"]);
}

#[test]
fn unversioned_bodies_freeze_as_legacy_on_opt_in() {
    /* run 1: unversioned */
    let plain = bind(&account_decl(None, false));
    let (_, plain_entry) = emit_type(&plain, None).unwrap();
    assert!(plain_entry.versions.is_empty());
    let frozen = plain_entry.current.clone().expect("current bodies recorded");

    /* run 2: the type opts into versioning with a new current id */
    let versioned = bind(&account_decl(Some("v2"), true));
    let plan = plan_versions("Account", "v2", Some(&plain_entry)).unwrap();
    assert_eq!(plan.slots.len(), 2);
    assert_eq!(plan.slots[0].id, LEGACY_VERSION_ID);
    assert_eq!(plan.slots[0].frozen.as_ref(), Some(&frozen));
    assert_eq!(plan.slots[1].id, "v2");
    assert_eq!(plan.current_index, 1);

    let (text, entry) = emit_type(&versioned, Some(&plain_entry)).unwrap();
    assert!(text.contains("pub fn stable_bytes_legacy"));
    assert!(text.contains("pub fn stable_bytes_v2"));
    assert_eq!(entry.version_ids(), vec![LEGACY_VERSION_ID, "v2"]);

    /* the frozen legacy encode body is the run-1 body, untouched */
    assert_eq!(entry.versions[0].body, frozen);
}

#[test]
fn historical_routines_render_identically_after_regeneration() {
    /* run 1: versioned at v1 */
    let v1 = bind(&account_decl(Some("v1"), false));
    let (_, entry1) = emit_type(&v1, None).unwrap();
    let v1_render = render_encode_fn("v1", &entry1.versions[0].body.encode);

    /* run 2: field added, version bumped to v2 */
    let v2 = bind(&account_decl(Some("v2"), true));
    let (text, entry2) = emit_type(&v2, Some(&entry1)).unwrap();

    assert_eq!(entry2.version_ids(), vec!["v1", "v2"]);
    /* property: the old version's frozen body renders byte-identically */
    assert_eq!(entry2.versions[0].body, entry1.versions[0].body);
    assert!(text.contains(&v1_render));

    /* dispatcher still routes the old stored index to the old routine */
    assert!(text.contains("0 => self.stable_bytes_v1(),"));
    assert!(text.contains("1 => self.stable_bytes_v2(),"));
    assert!(text.contains("_ => Err(stable_wire::WireError::UnknownVersion(self.stable_version())),"));
    assert!(text.contains("pub fn stable_max_version() -> usize {\n        1\n    }"));
    assert!(text.contains("pub fn stable_default_version() -> usize {\n        1\n    }"));
}

#[test]
fn rerun_without_version_bump_regenerates_current_only() {
    let v1 = bind(&account_decl(Some("v1"), false));
    let (_, entry1) = emit_type(&v1, None).unwrap();

    let plan = plan_versions("Account", "v1", Some(&entry1)).unwrap();
    assert_eq!(plan.slots.len(), 1);
    assert!(plan.slots[0].frozen.is_none(), "current slot regenerates fresh");

    /* unchanged shape regenerates an identical body */
    let (_, entry_again) = emit_type(&v1, Some(&entry1)).unwrap();
    assert_eq!(entry_again, entry1);
}

#[test]
fn conflicting_histories_are_fatal_to_the_type() {
    let body = FrozenBody { encode: Vec::new(), size: Vec::new() };
    let dup = TypeManifest {
        name: "Account".to_string(),
        versions: vec![
            VersionEntry { id: "v1".to_string(), body: body.clone() },
            VersionEntry { id: "v1".to_string(), body: body.clone() },
        ],
        current: None,
    };
    match plan_versions("Account", "v2", Some(&dup)) {
        Err(VersionError::DuplicateRecorded { id, .. }) => assert_eq!(id, "v1"),
        other => panic!("expected DuplicateRecorded, got {:?}", other),
    }

    let two = TypeManifest {
        name: "Account".to_string(),
        versions: vec![
            VersionEntry { id: "v1".to_string(), body: body.clone() },
            VersionEntry { id: "v2".to_string(), body },
        ],
        current: None,
    };
    /* re-targeting an older recorded version cannot regenerate it */
    match plan_versions("Account", "v1", Some(&two)) {
        Err(VersionError::CurrentNotLast { id, index, .. }) => {
            assert_eq!(id, "v1");
            assert_eq!(index, 0);
        }
        other => panic!("expected CurrentNotLast, got {:?}", other),
    }
}

#[test]
fn dropping_the_versioned_directive_is_rejected() {
    let v1 = bind(&account_decl(Some("v1"), false));
    let (_, entry1) = emit_type(&v1, None).unwrap();

    let plain = bind(&account_decl(None, false));
    match emit_type(&plain, Some(&entry1)) {
        Err(VersionError::HistoryRewritten { type_name }) => assert_eq!(type_name, "Account"),
        other => panic!("expected HistoryRewritten, got {:?}", other),
    }
}

#[test]
fn merge_preserves_recorded_history_and_carries_forward_removed_types() {
    let body = FrozenBody { encode: Vec::new(), size: Vec::new() };
    let mut old = VersionManifest::default();
    old.upsert_type(TypeManifest {
        name: "Kept".to_string(),
        versions: vec![VersionEntry { id: "v1".to_string(), body: body.clone() }],
        current: None,
    });
    old.upsert_type(TypeManifest {
        name: "Removed".to_string(),
        versions: vec![VersionEntry { id: "v1".to_string(), body: body.clone() }],
        current: None,
    });

    let update = TypeManifest {
        name: "Kept".to_string(),
        versions: vec![
            VersionEntry { id: "v1".to_string(), body: body.clone() },
            VersionEntry { id: "v2".to_string(), body: body.clone() },
        ],
        current: None,
    };
    let merged = merge_manifest(Some(&old), vec![update]).unwrap();
    assert_eq!(merged.get_type("Kept").unwrap().version_ids(), vec!["v1", "v2"]);
    /* a type absent from this run keeps its recorded history */
    assert_eq!(merged.get_type("Removed").unwrap().version_ids(), vec!["v1"]);

    /* reordering or truncating recorded ids is rejected */
    let rewrite = TypeManifest {
        name: "Kept".to_string(),
        versions: vec![VersionEntry { id: "v2".to_string(), body }],
        current: None,
    };
    match merge_manifest(Some(&old), vec![rewrite]) {
        Err(VersionError::HistoryRewritten { type_name }) => assert_eq!(type_name, "Kept"),
        other => panic!("expected HistoryRewritten, got {:?}", other),
    }
}

#[test]
fn versioned_impl_contains_dispatchers_before_routines() {
    let ty = bind(&account_decl(Some("v1"), false));
    let (text, _) = emit_type(&ty, None).unwrap();

    /* the encode dispatcher guards the version index before any byte is
       produced; the unknown-version arm returns without writing */
    let dispatcher_at = text.find("pub fn stable_bytes(&self)").unwrap();
    let routine_at = text.find("pub fn stable_bytes_v1(&self)").unwrap();
    assert!(dispatcher_at < routine_at);
    assert!(text.contains("pub fn stable_size(&self)"));
    assert!(text.contains("self.ver as usize"));
}

#[test]
fn generated_bodies_are_deterministic() {
    let ty = bind(&account_decl(None, true));
    assert_eq!(generate_body(&ty), generate_body(&ty));
}

/* End-to-end regeneration through the command layer, manifest on disk */
#[test]
fn codegen_command_round_trips_the_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let schema_v1 = r#"
schema:
  package: demo.ledger
  schema-version: 1
  description: ledger shapes
types:
  - name: Account
    kind:
      record:
        versioned:
          current: v1
          version-field: ver
        fields:
          - name: ver
            elem:
              primitive:
                wire: u32
          - name: name
            elem:
              primitive:
                wire: str
"#;
    let schema_path = dir.path().join("ledger.yaml");
    std::fs::write(&schema_path, schema_v1).unwrap();
    let out_dir = dir.path().join("generated");

    stable_gen::cmds::codegen::run(
        vec![schema_path.clone()],
        Vec::new(),
        out_dir.clone(),
        None,
        true,
        false,
    )
    .unwrap();

    let codec = out_dir.join("demo/ledger/codec.rs");
    assert!(codec.exists());
    let text1 = std::fs::read_to_string(&codec).unwrap();
    assert!(text1.contains("pub fn stable_bytes_v1"));
    assert!(out_dir.join("demo/ledger/codec_tests.rs").exists());
    assert!(out_dir.join("demo/ledger/mod.rs").exists());

    let manifest_path = out_dir.join("stable_manifest.yaml");
    let manifest1 = VersionManifest::load(&manifest_path).unwrap().unwrap();
    assert_eq!(manifest1.get_type("Account").unwrap().version_ids(), vec!["v1"]);

    /* regenerate with a new field under v2: v1 must survive frozen */
    let schema_v2 = schema_v1.replace("current: v1", "current: v2")
        + "          - name: balance\n            elem:\n              primitive:\n                wire: u64\n";
    std::fs::write(&schema_path, schema_v2).unwrap();

    stable_gen::cmds::codegen::run(
        vec![schema_path],
        Vec::new(),
        out_dir.clone(),
        None,
        true,
        false,
    )
    .unwrap();

    let text2 = std::fs::read_to_string(&codec).unwrap();
    assert!(text2.contains("pub fn stable_bytes_v1"));
    assert!(text2.contains("pub fn stable_bytes_v2"));

    let manifest2 = VersionManifest::load(&manifest_path).unwrap().unwrap();
    let account = manifest2.get_type("Account").unwrap();
    assert_eq!(account.version_ids(), vec!["v1", "v2"]);
    assert_eq!(
        account.versions[0].body,
        manifest1.get_type("Account").unwrap().versions[0].body
    );
}
