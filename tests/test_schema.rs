use closuregen::collector::VariantCatalog;
use closuregen::schema::{builtin_kinds, FieldSpec, KindDescriptor, Region, TraversalRole};
use closuregen::{CollectorVariant, FieldRegistry, GenError, Generator, ObjectKind, Options};

fn kinds_with(kind: ObjectKind, f: impl Fn(&mut KindDescriptor)) -> Vec<KindDescriptor> {
    builtin_kinds()
        .into_iter()
        .map(|mut d| {
            if d.kind == kind {
                f(&mut d);
            }
            d
        })
        .collect()
}

fn kinds_without(kind: ObjectKind) -> Vec<KindDescriptor> {
    builtin_kinds().into_iter().filter(|d| d.kind != kind).collect()
}

fn assert_malformed(result: Result<FieldRegistry, GenError>, expected: ObjectKind) {
    match result {
        Err(GenError::MalformedSchema { kind, .. }) => assert_eq!(kind, expected),
        other => panic!("expected a malformed {} schema, got {:?}", expected, other.map(|_| ())),
    }
}

#[test]
fn builtin_registry_holds_every_kind() {
    let registry = FieldRegistry::builtin().unwrap();
    assert_eq!(registry.kinds().count(), 18);
    assert_eq!(registry.lookup("SymbolKlass").unwrap(), ObjectKind::SymbolKlass);
    assert_eq!(
        registry.base_kind(ObjectKind::ObjArrayKlassKlass).unwrap(),
        Some(ObjectKind::ArrayKlassKlass)
    );
    assert_eq!(
        registry.lookup("PackageKlass"),
        Err(GenError::UnknownKind("PackageKlass".to_string()))
    );
}

#[test]
fn unregistered_kinds_are_unknown() {
    let registry = FieldRegistry::new(kinds_without(ObjectKind::TypeArrayKlass)).unwrap();
    assert!(matches!(
        registry.descriptor(ObjectKind::TypeArrayKlass),
        Err(GenError::UnknownKind(_))
    ));
    assert!(registry.lookup("TypeArrayKlass").is_err());
}

#[test]
fn dangling_base_is_malformed() {
    assert_malformed(
        FieldRegistry::new(kinds_without(ObjectKind::ArrayKlassKlass)),
        ObjectKind::ObjArrayKlassKlass,
    );
}

#[test]
fn dangling_nested_kind_is_malformed() {
    assert_malformed(
        FieldRegistry::new(kinds_without(ObjectKind::KlassItable)),
        ObjectKind::InstanceKlassKlass,
    );
}

#[test]
fn chunkable_field_needs_an_array_kind() {
    const FIELDS: &[FieldSpec] = &[FieldSpec::chunkable(
        "methods",
        Region::Span {
            base: "(heapRef*)m->base()",
            len: "m->length()",
        },
    )];
    assert_malformed(
        FieldRegistry::new(kinds_with(ObjectKind::MethodKlass, |d| d.fields = FIELDS)),
        ObjectKind::MethodKlass,
    );
}

#[test]
fn weak_roots_hold_no_traversed_fields() {
    const FIELDS: &[FieldSpec] = &[FieldSpec::direct("body", "obj->body_addr()")];
    assert_malformed(
        FieldRegistry::new(kinds_with(ObjectKind::SymbolKlass, |d| d.fields = FIELDS)),
        ObjectKind::SymbolKlass,
    );
}

#[test]
fn weak_referent_needs_a_reference_kind() {
    const FIELDS: &[FieldSpec] = &[FieldSpec::weak_referent("referent", "obj->referent_addr()")];
    assert_malformed(
        FieldRegistry::new(kinds_with(ObjectKind::MethodKlass, |d| d.fields = FIELDS)),
        ObjectKind::MethodKlass,
    );
}

#[test]
fn reference_kind_needs_a_link_after_the_referent() {
    const FIELDS: &[FieldSpec] = &[FieldSpec::weak_referent("referent", "obj->referent_addr()")];
    assert_malformed(
        FieldRegistry::new(kinds_with(ObjectKind::InstanceRefKlass, |d| d.fields = FIELDS)),
        ObjectKind::InstanceRefKlass,
    );
}

#[test]
fn duplicate_descriptors_are_malformed() {
    let mut kinds = builtin_kinds();
    kinds.push(kinds[0].clone());
    assert_malformed(FieldRegistry::new(kinds), ObjectKind::ArrayKlassKlass);
}

#[test]
fn builtin_fields_keep_their_roles() {
    let registry = FieldRegistry::builtin().unwrap();
    let roles: Vec<TraversalRole> = registry
        .fields(ObjectKind::InstanceRefKlass)
        .unwrap()
        .iter()
        .map(|f| f.role)
        .collect();
    assert_eq!(roles, vec![TraversalRole::WeakReferent, TraversalRole::DirectRef]);
}

#[test]
fn generator_needs_every_declared_variant() {
    let mut catalog = VariantCatalog::new();
    catalog.register(
        CollectorVariant::SerialMarkSweep,
        *CollectorVariant::SerialMarkSweep.builtin_spec(),
    );
    let err = Generator::new(FieldRegistry::builtin().unwrap(), catalog, Options::builtin())
        .unwrap_err();
    assert!(matches!(err, GenError::UnknownVariant(_)), "{}", err);
}

#[test]
fn chunk_pushing_variant_needs_a_manager() {
    let mut catalog = VariantCatalog::builtin();
    let mut spec = *CollectorVariant::GPGCOldFinal.builtin_spec();
    spec.manager = None;
    catalog.register(CollectorVariant::GPGCOldFinal, spec);
    let err = Generator::new(FieldRegistry::builtin().unwrap(), catalog, Options::builtin())
        .unwrap_err();
    assert_eq!(
        err,
        GenError::MalformedVariant {
            variant: CollectorVariant::GPGCOldFinal,
            reason: "pushes array chunks but has no manager to push them to".to_string(),
        }
    );
}

#[test]
fn errors_name_the_offender() {
    let err = FieldRegistry::new(kinds_without(ObjectKind::ArrayKlassKlass)).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("ObjArrayKlassKlass"), "{}", message);
    assert!(message.contains("ArrayKlassKlass is not registered"), "{}", message);
}

/// The fields each kind visits, in the order the host lays them out.
const HOST_FIELDS: &[(ObjectKind, &[&str])] = &[
    (
        ObjectKind::ArrayKlassKlass,
        &["lower_dimension", "higher_dimension", "component_mirror", "vtable"],
    ),
    (
        ObjectKind::ConstMethodKlass,
        &["method", "exception_table", "stackmap_data"],
    ),
    (
        ObjectKind::ConstantPoolKlass,
        &["entries", "tags", "cache", "pool_holder"],
    ),
    (ObjectKind::ConstantPoolCacheKlass, &["constant_pool", "entries"]),
    (ObjectKind::ConstantPoolCacheEntry, &["f1", "f2"]),
    (ObjectKind::InstanceStatics, &["static_fields"]),
    (ObjectKind::InstanceKlass, &["nonstatic_oop_maps"]),
    (
        ObjectKind::InstanceKlassKlass,
        &[
            "static_fields",
            "vtable",
            "itable",
            "array_klasses",
            "methods",
            "method_ordering",
            "local_interfaces",
            "transitive_interfaces",
            "fields",
            "constants",
            "class_loader",
            "source_file_name",
            "source_debug_extension",
            "inner_classes",
            "protection_domain",
            "signers",
            "generic_signature",
            "class_annotations",
            "fields_annotations",
            "methods_annotations",
            "methods_parameter_annotations",
            "methods_default_annotations",
            "dependent_mco",
            "implementor",
            "c_heap_oops",
        ],
    ),
    (ObjectKind::InstanceRefKlass, &["referent", "next"]),
    (
        ObjectKind::KlassKlass,
        &[
            "super",
            "secondary_supers",
            "java_mirror",
            "name",
            "subklass",
            "next_sibling",
        ],
    ),
    (ObjectKind::KlassItable, &["offset_table", "method_table"]),
    (ObjectKind::KlassVtable, &["methods"]),
    (
        ObjectKind::MethodKlass,
        &["constMethod", "constants", "codeRef", "codeRef_list"],
    ),
    (
        ObjectKind::MethodCodeKlass,
        &[
            "method",
            "next",
            "static_refs",
            "mco_call_targets",
            "dep_klasses",
            "dep_methods",
            "blob_owner",
            "vtable_blob_owners",
        ],
    ),
    (ObjectKind::ObjArrayKlass, &["elements"]),
    (ObjectKind::ObjArrayKlassKlass, &["element_klass", "bottom_klass"]),
    (ObjectKind::SymbolKlass, &["body"]),
    (ObjectKind::TypeArrayKlass, &["elements"]),
];

#[test]
fn builtin_fields_match_the_host_layout() {
    let registry = FieldRegistry::builtin().unwrap();
    assert_eq!(HOST_FIELDS.len(), registry.kinds().count());
    for &(kind, expected) in HOST_FIELDS {
        let names: Vec<&str> = registry
            .fields(kind)
            .unwrap()
            .iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, expected, "{}", kind);
    }
}

#[test]
fn klass_routines_visit_only_reference_slots() {
    let g = Generator::with_options(Options::builtin()).unwrap();
    for (kind, op, variant) in g.entry_points().unwrap() {
        if kind != ObjectKind::KlassKlass {
            continue;
        }
        let mut text = String::new();
        g.emit_triple(kind, op, variant, &mut text).unwrap();
        assert!(!text.contains("secondary_super_cache"), "{} {}:\n{}", op, variant, text);
    }
}

#[test]
fn array_klass_dimensions_come_before_the_mirror() {
    let g = Generator::with_options(Options::builtin()).unwrap();
    let mut text = String::new();
    g.emit_triple(
        ObjectKind::ArrayKlassKlass,
        closuregen::Operation::FollowContents,
        CollectorVariant::SerialMarkSweep,
        &mut text,
    )
    .unwrap();
    let lower = text.find("adr_lower_dimension").unwrap();
    let higher = text.find("adr_higher_dimension").unwrap();
    let mirror = text.find("adr_component_mirror").unwrap();
    assert!(lower < higher && higher < mirror, "{}", text);
}
