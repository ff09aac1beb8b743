//! The built-in kind table.
//!
//! Each descriptor lists the fields of one kind in the order the host lays them out. Fields the
//! kind inherits are not repeated: the kind names its base and the generated routine calls the
//! base's routine for them.

use super::field::{FieldSpec, Region, Scope};
use super::kind::*;
use crate::collector::CollectorVariant as V;

/// Every variant.
const ALL: &[V] = &[
    V::SerialMarkSweep,
    V::ParallelCompaction,
    V::GPGCYoungStrong,
    V::GPGCYoungFinal,
    V::GPGCOldStrong,
    V::GPGCOldFinal,
    V::NewGCCardUpdate,
    V::OldGCCardUpdate,
    V::MutatorCardUpdate,
    V::VerifyNoCardMark,
];

/// Kinds that are never asked to verify their card marks.
const ALL_BUT_VERIFY: &[V] = &[
    V::SerialMarkSweep,
    V::ParallelCompaction,
    V::GPGCYoungStrong,
    V::GPGCYoungFinal,
    V::GPGCOldStrong,
    V::GPGCOldFinal,
    V::NewGCCardUpdate,
    V::OldGCCardUpdate,
    V::MutatorCardUpdate,
];

/// The vtable and itable are only reached through their owning class.
const TABLES: &[V] = &[
    V::SerialMarkSweep,
    V::ParallelCompaction,
    V::GPGCYoungStrong,
    V::GPGCYoungFinal,
    V::GPGCOldStrong,
    V::GPGCOldFinal,
    V::VerifyNoCardMark,
];

const CACHE_ENTRIES: &[V] = &[
    V::SerialMarkSweep,
    V::ParallelCompaction,
    V::GPGCOldStrong,
    V::GPGCOldFinal,
    V::VerifyNoCardMark,
];

const STATICS: &[V] = &[
    V::SerialMarkSweep,
    V::ParallelCompaction,
    V::GPGCOldStrong,
    V::GPGCOldFinal,
    V::OldGCCardUpdate,
];

const KLASS_CHECK: Option<&str> = Some("assert(obj->is_klass(), \"must be klass\");");

const ARRAY_KLASS_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::ArrayKlassKlass,
    host_class: "arrayKlassKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Permanent,
    flags: KindFlags::NONE,
    header: HeaderPosition::Omit,
    base: Some(ObjectKind::KlassKlass),
    kind_check: KLASS_CHECK,
    prologue: &["arrayKlass* ak = arrayKlass::cast(klassOop(obj));"],
    perm_label: "arrayKlass",
    fields: &[
        FieldSpec::direct("lower_dimension", "ak->adr_lower_dimension()"),
        FieldSpec::direct("higher_dimension", "ak->adr_higher_dimension()"),
        FieldSpec::direct("component_mirror", "ak->adr_component_mirror()"),
        FieldSpec::nested("vtable", ObjectKind::KlassVtable, "ak->vtable()", Scope::HandleMark),
    ],
    entry_points: ALL,
    card_marks: CardMarkRules::VERIFY_INSTEAD,
};

const CONST_METHOD_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::ConstMethodKlass,
    host_class: "constMethodKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Permanent,
    flags: KindFlags::NONE,
    header: HeaderPosition::Omit,
    base: None,
    kind_check: Some("assert(obj->is_constMethod(), \"object must be constMethod\");"),
    prologue: &["constMethodOop cmo = constMethodOop(obj);"],
    perm_label: "constMethodOop",
    fields: &[
        FieldSpec::direct("method", "cmo->adr_method()"),
        FieldSpec::direct("exception_table", "cmo->adr_exception_table()"),
        FieldSpec::direct("stackmap_data", "cmo->adr_stackmap_data()"),
    ],
    entry_points: ALL,
    card_marks: CardMarkRules::VERIFY_INSTEAD,
};

const CONSTANT_POOL_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::ConstantPoolKlass,
    host_class: "constantPoolKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Permanent,
    flags: KindFlags::NONE,
    header: HeaderPosition::Omit,
    base: None,
    kind_check: Some("assert(obj->is_constantPool(), \"obj must be constant pool\");"),
    prologue: &["constantPoolOop cp = (constantPoolOop) obj;"],
    perm_label: "constantPoolOop",
    fields: &[
        FieldSpec::conditional("entries", Region::TaggedPool { pool: "cp" })
            .noted("If the tags array is null we are in the middle of allocating this constant pool"),
        FieldSpec::direct("tags", "(heapRef*)cp->tags_addr()"),
        FieldSpec::direct("cache", "cp->cache_addr()"),
        FieldSpec::direct("pool_holder", "cp->pool_holder_addr()"),
    ],
    entry_points: ALL,
    card_marks: CardMarkRules {
        young: CardRule::Trap,
        old: CardRule::VerifiedWhileMarking,
        mutator: CardRule::AssertPermanent,
    },
};

const CONSTANT_POOL_CACHE_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::ConstantPoolCacheKlass,
    host_class: "constantPoolCacheKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Permanent,
    flags: KindFlags::NONE,
    header: HeaderPosition::Omit,
    base: None,
    kind_check: Some("assert(obj->is_constantPoolCache(), \"obj must be constant pool cache\");"),
    prologue: &["constantPoolCacheOop cache = (constantPoolCacheOop)obj;"],
    perm_label: "constantPoolCacheOop",
    fields: &[
        FieldSpec::direct("constant_pool", "cache->constant_pool_addr()"),
        FieldSpec::nested_each(
            "entries",
            ObjectKind::ConstantPoolCacheEntry,
            "cache->length()",
            "cache->entry_at(i)",
        ),
    ],
    entry_points: ALL,
    card_marks: CardMarkRules::VERIFY_INSTEAD,
};

const CONSTANT_POOL_CACHE_ENTRY: KindDescriptor = KindDescriptor {
    kind: ObjectKind::ConstantPoolCacheEntry,
    host_class: "ConstantPoolCacheEntry",
    receiver: Receiver::Embedded,
    name_style: NameStyle::Entry,
    type_tag: TypeTag::Parameter,
    residency: Residency::Permanent,
    flags: KindFlags::NONE,
    header: HeaderPosition::Omit,
    base: None,
    kind_check: Some("assert(in_words(size()) == 4, \"check code below - may need adjustment\");"),
    prologue: &[],
    perm_label: "constantPoolCacheOop",
    fields: &[
        FieldSpec::direct("f1", "(heapRef*)&_f1").noted("field[1] is always oop or NULL"),
        FieldSpec::direct("f2", "(heapRef*)&_f2").guarded("is_vfinal()"),
    ],
    entry_points: CACHE_ENTRIES,
    card_marks: CardMarkRules::NEVER,
};

const INSTANCE_STATICS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::InstanceStatics,
    host_class: "instanceKlass",
    receiver: Receiver::Embedded,
    name_style: NameStyle::Statics,
    type_tag: TypeTag::Receiver,
    residency: Residency::Permanent,
    flags: KindFlags::NONE,
    header: HeaderPosition::Omit,
    base: None,
    kind_check: None,
    prologue: &[],
    perm_label: "instanceKlass",
    fields: &[FieldSpec::conditional(
        "static_fields",
        Region::Span {
            base: "start_of_static_fields()",
            len: "static_oop_field_size()",
        },
    )],
    entry_points: STATICS,
    card_marks: CardMarkRules {
        young: CardRule::Trap,
        old: CardRule::Traverse,
        mutator: CardRule::AssertPermanent,
    },
};

const INSTANCE_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::InstanceKlass,
    host_class: "instanceKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Heap,
    flags: KindFlags {
        has_header: true,
        ..KindFlags::NONE
    },
    header: HeaderPosition::Before,
    base: None,
    kind_check: Some("assert(obj != NULL, \"can't follow the content of NULL object\");"),
    prologue: &[],
    perm_label: "instanceOop",
    fields: &[FieldSpec::conditional("nonstatic_oop_maps", Region::OopMaps)],
    entry_points: ALL_BUT_VERIFY,
    card_marks: CardMarkRules::TRAVERSE,
};

const INSTANCE_KLASS_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::InstanceKlassKlass,
    host_class: "instanceKlassKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Permanent,
    flags: KindFlags::NONE,
    header: HeaderPosition::Omit,
    base: Some(ObjectKind::KlassKlass),
    kind_check: Some("assert(obj->is_klass(), \"must be a klass\");"),
    prologue: &[
        "assert(klassOop(obj)->klass_part()->oop_is_instance_slow(), \"must be instance klass\");",
        "instanceKlass* ik = instanceKlass::cast(klassOop(obj));",
    ],
    perm_label: "instanceKlass",
    fields: &[
        FieldSpec::nested("static_fields", ObjectKind::InstanceStatics, "ik", Scope::None),
        FieldSpec::nested(
            "vtable",
            ObjectKind::KlassVtable,
            "ik->vtable()",
            Scope::ResourceAndHandleMark,
        ),
        FieldSpec::nested(
            "itable",
            ObjectKind::KlassItable,
            "ik->itable()",
            Scope::ResourceAndHandleMark,
        ),
        FieldSpec::direct("array_klasses", "ik->adr_array_klasses()"),
        FieldSpec::direct("methods", "ik->adr_methods()"),
        FieldSpec::direct("method_ordering", "ik->adr_method_ordering()"),
        FieldSpec::direct("local_interfaces", "ik->adr_local_interfaces()"),
        FieldSpec::direct("transitive_interfaces", "ik->adr_transitive_interfaces()"),
        FieldSpec::direct("fields", "ik->adr_fields()"),
        FieldSpec::direct("constants", "ik->adr_constants()"),
        FieldSpec::direct("class_loader", "ik->adr_class_loader()"),
        FieldSpec::direct("source_file_name", "ik->adr_source_file_name()"),
        FieldSpec::direct("source_debug_extension", "ik->adr_source_debug_extension()"),
        FieldSpec::direct("inner_classes", "ik->adr_inner_classes()"),
        FieldSpec::direct("protection_domain", "ik->adr_protection_domain()"),
        FieldSpec::direct("signers", "ik->adr_signers()"),
        FieldSpec::direct("generic_signature", "ik->adr_generic_signature()"),
        FieldSpec::direct("class_annotations", "ik->adr_class_annotations()"),
        FieldSpec::direct("fields_annotations", "ik->adr_fields_annotations()"),
        FieldSpec::direct("methods_annotations", "ik->adr_methods_annotations()"),
        FieldSpec::direct(
            "methods_parameter_annotations",
            "ik->adr_methods_parameter_annotations()",
        ),
        FieldSpec::direct("methods_default_annotations", "ik->adr_methods_default_annotations()"),
        FieldSpec::direct("dependent_mco", "ik->adr_dependent_mco()"),
        FieldSpec::hierarchy_link("implementor", "ik->adr_implementor()")
            .noted("followed later in instanceKlass::follow_weak_klass_links()"),
        FieldSpec::conditional(
            "c_heap_oops",
            Region::Closure {
                walker: "iterate_c_heap_oops",
                subject: "ik",
            },
        )
        .after_base(),
    ],
    entry_points: ALL_BUT_VERIFY,
    card_marks: CardMarkRules {
        young: CardRule::Trap,
        old: CardRule::Traverse,
        mutator: CardRule::AssertPermanent,
    },
};

const INSTANCE_REF_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::InstanceRefKlass,
    host_class: "instanceRefKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Heap,
    flags: KindFlags {
        is_reference: true,
        ..KindFlags::NONE
    },
    header: HeaderPosition::Omit,
    base: Some(ObjectKind::InstanceKlass),
    kind_check: None,
    prologue: &[],
    perm_label: "instanceRefOop",
    fields: &[
        FieldSpec::weak_referent(
            "referent",
            "(heapRef*)java_lang_ref_Reference::referent_addr(obj)",
        )
        .heap_checked(),
        FieldSpec::direct("next", "(heapRef*)java_lang_ref_Reference::next_addr(obj)")
            .heap_checked()
            .noted("treat next as normal oop.  next is a link in the pending list."),
    ],
    entry_points: ALL_BUT_VERIFY,
    card_marks: CardMarkRules::TRAVERSE,
};

const KLASS_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::KlassKlass,
    host_class: "klassKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Permanent,
    flags: KindFlags {
        has_header: true,
        ..KindFlags::NONE
    },
    header: HeaderPosition::After,
    base: None,
    kind_check: None,
    prologue: &["Klass* k = Klass::cast(klassOop(obj));"],
    perm_label: "klass",
    fields: &[
        FieldSpec::direct("super", "k->adr_super()").noted(
            "If we are alive it is valid to keep our superclass and subtype caches alive",
        ),
        FieldSpec::direct("secondary_supers", "k->adr_secondary_supers()"),
        FieldSpec::direct("java_mirror", "k->adr_java_mirror()"),
        FieldSpec::direct("name", "k->adr_name()"),
        FieldSpec::hierarchy_link("subklass", "k->adr_subklass()"),
        FieldSpec::hierarchy_link("next_sibling", "k->adr_next_sibling()"),
    ],
    entry_points: ALL,
    card_marks: CardMarkRules::VERIFY_INSTEAD,
};

const KLASS_ITABLE: KindDescriptor = KindDescriptor {
    kind: ObjectKind::KlassItable,
    host_class: "klassItable",
    receiver: Receiver::Embedded,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Local {
        decl: "int kid = _klass->klassId();",
        name: "kid",
    },
    residency: Residency::Permanent,
    flags: KindFlags::NONE,
    header: HeaderPosition::Omit,
    base: None,
    kind_check: None,
    prologue: &[],
    perm_label: "klassItable",
    fields: &[
        FieldSpec::conditional(
            "offset_table",
            Region::Indexed {
                count: "_size_offset_table",
                slot: "(heapRef*)&offset_entry(i)->_interface",
            },
        ),
        FieldSpec::conditional(
            "method_table",
            Region::Indexed {
                count: "_size_method_table",
                slot: "(heapRef*)&method_entry(i)->_method",
            },
        ),
    ],
    entry_points: TABLES,
    card_marks: CardMarkRules::NEVER,
};

const KLASS_VTABLE: KindDescriptor = KindDescriptor {
    kind: ObjectKind::KlassVtable,
    host_class: "klassVtable",
    receiver: Receiver::Embedded,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Expr("klass()->klassId()"),
    residency: Residency::Permanent,
    flags: KindFlags::NONE,
    header: HeaderPosition::Omit,
    base: None,
    kind_check: None,
    prologue: &[],
    perm_label: "klassVtable",
    fields: &[FieldSpec::conditional(
        "methods",
        Region::Indexed {
            count: "length()",
            slot: "(heapRef*)adr_method_at(i)",
        },
    )],
    entry_points: TABLES,
    card_marks: CardMarkRules::NEVER,
};

const METHOD_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::MethodKlass,
    host_class: "methodKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Permanent,
    flags: KindFlags::NONE,
    header: HeaderPosition::Omit,
    base: None,
    kind_check: Some("assert(obj->is_method(), \"object must be method\");"),
    prologue: &["methodOop m = methodOop(obj);"],
    perm_label: "methodOop",
    fields: &[
        FieldSpec::direct("constMethod", "m->adr_constMethod()"),
        FieldSpec::direct("constants", "m->adr_constants()"),
        FieldSpec::direct("codeRef", "m->adr_codeRef()"),
        FieldSpec::direct("codeRef_list", "m->adr_codeRef_list()"),
    ],
    entry_points: ALL_BUT_VERIFY,
    card_marks: CardMarkRules {
        young: CardRule::Trap,
        old: CardRule::TraverseAsserting,
        mutator: CardRule::AssertPermanent,
    },
};

const METHOD_CODE_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::MethodCodeKlass,
    host_class: "methodCodeKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Permanent,
    flags: KindFlags::NONE,
    header: HeaderPosition::Omit,
    base: None,
    kind_check: Some("assert(obj->is_methodCode(), \"must be methodCode oop\");"),
    prologue: &["methodCodeOop m = methodCodeOop(obj);"],
    perm_label: "methodCodeOop",
    fields: &[
        FieldSpec::direct("method", "m->adr_method()"),
        FieldSpec::direct("next", "m->adr_next()"),
        FieldSpec::direct("static_refs", "m->adr_static_refs()"),
        FieldSpec::direct("mco_call_targets", "m->adr_mco_call_targets()"),
        FieldSpec::direct("dep_klasses", "m->adr_dep_klasses()"),
        FieldSpec::direct("dep_methods", "m->adr_dep_methods()"),
        FieldSpec::direct("blob_owner", "m->adr_blob_owner()"),
        FieldSpec::conditional(
            "vtable_blob_owners",
            Region::Chain {
                first: "m->first_vtable_blob()",
                next: "link->next_vtable_blob()",
                slot: "link->adr_owner()",
            },
        ),
    ],
    entry_points: ALL_BUT_VERIFY,
    card_marks: CardMarkRules {
        young: CardRule::Trap,
        old: CardRule::Traverse,
        mutator: CardRule::Traverse,
    },
};

const OBJ_ARRAY_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::ObjArrayKlass,
    host_class: "objArrayKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Heap,
    flags: KindFlags {
        has_header: true,
        is_array_shaped: true,
        ..KindFlags::NONE
    },
    header: HeaderPosition::Before,
    base: None,
    kind_check: Some("assert(obj->is_array(), \"obj must be array\");"),
    prologue: &["arrayOop a = arrayOop(obj);"],
    perm_label: "objArrayOop",
    fields: &[FieldSpec::chunkable(
        "elements",
        Region::Span {
            base: "(heapRef*)a->base(T_OBJECT)",
            len: "a->length()",
        },
    )
    .following()],
    entry_points: ALL_BUT_VERIFY,
    card_marks: CardMarkRules::TRAVERSE,
};

const OBJ_ARRAY_KLASS_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::ObjArrayKlassKlass,
    host_class: "objArrayKlassKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Permanent,
    flags: KindFlags::NONE,
    header: HeaderPosition::Omit,
    base: Some(ObjectKind::ArrayKlassKlass),
    kind_check: KLASS_CHECK,
    prologue: &[
        "assert(klassOop(obj)->klass_part()->oop_is_objArray_slow(), \"must be obj array\");",
        "objArrayKlass* oak = objArrayKlass::cast((klassOop)obj);",
    ],
    perm_label: "objArrayKlass",
    fields: &[
        FieldSpec::direct("element_klass", "oak->element_klass_addr()"),
        FieldSpec::direct("bottom_klass", "oak->bottom_klass_addr()"),
    ],
    entry_points: ALL,
    card_marks: CardMarkRules::VERIFY_INSTEAD,
};

const SYMBOL_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::SymbolKlass,
    host_class: "symbolKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Permanent,
    flags: KindFlags {
        is_weak_root: true,
        ..KindFlags::NONE
    },
    header: HeaderPosition::Omit,
    base: None,
    kind_check: Some("assert(obj->is_symbol(), \"object must be symbol\");"),
    prologue: &[],
    perm_label: "symbolOop",
    fields: &[FieldSpec::excluded("body")],
    entry_points: ALL_BUT_VERIFY,
    card_marks: CardMarkRules {
        young: CardRule::Trap,
        old: CardRule::Traverse,
        mutator: CardRule::AssertPermanent,
    },
};

const TYPE_ARRAY_KLASS: KindDescriptor = KindDescriptor {
    kind: ObjectKind::TypeArrayKlass,
    host_class: "typeArrayKlass",
    receiver: Receiver::Object,
    name_style: NameStyle::Oop,
    type_tag: TypeTag::Receiver,
    residency: Residency::Heap,
    flags: KindFlags {
        is_array_shaped: true,
        ..KindFlags::NONE
    },
    header: HeaderPosition::Omit,
    base: None,
    kind_check: Some("assert(obj->is_typeArray(), \"must be a type array\");"),
    prologue: &[],
    perm_label: "typeArrayOop",
    fields: &[FieldSpec::excluded("elements").noted("elements hold primitive data only")],
    entry_points: ALL_BUT_VERIFY,
    card_marks: CardMarkRules::TRAVERSE,
};

/// The kinds of the host runtime.
pub fn builtin_kinds() -> Vec<KindDescriptor> {
    vec![
        ARRAY_KLASS_KLASS,
        CONST_METHOD_KLASS,
        CONSTANT_POOL_KLASS,
        CONSTANT_POOL_CACHE_KLASS,
        CONSTANT_POOL_CACHE_ENTRY,
        INSTANCE_STATICS,
        INSTANCE_KLASS,
        INSTANCE_KLASS_KLASS,
        INSTANCE_REF_KLASS,
        KLASS_KLASS,
        KLASS_ITABLE,
        KLASS_VTABLE,
        METHOD_KLASS,
        METHOD_CODE_KLASS,
        OBJ_ARRAY_KLASS,
        OBJ_ARRAY_KLASS_KLASS,
        SYMBOL_KLASS,
        TYPE_ARRAY_KLASS,
    ]
}
