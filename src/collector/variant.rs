use super::Operation;
use crate::resolve::weak_ref::ReferenceHandling;
use crate::schema::NameStyle;
use enum_map::Enum;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// A collector flavor that gets its own traversal routine. Declaration order is emission order
/// within a (kind, operation).
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Enum,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
pub enum CollectorVariant {
    SerialMarkSweep,
    ParallelCompaction,
    GPGCYoungStrong,
    GPGCYoungFinal,
    GPGCOldStrong,
    GPGCOldFinal,
    NewGCCardUpdate,
    OldGCCardUpdate,
    MutatorCardUpdate,
    VerifyNoCardMark,
}

/// Which generation a variant walks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Generation {
    /// Only objects of the young generation. Permanent objects are never reached.
    Young,
    Old,
    /// Whatever the pass is handed.
    Any,
}

/// The per-worker manager a variant threads through its routines.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ManagerArg {
    pub type_name: &'static str,
    pub var: &'static str,
}

/// The closure a variant hands to walkers of off-heap reference slots.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClosureArg {
    /// A declaration needed before the closure can be passed.
    pub prep: Option<&'static str>,
    pub expr: &'static str,
}

/// Routine names per naming style.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RoutineNames {
    pub oop: &'static str,
    pub entry: Option<&'static str>,
    pub statics: Option<&'static str>,
}

impl RoutineNames {
    pub fn for_style(&self, style: NameStyle) -> Option<&'static str> {
        match style {
            NameStyle::Oop => Some(self.oop),
            NameStyle::Entry => self.entry,
            NameStyle::Statics => self.statics,
        }
    }
}

/// What the emitter needs to know to spell a call for a variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AddressingConvention {
    pub needs_manager_arg: bool,
    pub threads_type_tag: bool,
}

/// Everything the generator knows about one collector variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VariantSpec {
    pub operation: Operation,
    pub generation: Generation,
    pub names: RoutineNames,
    pub manager: Option<ManagerArg>,
    /// Every visit carries the receiving class's type tag.
    pub threads_type_tag: bool,
    /// Visits one slot.
    pub visit: &'static str,
    /// Visits one element of an object array.
    pub array_visit: &'static str,
    /// Predicate a loaded reference must satisfy, asserted in region walks.
    pub heap_check: &'static str,
    pub follows_header: bool,
    /// Long object arrays are split into chunks that other workers can steal.
    pub pushes_array_chunks: bool,
    pub reference_handling: ReferenceHandling,
    /// Collaborator that revisits class-hierarchy links at the end of marking.
    pub hierarchy_revisit: Option<&'static str>,
    pub c_heap_closure: Option<ClosureArg>,
    /// The tags array of a constant pool may still hold an unremapped address.
    pub remaps_pool_tags: bool,
    /// Card marks of kinds that rely on it are verified while this variant marks them.
    pub verifies_card_marks: bool,
}

impl VariantSpec {
    /// A variant that visits with `visit` and does nothing else.
    pub const fn plain(operation: Operation, names: RoutineNames, visit: &'static str) -> Self {
        VariantSpec {
            operation,
            generation: Generation::Any,
            names,
            manager: None,
            threads_type_tag: false,
            visit,
            array_visit: visit,
            heap_check: GPGC_HEAP_CHECK,
            follows_header: false,
            pushes_array_chunks: false,
            reference_handling: ReferenceHandling::Strong,
            hierarchy_revisit: None,
            c_heap_closure: None,
            remaps_pool_tags: true,
            verifies_card_marks: false,
        }
    }

    pub fn addressing_convention(&self) -> AddressingConvention {
        AddressingConvention {
            needs_manager_arg: self.manager.is_some(),
            threads_type_tag: self.threads_type_tag,
        }
    }
}

const GPGC_HEAP_CHECK: &str = "Universe::is_in_allocation_area";
const RESERVED_HEAP_CHECK: &str = "Universe::heap()->is_in_reserved";

const FOLLOW_NAMES: RoutineNames = RoutineNames {
    oop: "oop_follow_contents",
    entry: Some("follow_contents"),
    statics: Some("follow_static_fields"),
};

const GPGC_FOLLOW_NAMES: RoutineNames = RoutineNames {
    oop: "GPGC_oop_follow_contents",
    entry: Some("GPGC_follow_contents"),
    statics: Some("GPGC_follow_static_fields"),
};

/// Young collections never reach embedded records or statics, which live in the permanent generation.
const GPGC_YOUNG_NAMES: RoutineNames = RoutineNames {
    entry: None,
    statics: None,
    ..GPGC_FOLLOW_NAMES
};

const fn card_names(oop: &'static str) -> RoutineNames {
    RoutineNames {
        oop,
        entry: None,
        statics: None,
    }
}

const GPGC_OLD_CLOSURE: ClosureArg = ClosureArg {
    prep: None,
    expr: "gcm->mark_and_push_closure()",
};

pub const SERIAL_MARK_SWEEP: VariantSpec = VariantSpec {
    array_visit: "MarkSweep::mark_and_follow",
    heap_check: RESERVED_HEAP_CHECK,
    follows_header: true,
    reference_handling: ReferenceHandling::Discover {
        collector: "MarkSweep",
    },
    hierarchy_revisit: Some("MarkSweep"),
    c_heap_closure: Some(ClosureArg {
        prep: None,
        expr: "&MarkSweep::mark_and_push_closure",
    }),
    remaps_pool_tags: false,
    ..VariantSpec::plain(
        Operation::FollowContents,
        FOLLOW_NAMES,
        "MarkSweep::mark_and_push",
    )
};

pub const PARALLEL_COMPACTION: VariantSpec = VariantSpec {
    manager: Some(ManagerArg {
        type_name: "ParCompactionManager",
        var: "cm",
    }),
    array_visit: "PSParallelCompact::mark_and_follow",
    heap_check: RESERVED_HEAP_CHECK,
    follows_header: true,
    reference_handling: ReferenceHandling::Discover {
        collector: "PSParallelCompact",
    },
    hierarchy_revisit: Some("PSParallelCompact"),
    c_heap_closure: Some(ClosureArg {
        prep: Some("PSParallelCompact::MarkAndPushClosure mark_and_push_closure(cm);"),
        expr: "&mark_and_push_closure",
    }),
    remaps_pool_tags: false,
    ..VariantSpec::plain(
        Operation::FollowContents,
        FOLLOW_NAMES,
        "PSParallelCompact::mark_and_push",
    )
};

pub const GPGC_YOUNG_STRONG: VariantSpec = VariantSpec {
    generation: Generation::Young,
    manager: Some(ManagerArg {
        type_name: "GPGC_GCManagerNewStrong",
        var: "gcm",
    }),
    threads_type_tag: true,
    array_visit: "GPGC_NewCollector::mark_and_follow",
    pushes_array_chunks: true,
    reference_handling: ReferenceHandling::MarkThrough {
        collector: "GPGC_NewCollector",
    },
    ..VariantSpec::plain(
        Operation::FollowContents,
        GPGC_YOUNG_NAMES,
        "GPGC_NewCollector::mark_and_push",
    )
};

pub const GPGC_YOUNG_FINAL: VariantSpec = VariantSpec {
    generation: Generation::Young,
    manager: Some(ManagerArg {
        type_name: "GPGC_GCManagerNewFinal",
        var: "gcm",
    }),
    array_visit: "GPGC_NewCollector::mark_and_follow",
    pushes_array_chunks: true,
    ..VariantSpec::plain(
        Operation::FollowContents,
        GPGC_YOUNG_NAMES,
        "GPGC_NewCollector::mark_and_push",
    )
};

pub const GPGC_OLD_STRONG: VariantSpec = VariantSpec {
    generation: Generation::Old,
    manager: Some(ManagerArg {
        type_name: "GPGC_GCManagerOldStrong",
        var: "gcm",
    }),
    threads_type_tag: true,
    array_visit: "GPGC_OldCollector::mark_and_follow",
    pushes_array_chunks: true,
    reference_handling: ReferenceHandling::MarkThrough {
        collector: "GPGC_OldCollector",
    },
    hierarchy_revisit: Some("GPGC_OldCollector"),
    c_heap_closure: Some(GPGC_OLD_CLOSURE),
    verifies_card_marks: true,
    ..VariantSpec::plain(
        Operation::FollowContents,
        GPGC_FOLLOW_NAMES,
        "GPGC_OldCollector::mark_and_push",
    )
};

pub const GPGC_OLD_FINAL: VariantSpec = VariantSpec {
    generation: Generation::Old,
    manager: Some(ManagerArg {
        type_name: "GPGC_GCManagerOldFinal",
        var: "gcm",
    }),
    array_visit: "GPGC_OldCollector::mark_and_follow",
    pushes_array_chunks: true,
    c_heap_closure: Some(GPGC_OLD_CLOSURE),
    ..VariantSpec::plain(
        Operation::FollowContents,
        GPGC_FOLLOW_NAMES,
        "GPGC_OldCollector::mark_and_push",
    )
};

pub const NEW_GC_CARD_UPDATE: VariantSpec = VariantSpec::plain(
    Operation::UpdateCardMark,
    card_names("GPGC_newgc_oop_update_cardmark"),
    "GPGC_NewCollector::update_card_mark",
);

pub const OLD_GC_CARD_UPDATE: VariantSpec = VariantSpec::plain(
    Operation::UpdateCardMark,
    RoutineNames {
        statics: Some("GPGC_static_fields_update_cardmark"),
        ..card_names("GPGC_oldgc_oop_update_cardmark")
    },
    "GPGC_OldCollector::update_card_mark",
);

pub const MUTATOR_CARD_UPDATE: VariantSpec = VariantSpec::plain(
    Operation::UpdateCardMark,
    card_names("GPGC_mutator_oop_update_cardmark"),
    "GPGC_NewCollector::mutator_update_card_mark",
);

pub const VERIFY_NO_CARD_MARK: VariantSpec = VariantSpec::plain(
    Operation::VerifyNoCardMark,
    RoutineNames {
        entry: Some("GPGC_verify_no_cardmark"),
        ..card_names("GPGC_verify_no_cardmark")
    },
    "GPGC_Collector::assert_no_card_mark",
);

impl CollectorVariant {
    /// The built-in description of this variant.
    pub const fn builtin_spec(&self) -> &'static VariantSpec {
        match self {
            CollectorVariant::SerialMarkSweep => &SERIAL_MARK_SWEEP,
            CollectorVariant::ParallelCompaction => &PARALLEL_COMPACTION,
            CollectorVariant::GPGCYoungStrong => &GPGC_YOUNG_STRONG,
            CollectorVariant::GPGCYoungFinal => &GPGC_YOUNG_FINAL,
            CollectorVariant::GPGCOldStrong => &GPGC_OLD_STRONG,
            CollectorVariant::GPGCOldFinal => &GPGC_OLD_FINAL,
            CollectorVariant::NewGCCardUpdate => &NEW_GC_CARD_UPDATE,
            CollectorVariant::OldGCCardUpdate => &OLD_GC_CARD_UPDATE,
            CollectorVariant::MutatorCardUpdate => &MUTATOR_CARD_UPDATE,
            CollectorVariant::VerifyNoCardMark => &VERIFY_NO_CARD_MARK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn only_strong_passes_thread_the_type_tag() {
        let threading: Vec<CollectorVariant> = CollectorVariant::iter()
            .filter(|v| v.builtin_spec().threads_type_tag)
            .collect();
        assert_eq!(
            threading,
            vec![
                CollectorVariant::GPGCYoungStrong,
                CollectorVariant::GPGCOldStrong
            ]
        );
    }

    #[test]
    fn chunking_variants_have_a_manager() {
        for v in CollectorVariant::iter() {
            let spec = v.builtin_spec();
            if spec.pushes_array_chunks {
                assert!(spec.manager.is_some(), "{}", v);
            }
        }
    }

    #[test]
    fn parallel_compaction_passes_its_manager() {
        let conv = CollectorVariant::ParallelCompaction
            .builtin_spec()
            .addressing_convention();
        assert!(conv.needs_manager_arg);
        assert!(!conv.threads_type_tag);
        assert!(!CollectorVariant::SerialMarkSweep
            .builtin_spec()
            .addressing_convention()
            .needs_manager_arg);
    }

    #[test]
    fn card_passes_name_their_static_routine() {
        assert_eq!(
            OLD_GC_CARD_UPDATE.names.for_style(NameStyle::Statics),
            Some("GPGC_static_fields_update_cardmark")
        );
        assert_eq!(NEW_GC_CARD_UPDATE.names.for_style(NameStyle::Statics), None);
        assert_eq!(
            GPGC_OLD_STRONG.names.for_style(NameStyle::Entry),
            Some("GPGC_follow_contents")
        );
    }
}
