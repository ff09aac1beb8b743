use super::FieldSpec;
use crate::collector::CollectorVariant;
use enum_map::Enum;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// The object kinds whose traversal routines are generated. The declaration order is the order
/// in which kinds appear in the generated unit.
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
pub enum ObjectKind {
    ArrayKlassKlass,
    ConstMethodKlass,
    ConstantPoolKlass,
    ConstantPoolCacheKlass,
    ConstantPoolCacheEntry,
    InstanceStatics,
    InstanceKlass,
    InstanceKlassKlass,
    InstanceRefKlass,
    KlassKlass,
    KlassItable,
    KlassVtable,
    MethodKlass,
    MethodCodeKlass,
    ObjArrayKlass,
    ObjArrayKlassKlass,
    SymbolKlass,
    TypeArrayKlass,
}

/// What the generated routine receives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Receiver {
    /// A heap object passed as `oop obj`.
    Object,
    /// A structure embedded in another object; the routine is a member called on it.
    Embedded,
}

/// Which family of routine names the kind's host class uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NameStyle {
    /// `oop_follow_contents` and friends, taking the object.
    Oop,
    /// `follow_contents` members of embedded records.
    Entry,
    /// `follow_static_fields` members of the class holding the statics.
    Statics,
}

/// How the type tag is obtained by variants that thread it through every visit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeTag {
    /// `klassId()` of the receiving class.
    Receiver,
    /// Passed in by the caller as a trailing `int klassId` parameter.
    Parameter,
    /// Computed once into a local at the top of the body.
    Local {
        decl: &'static str,
        name: &'static str,
    },
    /// Computed at each visit.
    Expr(&'static str),
}

impl TypeTag {
    /// The expression each visit passes as its tag.
    pub fn expr(&self) -> &'static str {
        match *self {
            TypeTag::Receiver => "klassId()",
            TypeTag::Parameter => "klassId",
            TypeTag::Local { name, .. } => name,
            TypeTag::Expr(e) => e,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Residency {
    /// Lives in the collected heap.
    Heap,
    /// Lives in the permanent generation and is never walked by a young collection.
    Permanent,
}

/// Where the object header is visited relative to the fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeaderPosition {
    Before,
    After,
    Omit,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct KindFlags {
    pub has_header: bool,
    pub is_array_shaped: bool,
    /// A root the collector relies on holding no outgoing references.
    pub is_weak_root: bool,
    /// A reference object whose referent is weakly held.
    pub is_reference: bool,
}

impl KindFlags {
    pub const NONE: KindFlags = KindFlags {
        has_header: false,
        is_array_shaped: false,
        is_weak_root: false,
        is_reference: false,
    };
}

/// What a card-mark update does for a kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CardRule {
    /// Walk the reference fields with the variant's update primitive.
    Traverse,
    /// Walk the reference fields, but only assert that no card needs updating.
    TraverseAsserting,
    /// Delegate to the kind's own card-mark verification routine.
    ForwardToVerify,
    /// Only assert that the object is in the permanent generation.
    AssertPermanent,
    /// Nothing to do: card marks were verified while marking the object.
    VerifiedWhileMarking,
    /// Never called.
    Trap,
}

/// Card-mark rules for the young, old and mutator update passes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CardMarkRules {
    pub young: CardRule,
    pub old: CardRule,
    pub mutator: CardRule,
}

impl CardMarkRules {
    pub const TRAVERSE: CardMarkRules = CardMarkRules {
        young: CardRule::Traverse,
        old: CardRule::Traverse,
        mutator: CardRule::Traverse,
    };
    pub const VERIFY_INSTEAD: CardMarkRules = CardMarkRules {
        young: CardRule::ForwardToVerify,
        old: CardRule::ForwardToVerify,
        mutator: CardRule::AssertPermanent,
    };
    pub const NEVER: CardMarkRules = CardMarkRules {
        young: CardRule::Trap,
        old: CardRule::Trap,
        mutator: CardRule::Trap,
    };

    /// The rule of a card-update variant. Other variants have none.
    pub fn rule_for(&self, variant: CollectorVariant) -> Option<CardRule> {
        match variant {
            CollectorVariant::NewGCCardUpdate => Some(self.young),
            CollectorVariant::OldGCCardUpdate => Some(self.old),
            CollectorVariant::MutatorCardUpdate => Some(self.mutator),
            _ => None,
        }
    }
}

/// Everything the generator knows about one object kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindDescriptor {
    pub kind: ObjectKind,
    /// The host class the routines are members of.
    pub host_class: &'static str,
    pub receiver: Receiver,
    pub name_style: NameStyle,
    pub type_tag: TypeTag,
    pub residency: Residency,
    pub flags: KindFlags,
    pub header: HeaderPosition,
    /// Delegation target for the fields this kind inherits.
    pub base: Option<ObjectKind>,
    /// Assertion opening every generated body.
    pub kind_check: Option<&'static str>,
    /// Bindings used by field address expressions.
    pub prologue: &'static [&'static str],
    /// Used in permanent-generation assertions.
    pub perm_label: &'static str,
    pub fields: &'static [FieldSpec],
    /// Variants the host class declares a routine for.
    pub entry_points: &'static [CollectorVariant],
    pub card_marks: CardMarkRules,
}

impl KindDescriptor {
    pub fn declares(&self, variant: CollectorVariant) -> bool {
        self.entry_points.contains(&variant)
    }

    /// Fields visited in the base-relative position given.
    pub fn fields_around_base(&self, after: bool) -> impl Iterator<Item = &'static FieldSpec> {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().filter(move |f| f.after_base == after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn kind_names_round_trip_through_strings() {
        for kind in ObjectKind::iter() {
            let name: &'static str = kind.into();
            assert_eq!(ObjectKind::from_str(name), Ok(kind));
            assert_eq!(kind.to_string(), name);
        }
        assert!(ObjectKind::from_str("stackChunkKlass").is_err());
    }

    #[test]
    fn tag_expressions() {
        assert_eq!(TypeTag::Receiver.expr(), "klassId()");
        assert_eq!(TypeTag::Parameter.expr(), "klassId");
        let local = TypeTag::Local {
            decl: "int kid = _klass->klassId();",
            name: "kid",
        };
        assert_eq!(local.expr(), "kid");
    }
}
