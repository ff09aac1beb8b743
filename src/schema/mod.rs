//! The object-kind schema: which kinds exist, what fields they hold and how each field takes
//! part in traversal.

mod field;
mod kind;
mod kinds;
mod registry;

pub use field::{FieldShape, FieldSpec, Primitive, Region, Scope, TraversalRole};
pub use kind::{
    CardMarkRules, CardRule, HeaderPosition, KindDescriptor, KindFlags, NameStyle, ObjectKind,
    Receiver, Residency, TypeTag,
};
pub use kinds::builtin_kinds;
pub use registry::FieldRegistry;
