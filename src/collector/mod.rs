//! Collector variants and the traversal operations they implement.

mod catalog;
mod operation;
mod variant;

pub use catalog::{Override, VariantCatalog, BUILTIN_CATALOG};
pub use operation::Operation;
pub use variant::{
    AddressingConvention, ClosureArg, CollectorVariant, Generation, ManagerArg, RoutineNames,
    VariantSpec,
};
