//! Resolution of (kind, operation, variant) triples into generation plans.

pub mod chunking;
mod plan;
mod resolver;
pub mod weak_ref;

pub use chunking::{ChunkPartition, ChunkingConfig};
pub use plan::{
    DelegateTarget, GenerationPlan, Omission, PlanBody, PlanTag, TraversalStep, VisitStrategy,
};
pub use resolver::Resolver;
pub use weak_ref::{ReferenceHandling, ReferentAction, ReferentTest};
