use super::chunking::ChunkingConfig;
use super::weak_ref::ReferenceHandling;
use crate::collector::{CollectorVariant, Operation};
use crate::schema::{FieldSpec, ObjectKind};
use enum_map::Enum;
use strum_macros::{Display, IntoStaticStr};

/// The three shapes a generated routine can take.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Enum, Display, IntoStaticStr)]
pub enum PlanTag {
    Unsupported,
    Delegate,
    FullBody,
}

/// Where a delegating routine forwards to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DelegateTarget {
    /// The base kind's routine for the same operation and variant.
    Base(ObjectKind),
    /// A routine the host maintains outside the generated unit.
    External { note: &'static str },
}

/// How a visited field is walked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VisitStrategy {
    /// Visit the slot, under the field's guard if it has one.
    Plain,
    /// Walk the region, skipping null slots.
    Conditional,
    /// Walk the array, enqueueing whole chunks when it is long.
    Chunked(ChunkingConfig),
    /// Visit the referent as the handling decides.
    WeakGated(ReferenceHandling),
    /// Call the nested kind's routine.
    Nested,
}

/// Why a field has no visit in a plan. Kept so audits can see every field was considered.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum Omission {
    #[strum(serialize = "never traversed")]
    Excluded,
    #[strum(serialize = "followed by the hierarchy revisit pass")]
    CoveredByRevisit,
    #[strum(serialize = "not followed by this operation")]
    NotTracedByOperation,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraversalStep {
    /// The kind assertion and prologue bindings.
    KindCheck,
    /// Verify card marks of the object before marking it.
    VerifyCardMarks,
    Header,
    Visit {
        field: &'static FieldSpec,
        strategy: VisitStrategy,
    },
    /// Register the object's hierarchy links with the revisit collaborator.
    RevisitHierarchy {
        field: &'static FieldSpec,
        collaborator: &'static str,
    },
    Omitted {
        field: &'static FieldSpec,
        reason: Omission,
    },
    /// Call the kind's own routine for another variant.
    Forward(CollectorVariant),
    AssertPermanent,
    /// A comment explaining an empty or restricted body.
    Note(&'static str),
}

impl TraversalStep {
    pub fn field(&self) -> Option<&'static FieldSpec> {
        match *self {
            TraversalStep::Visit { field, .. }
            | TraversalStep::RevisitHierarchy { field, .. }
            | TraversalStep::Omitted { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Does this step touch a reference slot of the object?
    pub fn visits_references(&self) -> bool {
        matches!(self, TraversalStep::Visit { field, .. } if field.role.visits_references())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanBody {
    Unsupported,
    Delegate {
        target: DelegateTarget,
        before: Vec<TraversalStep>,
        after: Vec<TraversalStep>,
    },
    FullBody(Vec<TraversalStep>),
}

/// The resolved routine for one (kind, operation, variant).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationPlan {
    pub kind: ObjectKind,
    pub operation: Operation,
    pub variant: CollectorVariant,
    /// The variant whose visit primitives the body calls. Differs from `variant` only when a
    /// card update walks the fields asserting instead of updating.
    pub primitives: CollectorVariant,
    pub body: PlanBody,
}

impl GenerationPlan {
    pub fn tag(&self) -> PlanTag {
        match self.body {
            PlanBody::Unsupported => PlanTag::Unsupported,
            PlanBody::Delegate { .. } => PlanTag::Delegate,
            PlanBody::FullBody(_) => PlanTag::FullBody,
        }
    }

    /// All steps of the routine's own body, in order.
    pub fn steps(&self) -> impl Iterator<Item = &TraversalStep> {
        let (first, second): (&[TraversalStep], &[TraversalStep]) = match &self.body {
            PlanBody::Unsupported => (&[], &[]),
            PlanBody::Delegate { before, after, .. } => (before.as_slice(), after.as_slice()),
            PlanBody::FullBody(steps) => (steps.as_slice(), &[]),
        };
        first.iter().chain(second.iter())
    }
}
