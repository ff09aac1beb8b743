use super::chunking::ChunkingConfig;
use super::plan::*;
use super::weak_ref::ReferenceHandling;
use crate::collector::{
    CollectorVariant, Generation, Operation, Override, VariantCatalog, VariantSpec,
};
use crate::schema::{
    CardRule, FieldRegistry, FieldShape, HeaderPosition, KindDescriptor, ObjectKind, Region,
    Residency, TraversalRole,
};
use crate::util::error::{GenError, Result};

const WEAK_ROOT_NOTE: &str = "Symbols are weak roots: the symbol table is swept without locks \
on the assumption that symbols reference no other objects. Never add a reference traversal here.";

const VERIFIED_WHILE_MARKING_NOTE: &str =
    "Nothing to update: card marks of this kind are verified while the old collector marks it.";

/// Derives the traversal routine of every (kind, operation, variant) from the registry and the
/// variant catalog.
pub struct Resolver<'a> {
    registry: &'a FieldRegistry,
    catalog: &'a VariantCatalog,
    chunking: ChunkingConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(
        registry: &'a FieldRegistry,
        catalog: &'a VariantCatalog,
        chunking: ChunkingConfig,
    ) -> Self {
        Resolver {
            registry,
            catalog,
            chunking,
        }
    }

    /// Resolve one triple. Total for every registered kind and variant, whether or not the kind
    /// declares a routine for the variant.
    pub fn resolve(
        &self,
        kind: ObjectKind,
        op: Operation,
        variant: CollectorVariant,
    ) -> Result<GenerationPlan> {
        let desc = self.registry.descriptor(kind)?;
        let spec = self.catalog.spec(variant)?;
        let plan = |primitives: CollectorVariant, body: PlanBody| GenerationPlan {
            kind,
            operation: op,
            variant,
            primitives,
            body,
        };

        // A young pass reaching a permanent object means the heap is already corrupt.
        if spec.operation != op
            || (spec.generation == Generation::Young && desc.residency == Residency::Permanent)
        {
            return Ok(plan(variant, PlanBody::Unsupported));
        }

        if let Some(Override::External { note }) = self.catalog.override_for(kind, op, variant) {
            return Ok(plan(
                variant,
                PlanBody::Delegate {
                    target: DelegateTarget::External { note },
                    before: vec![],
                    after: vec![],
                },
            ));
        }

        let mut primitives = variant;
        if op == Operation::UpdateCardMark {
            match desc.card_marks.rule_for(variant).unwrap_or(CardRule::Traverse) {
                CardRule::Trap => return Ok(plan(variant, PlanBody::Unsupported)),
                CardRule::ForwardToVerify => {
                    let steps = vec![TraversalStep::Forward(CollectorVariant::VerifyNoCardMark)];
                    return Ok(plan(variant, PlanBody::FullBody(steps)));
                }
                CardRule::AssertPermanent => {
                    let steps = vec![TraversalStep::AssertPermanent];
                    return Ok(plan(variant, PlanBody::FullBody(steps)));
                }
                CardRule::VerifiedWhileMarking => {
                    let steps = vec![TraversalStep::Note(VERIFIED_WHILE_MARKING_NOTE)];
                    return Ok(plan(variant, PlanBody::FullBody(steps)));
                }
                CardRule::TraverseAsserting => {
                    self.catalog.spec(CollectorVariant::VerifyNoCardMark)?;
                    primitives = CollectorVariant::VerifyNoCardMark;
                }
                CardRule::Traverse => {}
            }
        }

        let body = self.traversal(desc, op, spec);
        Ok(plan(primitives, body))
    }

    fn traversal(&self, desc: &KindDescriptor, op: Operation, spec: &VariantSpec) -> PlanBody {
        let mut before = vec![];
        if desc.kind_check.is_some() || !desc.prologue.is_empty() {
            before.push(TraversalStep::KindCheck);
        }
        if spec.verifies_card_marks
            && desc.card_marks.rule_for(CollectorVariant::OldGCCardUpdate)
                == Some(CardRule::VerifiedWhileMarking)
        {
            before.push(TraversalStep::VerifyCardMarks);
        }
        if desc.flags.is_weak_root {
            before.push(TraversalStep::Note(WEAK_ROOT_NOTE));
        }
        let follows_header = spec.follows_header && desc.flags.has_header;
        if follows_header && desc.header == HeaderPosition::Before {
            before.push(TraversalStep::Header);
        }

        let delegating = desc.base.is_some();
        // Derived kinds leave hierarchy links to the revisit their base registers.
        let mut revisit_pending = !delegating;
        before.extend(self.field_steps(desc, op, spec, false, &mut revisit_pending));
        let mut after = self.field_steps(desc, op, spec, true, &mut revisit_pending);
        if follows_header && desc.header == HeaderPosition::After {
            after.push(TraversalStep::Header);
        }

        match desc.base {
            Some(base) => PlanBody::Delegate {
                target: DelegateTarget::Base(base),
                before,
                after,
            },
            None => {
                before.extend(after);
                PlanBody::FullBody(before)
            }
        }
    }

    fn field_steps(
        &self,
        desc: &KindDescriptor,
        op: Operation,
        spec: &VariantSpec,
        after_base: bool,
        revisit_pending: &mut bool,
    ) -> Vec<TraversalStep> {
        desc.fields_around_base(after_base)
            .map(|field| {
                let visit = |strategy| TraversalStep::Visit { field, strategy };
                let omit = |reason| TraversalStep::Omitted { field, reason };
                match field.role {
                    TraversalRole::DirectRef => visit(VisitStrategy::Plain),
                    TraversalRole::Nested => visit(VisitStrategy::Nested),
                    TraversalRole::ConditionalSlot => match field.shape {
                        FieldShape::Region(Region::Closure { .. })
                            if spec.c_heap_closure.is_none() =>
                        {
                            omit(Omission::NotTracedByOperation)
                        }
                        _ => visit(VisitStrategy::Conditional),
                    },
                    TraversalRole::ChunkableSlot if spec.pushes_array_chunks => {
                        visit(VisitStrategy::Chunked(self.chunking))
                    }
                    TraversalRole::ChunkableSlot => visit(VisitStrategy::Conditional),
                    TraversalRole::WeakReferent => {
                        let handling = if op.is_marking() {
                            spec.reference_handling
                        } else {
                            ReferenceHandling::Strong
                        };
                        visit(VisitStrategy::WeakGated(handling))
                    }
                    TraversalRole::DeferredHierarchyLink => match op {
                        Operation::VerifyNoCardMark => visit(VisitStrategy::Plain),
                        Operation::UpdateCardMark => omit(Omission::NotTracedByOperation),
                        Operation::FollowContents if !*revisit_pending => {
                            omit(Omission::CoveredByRevisit)
                        }
                        Operation::FollowContents => {
                            *revisit_pending = false;
                            match spec.hierarchy_revisit {
                                Some(collaborator) => TraversalStep::RevisitHierarchy {
                                    field,
                                    collaborator,
                                },
                                None => omit(Omission::NotTracedByOperation),
                            }
                        }
                    },
                    TraversalRole::Excluded => omit(Omission::Excluded),
                }
            })
            .collect()
    }

    /// Check that every declared routine can be generated and that everything it calls exists.
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.catalog.validate()?;
        for kind in self.registry.kinds() {
            let desc = self.registry.descriptor(kind)?;
            for &variant in desc.entry_points {
                let spec = self.catalog.spec(variant)?;
                if spec.names.for_style(desc.name_style).is_none() {
                    return Err(GenError::malformed(
                        kind,
                        format!("{} has no {:?}-style routine name", variant, desc.name_style),
                    ));
                }
                let plan = self.resolve(kind, spec.operation, variant)?;
                self.validate_plan(&plan)?;
            }
        }
        Ok(())
    }

    fn validate_plan(&self, plan: &GenerationPlan) -> Result<()> {
        let (kind, op, variant) = (plan.kind, plan.operation, plan.variant);
        if let PlanBody::Delegate {
            target: DelegateTarget::Base(base),
            ..
        } = plan.body
        {
            self.require_routine(kind, base, op, variant)?;
        }
        for step in plan.steps() {
            match *step {
                TraversalStep::Visit {
                    field,
                    strategy: VisitStrategy::Nested,
                } => {
                    if let Some(nested) = field.shape.nested_kind() {
                        self.require_routine(kind, nested, op, variant)?;
                    }
                }
                TraversalStep::Omitted {
                    field,
                    reason: Omission::NotTracedByOperation,
                } if field.role.visits_references() => {
                    return Err(GenError::malformed(
                        kind,
                        format!("{} {} cannot walk field `{}`", variant, op, field.name),
                    ));
                }
                TraversalStep::Forward(target) => {
                    let target_op = self.catalog.spec(target)?.operation;
                    self.require_routine(kind, kind, target_op, target)?;
                }
                TraversalStep::VerifyCardMarks => {
                    self.require_routine(
                        kind,
                        kind,
                        Operation::VerifyNoCardMark,
                        CollectorVariant::VerifyNoCardMark,
                    )?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn require_routine(
        &self,
        caller: ObjectKind,
        callee: ObjectKind,
        op: Operation,
        variant: CollectorVariant,
    ) -> Result<()> {
        let declared = self.registry.descriptor(callee)?.declares(variant);
        if !declared || self.resolve(callee, op, variant)?.tag() == PlanTag::Unsupported {
            return Err(GenError::malformed(
                caller,
                format!("calls the {} {} routine of {}, which does not exist", variant, op, callee),
            ));
        }
        Ok(())
    }
}
