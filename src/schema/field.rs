use super::ObjectKind;

/// How a field takes part in traversal. A role is a fact about the kind, not about the
/// collector: the resolver decides how each role is walked under a given variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TraversalRole {
    /// A single reference slot, visited whenever the operation visits references at all.
    DirectRef,
    /// A region of slots visited element-wise, skipping null entries.
    ConditionalSlot,
    /// A conditional region that parallel variants may split into chunks above a size threshold.
    ChunkableSlot,
    /// A referent whose visit is gated by the collector's reachability/discovery test.
    WeakReferent,
    /// A class-hierarchy link that is only followed by a late revisit pass, never inline.
    /// Following subclass links inline would pin every class reachable from the root class.
    DeferredHierarchyLink,
    /// Never traversed by any variant.
    Excluded,
    /// Traversed by calling the generated routine of another kind for the same operation and variant.
    Nested,
}

impl TraversalRole {
    /// Does a visit of this role touch reference slots of the object itself?
    pub fn visits_references(&self) -> bool {
        matches!(
            self,
            TraversalRole::DirectRef
                | TraversalRole::ConditionalSlot
                | TraversalRole::ChunkableSlot
                | TraversalRole::WeakReferent
        )
    }
}

/// Which collector primitive visits a slot. Object arrays use the follow flavor, which lets the
/// collector scan the element right away instead of pushing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Push,
    Follow,
}

/// Host-side scope opened around a nested call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    None,
    HandleMark,
    ResourceAndHandleMark,
}

/// The address layout of an element-wise region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    /// `len` contiguous slots starting at `base`.
    Span {
        base: &'static str,
        len: &'static str,
    },
    /// `count` slots; `slot` addresses element `i`.
    Indexed {
        count: &'static str,
        slot: &'static str,
    },
    /// The blocks of the instance's non-static oop map.
    OopMaps,
    /// Constant pool entries whose tag says they hold a reference. `pool` names the pool binding.
    TaggedPool { pool: &'static str },
    /// One slot in each element of a linked chain; `next` and `slot` refer to the cursor `link`.
    Chain {
        first: &'static str,
        next: &'static str,
        slot: &'static str,
    },
    /// Slots held off-heap, walked by `walker(subject, closure)` with the variant's closure.
    Closure {
        walker: &'static str,
        subject: &'static str,
    },
}

/// How a field is addressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldShape {
    /// A single slot at the given address expression.
    Slot(&'static str),
    /// An element-wise region.
    Region(Region),
    /// A nested table whose own routine is called on `target`.
    Nested {
        kind: ObjectKind,
        target: &'static str,
        scope: Scope,
    },
    /// `count` embedded records; `record` addresses record `i`.
    NestedEach {
        kind: ObjectKind,
        count: &'static str,
        record: &'static str,
    },
    /// Contents we never address.
    Opaque,
}

impl FieldShape {
    pub fn nested_kind(&self) -> Option<ObjectKind> {
        match self {
            FieldShape::Nested { kind, .. } | FieldShape::NestedEach { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// One field of an object kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    pub name: &'static str,
    pub role: TraversalRole,
    pub shape: FieldShape,
    pub primitive: Primitive,
    /// The slot is only visited while this host predicate holds.
    pub guard: Option<&'static str>,
    /// Rendered as a comment above the visit.
    pub note: Option<&'static str>,
    /// Visited after the call into the base kind rather than before it.
    pub after_base: bool,
    /// The slot is asserted to hold null or a heap reference before it is visited.
    pub heap_checked: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, role: TraversalRole, shape: FieldShape) -> Self {
        FieldSpec {
            name,
            role,
            shape,
            primitive: Primitive::Push,
            guard: None,
            note: None,
            after_base: false,
            heap_checked: false,
        }
    }

    pub const fn direct(name: &'static str, addr: &'static str) -> Self {
        Self::new(name, TraversalRole::DirectRef, FieldShape::Slot(addr))
    }

    pub const fn conditional(name: &'static str, region: Region) -> Self {
        Self::new(name, TraversalRole::ConditionalSlot, FieldShape::Region(region))
    }

    pub const fn chunkable(name: &'static str, region: Region) -> Self {
        Self::new(name, TraversalRole::ChunkableSlot, FieldShape::Region(region))
    }

    pub const fn weak_referent(name: &'static str, addr: &'static str) -> Self {
        Self::new(name, TraversalRole::WeakReferent, FieldShape::Slot(addr))
    }

    pub const fn hierarchy_link(name: &'static str, addr: &'static str) -> Self {
        Self::new(name, TraversalRole::DeferredHierarchyLink, FieldShape::Slot(addr))
    }

    pub const fn excluded(name: &'static str) -> Self {
        Self::new(name, TraversalRole::Excluded, FieldShape::Opaque)
    }

    pub const fn nested(name: &'static str, kind: ObjectKind, target: &'static str, scope: Scope) -> Self {
        Self::new(name, TraversalRole::Nested, FieldShape::Nested { kind, target, scope })
    }

    pub const fn nested_each(
        name: &'static str,
        kind: ObjectKind,
        count: &'static str,
        record: &'static str,
    ) -> Self {
        Self::new(
            name,
            TraversalRole::Nested,
            FieldShape::NestedEach {
                kind,
                count,
                record,
            },
        )
    }

    pub const fn following(mut self) -> Self {
        self.primitive = Primitive::Follow;
        self
    }

    pub const fn guarded(mut self, guard: &'static str) -> Self {
        self.guard = Some(guard);
        self
    }

    pub const fn noted(mut self, note: &'static str) -> Self {
        self.note = Some(note);
        self
    }

    pub const fn after_base(mut self) -> Self {
        self.after_base = true;
        self
    }

    pub const fn heap_checked(mut self) -> Self {
        self.heap_checked = true;
        self
    }

    /// Check that the shape fits the role. Returns the reason on mismatch.
    pub(crate) fn shape_mismatch(&self) -> Option<&'static str> {
        let fits = match (self.role, &self.shape) {
            (TraversalRole::DirectRef, FieldShape::Slot(_))
            | (TraversalRole::WeakReferent, FieldShape::Slot(_))
            | (TraversalRole::DeferredHierarchyLink, FieldShape::Slot(_)) => true,
            (TraversalRole::ConditionalSlot, FieldShape::Region(_)) => true,
            (TraversalRole::ChunkableSlot, FieldShape::Region(Region::Span { .. })) => true,
            (TraversalRole::Nested, FieldShape::Nested { .. })
            | (TraversalRole::Nested, FieldShape::NestedEach { .. }) => true,
            (TraversalRole::Excluded, _) => true,
            _ => false,
        };
        if !fits {
            return Some("shape does not fit the traversal role");
        }
        if self.guard.is_some() && !matches!(self.shape, FieldShape::Slot(_)) {
            return Some("only single slots can be guarded");
        }
        if self.heap_checked && !matches!(self.shape, FieldShape::Slot(_)) {
            return Some("only single slots can be heap checked");
        }
        None
    }
}
