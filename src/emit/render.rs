use super::writer::CodeWriter;
use crate::collector::{CollectorVariant, VariantCatalog, VariantSpec};
use crate::resolve::{
    ChunkingConfig, DelegateTarget, GenerationPlan, PlanBody, ReferenceHandling, ReferentAction,
    TraversalStep, VisitStrategy,
};
use crate::schema::{
    FieldRegistry, FieldShape, FieldSpec, KindDescriptor, ObjectKind, Primitive, Receiver, Region,
    Scope, TypeTag,
};
use crate::util::constants::host_symbols;
use crate::util::error::{GenError, Result};
use itertools::Itertools;
use std::fmt;

const TRAP: &str = "ShouldNotReachHere();";

/// Renders one plan. Every decision was made by the resolver; this only spells it out.
pub(crate) struct RoutineRenderer<'a> {
    registry: &'a FieldRegistry,
    catalog: &'a VariantCatalog,
    plan: &'a GenerationPlan,
    desc: &'a KindDescriptor,
    spec: &'a VariantSpec,
    primitives: &'a VariantSpec,
    audit: bool,
}

impl<'a> RoutineRenderer<'a> {
    pub fn new(
        registry: &'a FieldRegistry,
        catalog: &'a VariantCatalog,
        plan: &'a GenerationPlan,
        audit: bool,
    ) -> Result<Self> {
        Ok(RoutineRenderer {
            registry,
            catalog,
            plan,
            desc: registry.descriptor(plan.kind)?,
            spec: catalog.spec(plan.variant)?,
            primitives: catalog.spec(plan.primitives)?,
            audit,
        })
    }

    pub fn render(&self, w: &mut CodeWriter) -> Result<()> {
        let signature = self.signature()?;
        match &self.plan.body {
            PlanBody::Unsupported => {
                w.open(&signature)?;
                w.line(TRAP)?;
                w.close()?;
            }
            PlanBody::Delegate {
                target: DelegateTarget::External { note },
                ..
            } => {
                w.comment(note)?;
                w.line(format_args!("// {}", signature))?;
            }
            PlanBody::Delegate {
                target: DelegateTarget::Base(base),
                before,
                after,
            } => {
                w.open(&signature)?;
                self.tag_local(w)?;
                self.steps(w, before)?;
                self.base_call(w, *base)?;
                self.steps(w, after)?;
                w.close()?;
            }
            PlanBody::FullBody(steps) => {
                w.open(&signature)?;
                self.tag_local(w)?;
                self.steps(w, steps)?;
                w.close()?;
            }
        }
        w.blank()?;
        Ok(())
    }

    fn name_of(&self, kind: ObjectKind, variant: CollectorVariant) -> Result<&'static str> {
        let desc = self.registry.descriptor(kind)?;
        self.catalog
            .spec(variant)?
            .names
            .for_style(desc.name_style)
            .ok_or_else(|| {
                GenError::malformed(kind, format!("{} has no routine name for its style", variant))
            })
    }

    pub fn signature(&self) -> Result<String> {
        let mut params = vec![];
        if let Some(manager) = self.spec.manager {
            params.push(format!("{}* {}", manager.type_name, manager.var));
        }
        match self.desc.receiver {
            Receiver::Object => params.push("oop obj".to_string()),
            Receiver::Embedded => {
                if self.spec.threads_type_tag && self.desc.type_tag == TypeTag::Parameter {
                    params.push("int klassId".to_string());
                }
            }
        }
        Ok(format!(
            "void {}::{}({})",
            self.desc.host_class,
            self.name_of(self.plan.kind, self.plan.variant)?,
            params.iter().join(", ")
        ))
    }

    fn tag_arg(&self) -> Option<&'static str> {
        self.spec
            .threads_type_tag
            .then(|| self.desc.type_tag.expr())
    }

    /// Arguments of a call: the manager, then `middle`, then the type tag of this kind.
    fn args(&self, middle: &[&str], tag: bool) -> String {
        let manager = self.spec.manager.map(|m| m.var);
        let tag = if tag { self.tag_arg() } else { None };
        manager
            .into_iter()
            .chain(middle.iter().copied())
            .chain(tag)
            .join(", ")
    }

    fn visit_call(&self, field: &FieldSpec, addr: &str) -> String {
        let primitive = match field.primitive {
            Primitive::Push => self.primitives.visit,
            Primitive::Follow => self.primitives.array_visit,
        };
        format!("{}({});", primitive, self.args(&[addr], true))
    }

    fn tag_local(&self, w: &mut CodeWriter) -> fmt::Result {
        if let TypeTag::Local { decl, .. } = self.desc.type_tag {
            if self.spec.threads_type_tag {
                w.line(decl)?;
            }
        }
        Ok(())
    }

    fn base_call(&self, w: &mut CodeWriter, base: ObjectKind) -> Result<()> {
        let host = self.registry.descriptor(base)?.host_class;
        let name = self.name_of(base, self.plan.variant)?;
        w.line(format_args!("{}::{}({});", host, name, self.args(&["obj"], false)))?;
        Ok(())
    }

    fn steps(&self, w: &mut CodeWriter, steps: &[TraversalStep]) -> Result<()> {
        for step in steps {
            trace!("{} {} {}: {:?}", self.plan.kind, self.plan.operation, self.plan.variant, step);
            self.step(w, step)?;
        }
        Ok(())
    }

    fn step(&self, w: &mut CodeWriter, step: &TraversalStep) -> Result<()> {
        match *step {
            TraversalStep::KindCheck => {
                if let Some(check) = self.desc.kind_check {
                    w.line(check)?;
                }
                for binding in self.desc.prologue {
                    w.line(binding)?;
                }
            }
            TraversalStep::VerifyCardMarks => {
                let name = self.name_of(self.plan.kind, CollectorVariant::VerifyNoCardMark)?;
                w.line(format_args!("DEBUG_ONLY( {}(obj); )", name))?;
            }
            TraversalStep::Header => {
                w.line(format_args!("obj->follow_header({});", self.args(&[], false)))?;
            }
            TraversalStep::AssertPermanent => {
                w.line(format_args!(
                    "assert(obj->is_perm(), \"{} should be in PermGen\");",
                    self.desc.perm_label
                ))?;
            }
            TraversalStep::Note(text) => w.comment(text)?,
            TraversalStep::Forward(variant) => {
                let name = self.name_of(self.plan.kind, variant)?;
                match self.desc.receiver {
                    Receiver::Object => w.line(format_args!("{}(obj);", name))?,
                    Receiver::Embedded => w.line(format_args!("{}();", name))?,
                }
            }
            TraversalStep::RevisitHierarchy {
                field,
                collaborator,
            } => {
                if let Some(note) = field.note {
                    w.comment(note)?;
                }
                w.comment("Subclass links are followed after marking, or every subclass stays alive.")?;
                w.line(format_args!(
                    "{}::revisit_weak_klass_link({});",
                    collaborator,
                    self.args(&["Klass::cast(klassOop(obj))"], false)
                ))?;
            }
            TraversalStep::Omitted { field, reason } => {
                if self.audit {
                    w.line(format_args!("// {}: {}", field.name, reason))?;
                }
            }
            TraversalStep::Visit { field, strategy } => {
                if let Some(note) = field.note {
                    w.comment(note)?;
                }
                match strategy {
                    VisitStrategy::Plain => self.plain(w, field)?,
                    VisitStrategy::Conditional => self.region(w, field)?,
                    VisitStrategy::Chunked(config) => self.chunked(w, field, config)?,
                    VisitStrategy::WeakGated(handling) => self.referent(w, field, handling)?,
                    VisitStrategy::Nested => self.nested(w, field)?,
                }
            }
        }
        Ok(())
    }

    fn plain(&self, w: &mut CodeWriter, field: &FieldSpec) -> fmt::Result {
        let FieldShape::Slot(addr) = field.shape else {
            return Ok(());
        };
        self.heap_check(w, field, addr)?;
        match field.guard {
            Some(guard) => {
                w.open(format_args!("if ({})", guard))?;
                w.line(self.visit_call(field, addr))?;
                w.close()
            }
            None => w.line(self.visit_call(field, addr)),
        }
    }

    fn heap_check(&self, w: &mut CodeWriter, field: &FieldSpec, addr: &str) -> fmt::Result {
        if field.heap_checked {
            w.line(format_args!("assert0(objectRef::is_null_or_heap({}));", addr))?;
        }
        Ok(())
    }

    /// Visit `*p` unless it is null.
    fn checked_slot(&self, w: &mut CodeWriter, field: &FieldSpec) -> fmt::Result {
        w.line("heapRef ref = UNPOISON_OBJECTREF(*p, p);")?;
        w.open("if (ref.not_null())")?;
        w.line(format_args!(
            "assert({}(ref.as_oop()), \"should be in heap\");",
            self.primitives.heap_check
        ))?;
        w.line(self.visit_call(field, "p"))?;
        w.close()
    }

    fn span_loop(&self, w: &mut CodeWriter, field: &FieldSpec) -> fmt::Result {
        w.open("for (; p < end; p++)")?;
        self.checked_slot(w, field)?;
        w.close()
    }

    fn region(&self, w: &mut CodeWriter, field: &FieldSpec) -> fmt::Result {
        let FieldShape::Region(region) = field.shape else {
            return Ok(());
        };
        match region {
            Region::Span { base, len } => {
                w.open_scope()?;
                w.line(format_args!("heapRef* p = {};", base))?;
                w.line(format_args!("heapRef* const end = p + {};", len))?;
                self.span_loop(w, field)?;
                w.close()
            }
            Region::Indexed { count, slot } => {
                w.open(format_args!("for (int i = 0; i < {}; i++)", count))?;
                w.line(format_args!("heapRef* p = {};", slot))?;
                self.checked_slot(w, field)?;
                w.close()
            }
            Region::OopMaps => {
                w.open_scope()?;
                w.line("OopMapBlock* map     = start_of_nonstatic_oop_maps();")?;
                w.line("OopMapBlock* end_map = map + nonstatic_oop_map_size();")?;
                w.open("for (; map < end_map; map++)")?;
                w.line("heapRef* p = (heapRef*)obj->ref_field_addr(map->offset());")?;
                w.line("heapRef* const end = p + map->length();")?;
                self.span_loop(w, field)?;
                w.close()?;
                w.close()
            }
            Region::TaggedPool { pool } => {
                w.open(format_args!("if ({}->tags() != NULL)", pool))?;
                let is_pointer = if self.spec.remaps_pool_tags {
                    w.line(format_args!(
                        "typeArrayOop tags = (typeArrayOop) GPGC_Collector::remap_only({}->tags_addr()).as_oop();",
                        pool
                    ))?;
                    "constantPoolOopDesc::is_pointer_entry(tags, i)".to_string()
                } else {
                    format!("{}->is_pointer_entry(i)", pool)
                };
                w.line(format_args!("heapRef* base = (heapRef*){}->base();", pool))?;
                w.open(format_args!("for (int i = 0; i < {}->length(); i++, base++)", pool))?;
                w.open(format_args!("if ({} && base->not_null())", is_pointer))?;
                w.line(self.visit_call(field, "base"))?;
                w.close()?;
                w.close()?;
                w.close()
            }
            Region::Chain { first, next, slot } => {
                w.open(format_args!(
                    "for (CodeBlob* link = {}; link != NULL; link = {})",
                    first, next
                ))?;
                w.line(format_args!("heapRef* p = {};", slot))?;
                self.checked_slot(w, field)?;
                w.close()
            }
            Region::Closure { walker, subject } => {
                let Some(closure) = self.spec.c_heap_closure else {
                    return Ok(());
                };
                match closure.prep {
                    Some(prep) => {
                        w.open_scope()?;
                        w.line(prep)?;
                        w.line(format_args!("{}({}, {});", walker, subject, closure.expr))?;
                        w.close()
                    }
                    None => w.line(format_args!("{}({}, {});", walker, subject, closure.expr)),
                }
            }
        }
    }

    /// The loop reads the collector's globals. The partition it was generated for is checked
    /// against them on entry.
    fn chunked(
        &self,
        w: &mut CodeWriter,
        field: &FieldSpec,
        config: ChunkingConfig,
    ) -> fmt::Result {
        let FieldShape::Region(Region::Span { base, len }) = field.shape else {
            return Ok(());
        };
        let Some(manager) = self.spec.manager else {
            return Ok(());
        };
        let chunk = host_symbols::ARRAY_CHUNK_SIZE;
        w.open_scope()?;
        w.line(format_args!(
            "assert({} == {} && {} == {} && {} == {}, \"array chunking constants differ from the generated ones\");",
            host_symbols::ARRAY_CHUNK_THRESHOLD,
            config.threshold,
            chunk,
            config.chunk_size,
            host_symbols::CACHE_LINE_BYTES,
            config.alignment
        ))?;
        w.line(format_args!("heapRef* p = {};", base))?;
        w.line(format_args!("heapRef* const end = p + {};", len))?;
        w.open(format_args!("if ({} > {})", len, host_symbols::ARRAY_CHUNK_THRESHOLD))?;
        w.line(format_args!(
            "heapRef* const boundary = (heapRef*) round_to(intptr_t(p), {});",
            host_symbols::CACHE_LINE_BYTES
        ))?;
        w.comment("Slots before the first cache line boundary are visited here.")?;
        w.open("for (; p < boundary && p < end; p++)")?;
        self.checked_slot(w, field)?;
        w.close()?;
        w.comment("Whole chunks go to the marking stack, where any worker may take them.")?;
        w.open(format_args!("for (; p + {} <= end; p += {})", chunk, chunk))?;
        w.line(format_args!(
            "{}->push_array_chunk_to_stack({});",
            manager.var,
            ["p", chunk].into_iter().chain(self.tag_arg()).join(", ")
        ))?;
        w.close()?;
        w.close()?;
        w.comment("The tail, or the whole array when it is short.")?;
        self.span_loop(w, field)?;
        w.close()
    }

    fn referent(
        &self,
        w: &mut CodeWriter,
        field: &FieldSpec,
        handling: ReferenceHandling,
    ) -> fmt::Result {
        let FieldShape::Slot(addr) = field.shape else {
            return Ok(());
        };
        let Some(test) = handling.test() else {
            w.line("// treat referent as normal oop")?;
            self.heap_check(w, field, addr)?;
            return w.line(self.visit_call(field, addr));
        };
        let act = |w: &mut CodeWriter, action: ReferentAction| match action {
            ReferentAction::Defer => match handling {
                ReferenceHandling::Discover { .. } => {
                    w.line("// reference grabbed by ref_processor, referent will be traversed later")
                }
                _ => w.line("// referent left for reference processing"),
            },
            ReferentAction::Visit => {
                w.line("// treat referent as normal oop")?;
                w.line(self.visit_call(field, "referent_addr"))
            }
        };
        w.open_scope()?;
        w.line(format_args!("heapRef* referent_addr = {};", addr))?;
        self.heap_check(w, field, "referent_addr")?;
        w.line("heapRef referent = ALWAYS_UNPOISON_OBJECTREF(*referent_addr);")?;
        w.open("if (referent.not_null())")?;
        w.open(format_args!(
            "if ({}::{}({}))",
            test.collector,
            test.predicate,
            self.args(&["referent", "obj", "reference_type()"], false)
        ))?;
        act(w, test.action(true))?;
        w.reopen("else")?;
        act(w, test.action(false))?;
        w.close()?;
        w.close()?;
        w.close()
    }

    fn nested(&self, w: &mut CodeWriter, field: &FieldSpec) -> Result<()> {
        let Some(kind) = field.shape.nested_kind() else {
            return Ok(());
        };
        let nested = self.registry.descriptor(kind)?;
        let name = self.name_of(kind, self.plan.variant)?;
        let args = self.args(&[], nested.type_tag == TypeTag::Parameter);
        match field.shape {
            FieldShape::Nested { target, scope, .. } => {
                let call = match nested.receiver {
                    Receiver::Embedded => format!("{}->{}({});", target, name, args),
                    Receiver::Object => format!(
                        "{}::{}({});",
                        nested.host_class,
                        name,
                        self.spec
                            .manager
                            .map(|m| m.var)
                            .into_iter()
                            .chain(std::iter::once(target))
                            .join(", ")
                    ),
                };
                match scope {
                    Scope::None => w.line(call)?,
                    Scope::HandleMark | Scope::ResourceAndHandleMark => {
                        w.open_scope()?;
                        if scope == Scope::ResourceAndHandleMark {
                            w.line("ResourceMark rm;")?;
                        }
                        w.line("HandleMark hm;")?;
                        w.line(call)?;
                        w.close()?;
                    }
                }
            }
            FieldShape::NestedEach { count, record, .. } => {
                w.line(format_args!(
                    "for (int i = {} - 1; i >= 0; i--) {}->{}({});",
                    count, record, name, args
                ))?;
            }
            _ => {}
        }
        Ok(())
    }
}
