//! Rendering of generation plans into host-language routine definitions.

mod render;
mod writer;

use crate::collector::VariantCatalog;
use crate::resolve::GenerationPlan;
use crate::schema::FieldRegistry;
use crate::util::error::Result;
use crate::util::options::Options;
use render::RoutineRenderer;
use std::fmt;
use writer::CodeWriter;

/// Turns plans into text. Holds no state between routines.
pub struct Emitter<'a> {
    registry: &'a FieldRegistry,
    catalog: &'a VariantCatalog,
    audit_comments: bool,
}

impl<'a> Emitter<'a> {
    pub fn new(registry: &'a FieldRegistry, catalog: &'a VariantCatalog, options: &Options) -> Self {
        Emitter {
            registry,
            catalog,
            audit_comments: options.emit_audit_comments,
        }
    }

    /// Render one routine definition into `out`. Nothing is written if rendering fails.
    pub fn emit(&self, plan: &GenerationPlan, out: &mut impl fmt::Write) -> Result<()> {
        let mut text = String::new();
        self.render_into(plan, &mut text)?;
        out.write_str(&text)?;
        Ok(())
    }

    /// Append one routine definition to a scratch buffer.
    pub(crate) fn render_into(&self, plan: &GenerationPlan, text: &mut String) -> Result<()> {
        let renderer = RoutineRenderer::new(self.registry, self.catalog, plan, self.audit_comments)?;
        renderer.render(&mut CodeWriter::new(text))
    }

    /// The signature line of the routine a plan renders to.
    pub fn signature(&self, plan: &GenerationPlan) -> Result<String> {
        RoutineRenderer::new(self.registry, self.catalog, plan, self.audit_comments)?.signature()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{CollectorVariant, Operation, BUILTIN_CATALOG};
    use crate::resolve::{ChunkingConfig, Resolver};
    use crate::schema::ObjectKind;

    fn render(kind: ObjectKind, op: Operation, variant: CollectorVariant) -> String {
        let registry = FieldRegistry::builtin().unwrap();
        let resolver = Resolver::new(&registry, &BUILTIN_CATALOG, ChunkingConfig::default());
        let plan = resolver.resolve(kind, op, variant).unwrap();
        let emitter = Emitter::new(&registry, &BUILTIN_CATALOG, &Options::builtin());
        let mut out = String::new();
        emitter.emit(&plan, &mut out).unwrap();
        out
    }

    #[test]
    fn trap_body() {
        let text = render(
            ObjectKind::KlassKlass,
            Operation::FollowContents,
            CollectorVariant::GPGCYoungFinal,
        );
        assert_eq!(
            text,
            "void klassKlass::GPGC_oop_follow_contents(GPGC_GCManagerNewFinal* gcm, oop obj) {\n  \
             ShouldNotReachHere();\n}\n\n"
        );
    }

    #[test]
    fn embedded_signatures() {
        let text = render(
            ObjectKind::ConstantPoolCacheEntry,
            Operation::FollowContents,
            CollectorVariant::GPGCOldStrong,
        );
        assert!(text.starts_with(
            "void ConstantPoolCacheEntry::GPGC_follow_contents(GPGC_GCManagerOldStrong* gcm, int klassId) {"
        ));
        assert!(text.contains("GPGC_OldCollector::mark_and_push(gcm, (heapRef*)&_f1, klassId);"));
        assert!(text.contains("if (is_vfinal()) {"));

        let text = render(
            ObjectKind::ConstantPoolCacheEntry,
            Operation::FollowContents,
            CollectorVariant::SerialMarkSweep,
        );
        assert!(text.starts_with("void ConstantPoolCacheEntry::follow_contents() {"));
        assert!(text.contains("MarkSweep::mark_and_push((heapRef*)&_f1);"));
    }

    #[test]
    fn delegate_calls_base_last() {
        let text = render(
            ObjectKind::ObjArrayKlassKlass,
            Operation::FollowContents,
            CollectorVariant::ParallelCompaction,
        );
        let own = text.find("oak->element_klass_addr()").unwrap();
        let base = text
            .find("arrayKlassKlass::oop_follow_contents(cm, obj);")
            .unwrap();
        assert!(own < base);
    }

    #[test]
    fn nested_tables_get_their_scope() {
        let text = render(
            ObjectKind::InstanceKlassKlass,
            Operation::FollowContents,
            CollectorVariant::GPGCOldStrong,
        );
        assert!(text.contains("ik->GPGC_follow_static_fields(gcm);"));
        assert!(text.contains("ResourceMark rm;"));
        assert!(text.contains("ik->vtable()->GPGC_oop_follow_contents(gcm);"));
        assert!(text.contains("iterate_c_heap_oops(ik, gcm->mark_and_push_closure());"));
        assert!(text.contains("klassKlass::GPGC_oop_follow_contents(gcm, obj);"));
    }

    #[test]
    fn cache_entries_get_the_tag() {
        let text = render(
            ObjectKind::ConstantPoolCacheKlass,
            Operation::FollowContents,
            CollectorVariant::GPGCOldStrong,
        );
        assert!(text.contains(
            "for (int i = cache->length() - 1; i >= 0; i--) cache->entry_at(i)->GPGC_follow_contents(gcm, klassId());"
        ));
    }

    #[test]
    fn external_override_is_a_comment() {
        let text = render(
            ObjectKind::InstanceKlassKlass,
            Operation::UpdateCardMark,
            CollectorVariant::OldGCCardUpdate,
        );
        assert!(text.lines().all(|l| l.is_empty() || l.starts_with("//")));
        assert!(text.contains("instanceKlassKlass::GPGC_oldgc_oop_update_cardmark(oop obj)"));
    }

    #[test]
    fn forward_to_verification() {
        let text = render(
            ObjectKind::ConstMethodKlass,
            Operation::UpdateCardMark,
            CollectorVariant::NewGCCardUpdate,
        );
        assert_eq!(
            text,
            "void constMethodKlass::GPGC_newgc_oop_update_cardmark(oop obj) {\n  \
             GPGC_verify_no_cardmark(obj);\n}\n\n"
        );
    }

    #[test]
    fn audit_comments_list_omitted_fields() {
        let registry = FieldRegistry::builtin().unwrap();
        let resolver = Resolver::new(&registry, &BUILTIN_CATALOG, ChunkingConfig::default());
        let plan = resolver
            .resolve(
                ObjectKind::TypeArrayKlass,
                Operation::FollowContents,
                CollectorVariant::SerialMarkSweep,
            )
            .unwrap();
        let mut options = Options::builtin();
        options.emit_audit_comments = true;
        let mut out = String::new();
        Emitter::new(&registry, &BUILTIN_CATALOG, &options)
            .emit(&plan, &mut out)
            .unwrap();
        assert!(out.contains("// elements: never traversed"));
    }
}
