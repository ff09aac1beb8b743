//! The generation driver.
//!
//! A [`Generator`] owns the kind registry, the variant catalog and the options of one run. It
//! checks them against each other once, when it is built, and then enumerates every routine the
//! host declares: kind-major, then operation, then variant.

use crate::collector::{CollectorVariant, Operation, VariantCatalog};
use crate::emit::Emitter;
use crate::resolve::{ChunkingConfig, GenerationPlan, PlanTag, Resolver};
use crate::schema::{FieldRegistry, ObjectKind};
use crate::util::error::{GenError, Result};
use crate::util::options::Options;
use enum_map::EnumMap;
use std::fmt;
use strum::IntoEnumIterator;

/// Counts reported after a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub kinds: usize,
    pub routines: usize,
    pub bytes: usize,
    pub by_tag: EnumMap<PlanTag, usize>,
}

#[derive(Debug)]
pub struct Generator {
    registry: FieldRegistry,
    catalog: VariantCatalog,
    options: Options,
}

impl Generator {
    /// Check the catalogs against each other and the options. A generator that is built can
    /// emit every routine it enumerates.
    pub fn new(registry: FieldRegistry, catalog: VariantCatalog, options: Options) -> Result<Self> {
        let generator = Generator {
            registry,
            catalog,
            options,
        };
        generator.resolver().validate()?;
        Ok(generator)
    }

    /// The host's kinds and collectors, configured from the environment. Also installs the
    /// built-in logger unless one is already installed.
    pub fn builtin() -> Result<Self> {
        match crate::util::logger::try_init() {
            Ok(_) => debug!("Closuregen initialized the logger."),
            Err(_) => debug!("Closuregen failed to initialize the logger. Possibly a logger has been initialized by user."),
        }
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Result<Self> {
        Self::new(FieldRegistry::builtin()?, VariantCatalog::builtin(), options)
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &VariantCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn chunking(&self) -> ChunkingConfig {
        ChunkingConfig::from(&self.options)
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.registry, &self.catalog, self.chunking())
    }

    pub fn emitter(&self) -> Emitter<'_> {
        Emitter::new(&self.registry, &self.catalog, &self.options)
    }

    pub fn resolve(
        &self,
        kind: ObjectKind,
        op: Operation,
        variant: CollectorVariant,
    ) -> Result<GenerationPlan> {
        self.resolver().resolve(kind, op, variant)
    }

    /// Every routine the host declares, in emission order. Fails if a kind declares a variant the
    /// catalog does not know.
    pub fn entry_points(&self) -> Result<Vec<(ObjectKind, Operation, CollectorVariant)>> {
        let mut triples = vec![];
        for kind in self.registry.kinds() {
            let desc = self.registry.descriptor(kind)?;
            for op in Operation::iter() {
                for variant in CollectorVariant::iter().filter(|v| desc.declares(*v)) {
                    if self.catalog.supports(variant, op)? {
                        triples.push((kind, op, variant));
                    }
                }
            }
        }
        Ok(triples)
    }

    /// Emit one declared routine.
    pub fn emit_triple(
        &self,
        kind: ObjectKind,
        op: Operation,
        variant: CollectorVariant,
        out: &mut impl fmt::Write,
    ) -> Result<()> {
        let declared = self.registry.descriptor(kind)?.declares(variant)
            && self.catalog.supports(variant, op)?;
        if !declared {
            return Err(GenError::UnsupportedCombinationRequested {
                kind,
                operation: op,
                variant,
            });
        }
        let plan = self.resolve(kind, op, variant)?;
        self.emitter().emit(&plan, out)
    }

    /// Emit the whole unit. The sink only receives text once every routine has rendered.
    pub fn generate(&self, out: &mut impl fmt::Write) -> Result<GenerationSummary> {
        let resolver = self.resolver();
        let emitter = self.emitter();
        let mut text = String::new();
        let mut summary = GenerationSummary {
            kinds: self.registry.kinds().count(),
            ..GenerationSummary::default()
        };
        for (kind, op, variant) in self.entry_points()? {
            let plan = resolver.resolve(kind, op, variant)?;
            debug!("{} {} {} resolved to {}", kind, op, variant, plan.tag());
            summary.by_tag[plan.tag()] += 1;
            summary.routines += 1;
            emitter.render_into(&plan, &mut text)?;
        }
        out.write_str(&text)?;
        summary.bytes = text.len();
        info!(
            "Generated {} routines for {} kinds ({} bytes)",
            summary.routines, summary.kinds, summary.bytes
        );
        Ok(summary)
    }

    pub fn generate_to_string(&self) -> Result<String> {
        let mut out = String::new();
        self.generate(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> Generator {
        Generator::with_options(Options::builtin()).unwrap()
    }

    #[test]
    fn builtin_generator_builds() {
        let g = Generator::builtin().unwrap();
        assert_eq!(g.registry().kinds().count(), 18);
        // A second call finds the logger installed and carries on.
        Generator::builtin().unwrap();
    }

    #[test]
    fn entry_points_are_kind_major() {
        let triples = generator().entry_points().unwrap();
        let kinds: Vec<ObjectKind> = triples.iter().map(|t| t.0).collect();
        let mut sorted = kinds.clone();
        sorted.sort();
        assert_eq!(kinds, sorted);
        assert!(triples.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn undeclared_triple_is_refused() {
        let mut out = String::new();
        let err = generator()
            .emit_triple(
                ObjectKind::SymbolKlass,
                Operation::VerifyNoCardMark,
                CollectorVariant::VerifyNoCardMark,
                &mut out,
            )
            .unwrap_err();
        assert_eq!(
            err,
            GenError::UnsupportedCombinationRequested {
                kind: ObjectKind::SymbolKlass,
                operation: Operation::VerifyNoCardMark,
                variant: CollectorVariant::VerifyNoCardMark,
            }
        );
        assert!(out.is_empty());
    }

    #[test]
    fn entry_points_fail_on_an_unknown_declared_variant() {
        let builtin = VariantCatalog::builtin();
        let mut catalog = VariantCatalog::new();
        for variant in builtin.variants().filter(|v| *v != CollectorVariant::MutatorCardUpdate) {
            catalog.register(variant, *builtin.spec(variant).unwrap());
        }
        // Built without validation, as a caller could never build it through `new`.
        let g = Generator {
            registry: FieldRegistry::builtin().unwrap(),
            catalog,
            options: Options::builtin(),
        };
        let unknown = GenError::UnknownVariant(CollectorVariant::MutatorCardUpdate.to_string());
        assert_eq!(g.entry_points(), Err(unknown.clone()));
        let mut out = String::new();
        assert_eq!(g.generate(&mut out), Err(unknown));
        assert!(out.is_empty());
    }

    #[test]
    fn summary_counts_every_routine() {
        let g = generator();
        let mut out = String::new();
        let summary = g.generate(&mut out).unwrap();
        assert_eq!(summary.routines, g.entry_points().unwrap().len());
        assert_eq!(summary.by_tag.values().sum::<usize>(), summary.routines);
        assert_eq!(summary.bytes, out.len());
        assert_eq!(summary.kinds, 18);
    }

    #[test]
    fn invalid_chunking_is_rejected_at_construction() {
        let mut options = Options::builtin();
        options.array_chunk_size = options.array_chunk_threshold + 1;
        assert!(matches!(
            Generator::with_options(options),
            Err(GenError::Options { .. })
        ));
    }

    /// The sink fails on the first write.
    struct Refusing;

    impl fmt::Write for Refusing {
        fn write_str(&mut self, _: &str) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[test]
    fn sink_errors_surface() {
        assert_eq!(
            generator().generate(&mut Refusing),
            Err(GenError::Sink(fmt::Error))
        );
    }
}
