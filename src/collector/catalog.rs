use super::variant::{AddressingConvention, CollectorVariant, VariantSpec};
use super::Operation;
use crate::schema::ObjectKind;
use crate::util::error::{GenError, Result};
use enum_map::EnumMap;
use std::collections::HashMap;
use std::str::FromStr;
use strum::IntoEnumIterator;

/// A routine the host maintains by hand. The generator emits a marker instead of a body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Override {
    External { note: &'static str },
}

/// The catalog of collector variants, plus explicit per-routine overrides.
#[derive(Clone, Debug)]
pub struct VariantCatalog {
    variants: EnumMap<CollectorVariant, Option<VariantSpec>>,
    overrides: HashMap<(ObjectKind, Operation, CollectorVariant), Override>,
}

lazy_static! {
    /// The catalog of the host's collectors.
    pub static ref BUILTIN_CATALOG: VariantCatalog = VariantCatalog::builtin();
}

impl VariantCatalog {
    /// A catalog with no variants.
    pub fn new() -> Self {
        VariantCatalog {
            variants: EnumMap::default(),
            overrides: HashMap::new(),
        }
    }

    /// The host's collectors.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for variant in CollectorVariant::iter() {
            catalog.register(variant, *variant.builtin_spec());
        }
        // The old-generation card update of instance classes also has to walk the class's
        // off-heap slots, which the host does in its own routine.
        catalog.add_override(
            ObjectKind::InstanceKlassKlass,
            Operation::UpdateCardMark,
            CollectorVariant::OldGCCardUpdate,
            Override::External {
                note: "Maintained by hand in instanceKlassKlass.cpp",
            },
        );
        catalog
    }

    pub fn register(&mut self, variant: CollectorVariant, spec: VariantSpec) {
        self.variants[variant] = Some(spec);
    }

    pub fn add_override(
        &mut self,
        kind: ObjectKind,
        op: Operation,
        variant: CollectorVariant,
        with: Override,
    ) {
        self.overrides.insert((kind, op, variant), with);
    }

    pub fn override_for(
        &self,
        kind: ObjectKind,
        op: Operation,
        variant: CollectorVariant,
    ) -> Option<Override> {
        self.overrides.get(&(kind, op, variant)).copied()
    }

    /// The registered variants, in declaration order.
    pub fn variants(&self) -> impl Iterator<Item = CollectorVariant> + '_ {
        self.variants
            .iter()
            .filter_map(|(variant, spec)| spec.as_ref().map(|_| variant))
    }

    pub fn spec(&self, variant: CollectorVariant) -> Result<&VariantSpec> {
        self.variants[variant]
            .as_ref()
            .ok_or_else(|| GenError::UnknownVariant(variant.to_string()))
    }

    pub fn lookup(&self, name: &str) -> Result<CollectorVariant> {
        let variant = CollectorVariant::from_str(name)
            .map_err(|_| GenError::UnknownVariant(name.to_string()))?;
        self.spec(variant)?;
        Ok(variant)
    }

    /// Does `variant` have a routine for `op`?
    pub fn supports(&self, variant: CollectorVariant, op: Operation) -> Result<bool> {
        Ok(self.spec(variant)?.operation == op)
    }

    pub fn addressing_convention(&self, variant: CollectorVariant) -> Result<AddressingConvention> {
        Ok(self.spec(variant)?.addressing_convention())
    }

    /// Check the registered variants against each other.
    pub(crate) fn validate(&self) -> Result<()> {
        for variant in self.variants() {
            let spec = self.spec(variant)?;
            if spec.pushes_array_chunks && spec.manager.is_none() {
                return Err(GenError::MalformedVariant {
                    variant,
                    reason: "pushes array chunks but has no manager to push them to".into(),
                });
            }
        }
        for &(kind, op, variant) in self.overrides.keys() {
            if !self.supports(variant, op)? {
                return Err(GenError::malformed(
                    kind,
                    format!("override for {} {} which has no such routine", variant, op),
                ));
            }
        }
        Ok(())
    }
}

impl Default for VariantCatalog {
    fn default() -> Self {
        Self::new()
    }
}
