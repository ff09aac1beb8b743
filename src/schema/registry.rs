use super::field::{FieldSpec, TraversalRole};
use super::kind::{HeaderPosition, KindDescriptor, ObjectKind, Receiver};
use super::kinds::builtin_kinds;
use crate::util::error::{GenError, Result};
use enum_map::EnumMap;
use std::str::FromStr;
use strum::IntoEnumIterator;

/// The registry of object kinds and their fields.
///
/// A registry is checked once when it is built. Anything it hands out afterwards can be trusted
/// to be closed under base and nested references and to have fields whose shapes fit their roles.
#[derive(Clone, Debug)]
pub struct FieldRegistry {
    kinds: EnumMap<ObjectKind, Option<KindDescriptor>>,
}

impl FieldRegistry {
    /// The registry of the host runtime's kinds.
    pub fn builtin() -> Result<Self> {
        Self::new(builtin_kinds())
    }

    /// Build a registry from descriptors. Each kind may only be described once.
    pub fn new(descriptors: impl IntoIterator<Item = KindDescriptor>) -> Result<Self> {
        let mut kinds: EnumMap<ObjectKind, Option<KindDescriptor>> = EnumMap::default();
        for desc in descriptors {
            let kind = desc.kind;
            if kinds[kind].replace(desc).is_some() {
                return Err(GenError::malformed(kind, "described more than once"));
            }
        }
        let registry = FieldRegistry { kinds };
        registry.validate()?;
        debug!("Field registry holds {} kinds", registry.kinds().count());
        Ok(registry)
    }

    /// The registered kinds, in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = ObjectKind> + '_ {
        self.kinds
            .iter()
            .filter_map(|(kind, desc)| desc.as_ref().map(|_| kind))
    }

    pub fn descriptor(&self, kind: ObjectKind) -> Result<&KindDescriptor> {
        self.kinds[kind]
            .as_ref()
            .ok_or_else(|| GenError::UnknownKind(kind.to_string()))
    }

    pub fn fields(&self, kind: ObjectKind) -> Result<&'static [FieldSpec]> {
        Ok(self.descriptor(kind)?.fields)
    }

    pub fn base_kind(&self, kind: ObjectKind) -> Result<Option<ObjectKind>> {
        Ok(self.descriptor(kind)?.base)
    }

    /// Look a kind up by its name.
    pub fn lookup(&self, name: &str) -> Result<ObjectKind> {
        let kind =
            ObjectKind::from_str(name).map_err(|_| GenError::UnknownKind(name.to_string()))?;
        self.descriptor(kind)?;
        Ok(kind)
    }

    fn validate(&self) -> Result<()> {
        for kind in ObjectKind::iter() {
            if let Some(desc) = &self.kinds[kind] {
                self.validate_kind(desc)?;
            }
        }
        Ok(())
    }

    fn validate_kind(&self, desc: &KindDescriptor) -> Result<()> {
        let kind = desc.kind;
        let malformed = |reason: String| GenError::malformed(kind, reason);

        if desc.header != HeaderPosition::Omit && !desc.flags.has_header {
            return Err(malformed("visits a header it does not have".into()));
        }

        if let Some(base) = desc.base {
            let base_desc = self
                .kinds[base]
                .as_ref()
                .ok_or_else(|| malformed(format!("base kind {} is not registered", base)))?;
            if desc.receiver != Receiver::Object || base_desc.receiver != Receiver::Object {
                return Err(malformed(format!(
                    "only object receivers can delegate, base is {}",
                    base
                )));
            }
            self.check_base_chain(kind)?;
        }

        for field in desc.fields {
            if let Some(reason) = field.shape_mismatch() {
                return Err(malformed(format!("field `{}`: {}", field.name, reason)));
            }
            if field.after_base && desc.base.is_none() {
                return Err(malformed(format!(
                    "field `{}` is placed after a base the kind does not have",
                    field.name
                )));
            }
            if let Some(nested) = field.shape.nested_kind() {
                if self.kinds[nested].is_none() {
                    return Err(malformed(format!(
                        "field `{}` nests unregistered kind {}",
                        field.name, nested
                    )));
                }
            }
            match field.role {
                TraversalRole::ChunkableSlot if !desc.flags.is_array_shaped => {
                    return Err(malformed(format!(
                        "field `{}` is chunkable but the kind is not array-shaped",
                        field.name
                    )));
                }
                TraversalRole::WeakReferent if !desc.flags.is_reference => {
                    return Err(malformed(format!(
                        "field `{}` is a weak referent of a non-reference kind",
                        field.name
                    )));
                }
                _ => {}
            }
        }

        if desc.flags.is_weak_root
            && desc
                .fields
                .iter()
                .any(|f| f.role != TraversalRole::Excluded)
        {
            return Err(malformed(
                "weak roots must not hold traversed references".into(),
            ));
        }

        if desc.flags.is_reference {
            let referents: Vec<usize> = desc
                .fields
                .iter()
                .enumerate()
                .filter(|(_, f)| f.role == TraversalRole::WeakReferent)
                .map(|(i, _)| i)
                .collect();
            let [referent] = referents[..] else {
                return Err(malformed(format!(
                    "reference kinds need exactly one weak referent, found {}",
                    referents.len()
                )));
            };
            // The pending-list link is visited unconditionally after the referent.
            if !desc.fields[referent + 1..]
                .iter()
                .any(|f| f.role == TraversalRole::DirectRef)
            {
                return Err(malformed(
                    "reference kinds need a link field after the referent".into(),
                ));
            }
        }

        Ok(())
    }

    fn check_base_chain(&self, start: ObjectKind) -> Result<()> {
        let mut seen: EnumMap<ObjectKind, bool> = EnumMap::default();
        let mut cursor = Some(start);
        while let Some(kind) = cursor {
            if std::mem::replace(&mut seen[kind], true) {
                return Err(GenError::malformed(start, "base chain is cyclic"));
            }
            cursor = self.kinds[kind].as_ref().and_then(|d| d.base);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::field::Region;

    fn builtin_descriptor(kind: ObjectKind) -> KindDescriptor {
        builtin_kinds()
            .into_iter()
            .find(|d| d.kind == kind)
            .unwrap()
    }

    fn with_replaced(desc: KindDescriptor) -> Result<FieldRegistry> {
        FieldRegistry::new(
            builtin_kinds()
                .into_iter()
                .map(|d| if d.kind == desc.kind { desc.clone() } else { d }),
        )
    }

    #[test]
    fn builtin_registry_is_complete() {
        let registry = FieldRegistry::builtin().unwrap();
        assert_eq!(registry.kinds().count(), ObjectKind::iter().count());
        assert_eq!(
            registry.base_kind(ObjectKind::ObjArrayKlassKlass).unwrap(),
            Some(ObjectKind::ArrayKlassKlass)
        );
        assert_eq!(registry.base_kind(ObjectKind::KlassKlass).unwrap(), None);
    }

    #[test]
    fn lookup_by_name() {
        let registry = FieldRegistry::builtin().unwrap();
        assert_eq!(
            registry.lookup("InstanceRefKlass").unwrap(),
            ObjectKind::InstanceRefKlass
        );
        assert_eq!(
            registry.lookup("stackChunkKlass"),
            Err(GenError::UnknownKind("stackChunkKlass".into()))
        );
    }

    #[test]
    fn unregistered_kind_is_unknown() {
        let registry = FieldRegistry::new(
            builtin_kinds()
                .into_iter()
                .filter(|d| d.kind == ObjectKind::TypeArrayKlass),
        )
        .unwrap();
        assert!(matches!(
            registry.fields(ObjectKind::SymbolKlass),
            Err(GenError::UnknownKind(_))
        ));
        assert!(matches!(
            registry.lookup("SymbolKlass"),
            Err(GenError::UnknownKind(_))
        ));
    }

    #[test]
    fn dangling_base_is_rejected() {
        let err = FieldRegistry::new(
            builtin_kinds()
                .into_iter()
                .filter(|d| d.kind != ObjectKind::KlassKlass),
        )
        .unwrap_err();
        assert!(matches!(err, GenError::MalformedSchema { .. }));
    }

    #[test]
    fn duplicate_kind_is_rejected() {
        let desc = builtin_descriptor(ObjectKind::TypeArrayKlass);
        let err = FieldRegistry::new(vec![desc.clone(), desc]).unwrap_err();
        assert_eq!(
            err,
            GenError::malformed(ObjectKind::TypeArrayKlass, "described more than once")
        );
    }

    #[test]
    fn cyclic_base_is_rejected() {
        let mut desc = builtin_descriptor(ObjectKind::KlassKlass);
        desc.base = Some(ObjectKind::ObjArrayKlassKlass);
        assert!(with_replaced(desc).is_err());
    }

    #[test]
    fn weak_root_with_references_is_rejected() {
        const FIELDS: &[FieldSpec] = &[FieldSpec::direct("body", "obj->body_addr()")];
        let mut desc = builtin_descriptor(ObjectKind::SymbolKlass);
        desc.fields = FIELDS;
        assert!(with_replaced(desc).is_err());
    }

    #[test]
    fn chunkable_field_needs_array_kind() {
        const FIELDS: &[FieldSpec] = &[FieldSpec::chunkable(
            "maps",
            Region::Span {
                base: "start()",
                len: "size()",
            },
        )];
        let mut desc = builtin_descriptor(ObjectKind::InstanceKlass);
        desc.fields = FIELDS;
        assert!(with_replaced(desc).is_err());
    }

    #[test]
    fn reference_kind_needs_pending_link() {
        const FIELDS: &[FieldSpec] = &[FieldSpec::weak_referent("referent", "r()")];
        let mut desc = builtin_descriptor(ObjectKind::InstanceRefKlass);
        desc.fields = FIELDS;
        assert!(with_replaced(desc).is_err());
    }
}
