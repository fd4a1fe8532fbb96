//! Fully-qualified names the engine recognizes by identity.

use crate::descriptors::{ClassId, DescriptorTable};
use crate::types::{AnnotationRef, TypeData, TypeId};
use crate::TypeInterner;
use ktc_common::{Atom, Interner};

pub const ANY_FQ_NAME: &str = "kotlin.Any";
pub const FRAGILE_FQ_NAME: &str = "kotlin.Fragile";
pub const JVM_SUPPRESS_WILDCARDS_FQ_NAME: &str = "kotlin.jvm.JvmSuppressWildcards";
pub const JVM_WILDCARD_FQ_NAME: &str = "kotlin.jvm.JvmWildcard";

/// Methods whose Java signatures keep declaration-site wildcards even when
/// the general mode would skip them.
pub const METHODS_WITH_DECLARATION_SITE_WILDCARDS: [&str; 3] = [
    "kotlin.MutableCollection.addAll",
    "kotlin.MutableList.addAll",
    "kotlin.MutableMap.putAll",
];

/// Interned forms of the well-known names for one unit.
#[derive(Clone, Debug)]
pub struct KnownNames {
    pub any: Atom,
    pub fragile: Atom,
    pub jvm_suppress_wildcards: Atom,
    pub jvm_wildcard: Atom,
    pub methods_with_declaration_site_wildcards: [Atom; 3],
}

impl KnownNames {
    pub fn new(interner: &mut Interner) -> Self {
        Self {
            any: interner.intern(ANY_FQ_NAME),
            fragile: interner.intern(FRAGILE_FQ_NAME),
            jvm_suppress_wildcards: interner.intern(JVM_SUPPRESS_WILDCARDS_FQ_NAME),
            jvm_wildcard: interner.intern(JVM_WILDCARD_FQ_NAME),
            methods_with_declaration_site_wildcards: METHODS_WITH_DECLARATION_SITE_WILDCARDS
                .map(|name| interner.intern(name)),
        }
    }

    pub fn class_has_fq_name(&self, table: &DescriptorTable, class: ClassId, fq_name: Atom) -> bool {
        table.class(class).is_some_and(|c| c.fq_name == fq_name)
    }

    /// `Any` or `Any?`.
    pub fn is_any_or_nullable_any(&self, types: &TypeInterner, table: &DescriptorTable, ty: TypeId) -> bool {
        types
            .lookup(ty)
            .and_then(|data| data.class_id())
            .is_some_and(|class| self.class_has_fq_name(table, class, self.any))
    }

    /// First annotation in `annotations` whose class has the given name.
    pub fn find_annotation(
        &self,
        table: &DescriptorTable,
        annotations: &[AnnotationRef],
        fq_name: Atom,
    ) -> Option<AnnotationRef> {
        annotations
            .iter()
            .copied()
            .find(|a| self.class_has_fq_name(table, a.class, fq_name))
    }

    /// Annotations carried by a type.
    pub fn type_annotations(&self, types: &TypeInterner, ty: TypeId) -> Vec<AnnotationRef> {
        match types.lookup(ty).as_deref() {
            Some(TypeData::Class { annotations, .. }) => annotations.to_vec(),
            _ => Vec::new(),
        }
    }
}
