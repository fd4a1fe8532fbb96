//! JVM wildcard decisions for generic signatures.
//!
//! Declaration-site variance has no JVM equivalent, so signatures encode it
//! as use-site wildcards (`? extends T`, `? super T`). Wildcards are skipped
//! where they add nothing (the argument is already the most precise bound)
//! or where annotations ask for it.

use crate::TypeInterner;
use crate::descriptors::{CallableId, DescriptorTable, TypeParamId};
use crate::names::KnownNames;
use crate::overrides::{first_overridden, property_if_accessor};
use crate::types::{AnnotationRef, TypeArgument, TypeData, TypeId};
use crate::variance::{Variance, VarianceChecker, effective_variance};
use tracing::trace;

/// How generic arguments of a type are mapped to wildcards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeMappingMode {
    /// Never emit declaration-site wildcards; use-site projections are kept.
    pub skip_declaration_site_wildcards: bool,
    /// Omit declaration-site wildcards for arguments that are already the
    /// most precise bound for their position.
    pub skip_declaration_site_wildcards_if_possible: bool,
    pub is_for_annotation_parameter: bool,
    /// Mode used for nested arguments, if different from this one.
    pub fallback: Option<Box<TypeMappingMode>>,
}

impl TypeMappingMode {
    pub const DEFAULT: TypeMappingMode = TypeMappingMode {
        skip_declaration_site_wildcards: false,
        skip_declaration_site_wildcards_if_possible: false,
        is_for_annotation_parameter: false,
        fallback: None,
    };

    /// Mode for value parameter types: wildcards only where they carry information.
    pub const VALUE_PARAMETER: TypeMappingMode = TypeMappingMode {
        skip_declaration_site_wildcards: false,
        skip_declaration_site_wildcards_if_possible: true,
        is_for_annotation_parameter: false,
        fallback: None,
    };

    /// Mode for return types: declaration-site wildcards are never emitted.
    pub const RETURN_TYPE: TypeMappingMode = TypeMappingMode {
        skip_declaration_site_wildcards: true,
        skip_declaration_site_wildcards_if_possible: false,
        is_for_annotation_parameter: false,
        fallback: None,
    };

    /// A mode that applies the same wildcard policy at every nesting level.
    pub fn with_constant_declaration_site_wildcards(
        skip_declaration_site_wildcards: bool,
        is_for_annotation_parameter: bool,
        fallback: Option<TypeMappingMode>,
    ) -> Self {
        Self {
            skip_declaration_site_wildcards,
            skip_declaration_site_wildcards_if_possible: false,
            is_for_annotation_parameter,
            fallback: fallback.map(Box::new),
        }
    }

    /// Mode used for the arguments of a type mapped with `self`.
    pub fn argument_mode(&self) -> TypeMappingMode {
        self.fallback
            .as_deref()
            .cloned()
            .unwrap_or_else(|| self.clone())
    }
}

/// The wildcard emitted for one generic argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wildcard {
    /// The argument is written as-is.
    None(TypeId),
    /// `? extends T`
    Extends(TypeId),
    /// `? super T`
    Super(TypeId),
    /// `?`
    Unbounded,
}

pub struct TypeMapper<'a> {
    types: &'a TypeInterner,
    table: &'a DescriptorTable,
    names: &'a KnownNames,
}

impl<'a> TypeMapper<'a> {
    pub fn new(types: &'a TypeInterner, table: &'a DescriptorTable, names: &'a KnownNames) -> Self {
        Self {
            types,
            table,
            names,
        }
    }

    fn variance_checker(&self) -> VarianceChecker<'a> {
        VarianceChecker::new(self.types, self.table, self.names)
    }

    /// Variance of the wildcard for `argument` of `parameter` under `mode`.
    pub fn variance_for_wildcard(
        &self,
        parameter: TypeParamId,
        projection: Variance,
        argument: TypeId,
        mode: &TypeMappingMode,
    ) -> Variance {
        let declared = self
            .table
            .type_param(parameter)
            .map_or(Variance::Invariant, |p| p.variance);
        if declared == Variance::Invariant || mode.skip_declaration_site_wildcards {
            return projection;
        }
        if projection == Variance::Invariant || projection == declared {
            if mode.skip_declaration_site_wildcards_if_possible {
                let checker = self.variance_checker();
                let precise = match declared {
                    Variance::Out => checker.is_most_precise_covariant_argument(argument),
                    Variance::In => checker.is_most_precise_contravariant_argument(argument, parameter),
                    Variance::Invariant => false,
                };
                if precise {
                    return Variance::Invariant;
                }
            }
            return declared;
        }
        effective_variance(declared, projection)
    }

    /// Wildcard for one argument of a generic type.
    pub fn wildcard_for_argument(
        &self,
        parameter: TypeParamId,
        argument: TypeArgument,
        mode: &TypeMappingMode,
    ) -> Wildcard {
        let TypeArgument::Type {
            projection,
            type_id,
        } = argument
        else {
            return Wildcard::Unbounded;
        };
        match self.variance_for_wildcard(parameter, projection, type_id, mode) {
            Variance::Invariant => Wildcard::None(type_id),
            Variance::Out => Wildcard::Extends(type_id),
            Variance::In => Wildcard::Super(type_id),
        }
    }

    /// Wildcards for every argument of `ty`, after applying type annotations.
    pub fn argument_wildcards(&self, ty: TypeId, mode: &TypeMappingMode) -> Vec<Wildcard> {
        let Some(data) = self.types.lookup(ty) else {
            return Vec::new();
        };
        let TypeData::Class { class, args, .. } = &*data else {
            return Vec::new();
        };
        let Some(descriptor) = self.table.class(*class) else {
            return Vec::new();
        };
        let mode = self.update_argument_mode_from_annotations(mode, ty);
        descriptor
            .type_params
            .iter()
            .zip(args.iter())
            .map(|(param, arg)| self.wildcard_for_argument(*param, *arg, &mode))
            .collect()
    }

    /// Applies `@JvmSuppressWildcards` / `@JvmWildcard` on `ty` to `mode`.
    pub fn update_argument_mode_from_annotations(&self, mode: &TypeMappingMode, ty: TypeId) -> TypeMappingMode {
        let annotations = self.names.type_annotations(self.types, ty);
        if let Some(skip) = self.suppress_wildcards_mode(&annotations) {
            return TypeMappingMode::with_constant_declaration_site_wildcards(
                skip,
                mode.is_for_annotation_parameter,
                None,
            );
        }
        if self
            .names
            .find_annotation(self.table, &annotations, self.names.jvm_wildcard)
            .is_some()
        {
            return TypeMappingMode::with_constant_declaration_site_wildcards(
                false,
                mode.is_for_annotation_parameter,
                Some(mode.clone()),
            );
        }
        mode.clone()
    }

    /// Mode requested by a `@JvmSuppressWildcards` on `outer_type`, or on
    /// `callable` and its containers (nearest first).
    ///
    /// Returns `None` when no annotation applies; the default mode when one
    /// applies but `outer_type` has no arguments to affect.
    pub fn extract_type_mapping_mode_from_annotation(
        &self,
        callable: Option<CallableId>,
        outer_type: TypeId,
        is_for_annotation_parameter: bool,
    ) -> Option<TypeMappingMode> {
        let type_annotations = self.names.type_annotations(self.types, outer_type);
        let skip = self
            .suppress_wildcards_mode(&type_annotations)
            .or_else(|| callable.and_then(|c| self.declaration_suppress_wildcards_mode(c)))?;

        let has_arguments = self
            .types
            .lookup(outer_type)
            .is_some_and(|d| !d.args().is_empty());
        if has_arguments {
            Some(TypeMappingMode::with_constant_declaration_site_wildcards(
                skip,
                is_for_annotation_parameter,
                None,
            ))
        } else {
            Some(TypeMappingMode::DEFAULT)
        }
    }

    fn declaration_suppress_wildcards_mode(&self, callable: CallableId) -> Option<bool> {
        self.table
            .parents_with_self(callable)
            .into_iter()
            .find_map(|container| {
                self.names.find_annotation(
                    self.table,
                    self.table.annotations_of(container),
                    self.names.jvm_suppress_wildcards,
                )
            })
            .map(|annotation| annotation.value.unwrap_or(true))
    }

    fn suppress_wildcards_mode(&self, annotations: &[AnnotationRef]) -> Option<bool> {
        self.names
            .find_annotation(self.table, annotations, self.names.jvm_suppress_wildcards)
            .map(|annotation| annotation.value.unwrap_or(true))
    }

    /// Whether `callable` is, or overrides, one of the collection methods
    /// whose Java signatures keep declaration-site wildcards.
    pub fn is_method_with_declaration_site_wildcards(&self, callable: CallableId) -> bool {
        let known = &self.names.methods_with_declaration_site_wildcards;
        let found = first_overridden(self.table, callable, |id, _| {
            let property = property_if_accessor(self.table, id);
            self.table
                .callable(property)
                .is_some_and(|d| !d.fq_name.is_none() && known.contains(&d.fq_name))
        });
        trace!(callable = callable.0, found = ?found, "declaration-site wildcard method check");
        found.is_some()
    }
}

#[cfg(test)]
#[path = "../tests/type_mapping_tests.rs"]
mod tests;
