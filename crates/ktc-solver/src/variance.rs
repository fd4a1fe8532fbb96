//! Variance reconciliation.
//!
//! Combines the variance declared on a type parameter with the projection
//! written at a use site, and decides whether a type argument is already the
//! most precise bound for its position, in which case no wildcard is needed.
//!
//! ## Effective variance
//!
//! | declared \ used | INVARIANT | IN  | OUT |
//! |-----------------|-----------|-----|-----|
//! | INVARIANT       | INVARIANT | IN  | OUT |
//! | IN              | IN        | IN  | OUT |
//! | OUT             | OUT       | OUT | OUT |
//!
//! The contradictory pairs collapse to `OUT`: `In<out X>` behaves like
//! `In<*>` and `Out<in X>` like `Out<*>`, and `OUT` is the variance the
//! wildcard generator treats as "most wildcard".

use crate::TypeInterner;
use crate::descriptors::{DescriptorTable, TypeParamId};
use crate::names::KnownNames;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::types::{TypeArgument, TypeData, TypeId};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Declared or projected variance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variance {
    #[default]
    Invariant,
    In,
    Out,
}

impl Variance {
    /// Source keyword for this variance (`""`, `"in"`, `"out"`).
    pub const fn label(self) -> &'static str {
        match self {
            Variance::Invariant => "",
            Variance::In => "in",
            Variance::Out => "out",
        }
    }

    /// Whether a type parameter with this variance may appear in an `in` position.
    pub const fn allows_in_position(self) -> bool {
        matches!(self, Variance::Invariant | Variance::In)
    }

    /// Whether a type parameter with this variance may appear in an `out` position.
    pub const fn allows_out_position(self) -> bool {
        matches!(self, Variance::Invariant | Variance::Out)
    }

    pub const fn opposite(self) -> Variance {
        match self {
            Variance::Invariant => Variance::Invariant,
            Variance::In => Variance::Out,
            Variance::Out => Variance::In,
        }
    }
}

/// Effective variance of an argument whose parameter is declared `declared`
/// and projected `used` at the use site.
pub const fn effective_variance(declared: Variance, used: Variance) -> Variance {
    match (declared, used) {
        (Variance::Invariant, used) => used,
        (declared, Variance::Invariant) => declared,
        (Variance::In, Variance::In) => Variance::In,
        (Variance::Out, Variance::Out) => Variance::Out,
        // In<out X> = In<*>, Out<in X> = Out<*>
        (Variance::In, Variance::Out) | (Variance::Out, Variance::In) => Variance::Out,
    }
}

// =============================================================================
// Most precise arguments
// =============================================================================

/// Answers "can this argument be used without a wildcard" questions over one
/// unit's types and descriptors.
pub struct VarianceChecker<'a> {
    types: &'a TypeInterner,
    table: &'a DescriptorTable,
    names: &'a KnownNames,
}

impl<'a> VarianceChecker<'a> {
    pub fn new(types: &'a TypeInterner, table: &'a DescriptorTable, names: &'a KnownNames) -> Self {
        Self {
            types,
            table,
            names,
        }
    }

    /// A covariant argument is most precise when no proper subtype of it
    /// exists (ignoring nullability).
    pub fn is_most_precise_covariant_argument(&self, ty: TypeId) -> bool {
        !self.can_have_subtypes_ignoring_nullability(ty)
    }

    /// A contravariant argument is most precise only when it is `Any` or `Any?`.
    ///
    /// This ignores the parameter's upper bound, so e.g. `in Number` for a
    /// `T : Number` parameter is not recognized as precise.
    pub fn is_most_precise_contravariant_argument(&self, ty: TypeId, _parameter: TypeParamId) -> bool {
        self.names.is_any_or_nullable_any(self.types, self.table, ty)
    }

    /// Whether `ty` may have proper subtypes, ignoring nullability.
    ///
    /// Answers `true` when the recursion guard denies entry.
    pub fn can_have_subtypes_ignoring_nullability(&self, ty: TypeId) -> bool {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::Variance);
        self.can_have_subtypes_guarded(ty, &mut guard)
    }

    fn can_have_subtypes_guarded(&self, ty: TypeId, guard: &mut RecursionGuard<TypeId>) -> bool {
        match guard.enter(ty) {
            RecursionResult::Entered => {}
            denied => {
                trace!(type_id = ty.0, ?denied, "subtype check denied; assuming subtypes exist");
                return true;
            }
        }
        let result = self.can_have_subtypes_inner(ty, guard);
        guard.leave(ty);
        result
    }

    fn can_have_subtypes_inner(&self, ty: TypeId, guard: &mut RecursionGuard<TypeId>) -> bool {
        let Some(data) = self.types.lookup(ty) else {
            return true;
        };
        let (class, args) = match &*data {
            TypeData::TypeParameter { .. } => return true,
            TypeData::Function { .. } | TypeData::Property { .. } => return true,
            TypeData::Error | TypeData::DontCare | TypeData::FunctionPlaceholder => return false,
            TypeData::Class { class, args, .. } => (*class, args),
        };
        let Some(descriptor) = self.table.class(class) else {
            return true;
        };
        if descriptor.modality.is_overridable() {
            return true;
        }

        for (param_id, argument) in descriptor.type_params.iter().zip(args.iter()) {
            let TypeArgument::Type {
                projection,
                type_id,
            } = *argument
            else {
                return true;
            };
            let declared = self
                .table
                .type_param(*param_id)
                .map_or(Variance::Invariant, |p| p.variance);

            match effective_variance(declared, projection) {
                Variance::Out => {
                    if self.can_have_subtypes_guarded(type_id, guard) {
                        return true;
                    }
                }
                Variance::In => {
                    if !self.is_most_precise_contravariant_argument(type_id, *param_id) {
                        return true;
                    }
                }
                Variance::Invariant => {}
            }
        }
        false
    }
}

#[cfg(test)]
#[path = "../tests/variance_tests.rs"]
mod tests;
