//! Type interning.
//!
//! Structurally equal `TypeData` values share a single `TypeId`. The interner
//! takes `&self` so that it can be shared by the resolver, the dataflow engine
//! and the formatter without threading `&mut` through every call.

use crate::descriptors::{ClassId, TypeParamId};
use crate::types::{TypeArgument, TypeData, TypeId, TypeList};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};
use tracing::{trace, warn};

#[derive(Default)]
struct InternerState {
    map: FxHashMap<Arc<TypeData>, TypeId>,
    items: Vec<Arc<TypeData>>,
}

/// Type interning table.
/// Thread-safe via RwLock for concurrent access.
pub struct TypeInterner {
    state: RwLock<InternerState>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    pub fn new() -> Self {
        TypeInterner {
            state: RwLock::new(InternerState::default()),
        }
    }

    fn intrinsic_id(data: &TypeData) -> Option<TypeId> {
        match data {
            TypeData::Error => Some(TypeId::ERROR),
            TypeData::DontCare => Some(TypeId::DONT_CARE),
            TypeData::FunctionPlaceholder => Some(TypeId::FUNCTION_PLACEHOLDER),
            _ => None,
        }
    }

    /// Intern a type, returning the existing id for structurally equal data.
    ///
    /// Returns `TypeId::ERROR` if the table lock is poisoned.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(id) = Self::intrinsic_id(&data) {
            return id;
        }
        if let Ok(state) = self.state.read() {
            if let Some(&id) = state.map.get(&data) {
                return id;
            }
        }
        let Ok(mut state) = self.state.write() else {
            warn!(data = ?data, "type table lock poisoned; interning as error type");
            return TypeId::ERROR;
        };
        if let Some(&id) = state.map.get(&data) {
            return id;
        }
        let id = TypeId(TypeId::FIRST_USER + state.items.len() as u32);
        let data = Arc::new(data);
        trace!(type_id = id.0, data = ?data, "interned type");
        state.items.push(data.clone());
        state.map.insert(data, id);
        id
    }

    /// Look up the data behind a type id.
    pub fn lookup(&self, id: TypeId) -> Option<Arc<TypeData>> {
        match id {
            TypeId::ERROR => return Some(Arc::new(TypeData::Error)),
            TypeId::DONT_CARE => return Some(Arc::new(TypeData::DontCare)),
            TypeId::FUNCTION_PLACEHOLDER => return Some(Arc::new(TypeData::FunctionPlaceholder)),
            _ => {}
        }
        if id.is_intrinsic() {
            return None;
        }
        let Ok(state) = self.state.read() else {
            warn!(type_id = id.0, "type table lock poisoned; lookup failed");
            return None;
        };
        state
            .items
            .get((id.0 - TypeId::FIRST_USER) as usize)
            .cloned()
    }

    /// Number of non-intrinsic types interned so far.
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Convenience constructors
    // =========================================================================

    pub fn class(&self, class: ClassId) -> TypeId {
        self.intern(TypeData::class(class))
    }

    pub fn generic(&self, class: ClassId, args: impl IntoIterator<Item = TypeArgument>) -> TypeId {
        self.intern(TypeData::generic(class, args))
    }

    pub fn type_param(&self, param: TypeParamId) -> TypeId {
        self.intern(TypeData::TypeParameter {
            param,
            nullable: false,
        })
    }

    pub fn function(
        &self,
        receiver: Option<TypeId>,
        params: impl IntoIterator<Item = TypeId>,
        return_type: TypeId,
        reflective: bool,
    ) -> TypeId {
        self.intern(TypeData::Function {
            receiver,
            params: params.into_iter().collect::<TypeList>(),
            return_type,
            reflective,
        })
    }

    pub fn property(&self, receiver: Option<TypeId>, value: TypeId, mutable: bool) -> TypeId {
        self.intern(TypeData::Property {
            receiver,
            value,
            mutable,
        })
    }

    /// The same type with its nullability flag set to `nullable`.
    ///
    /// Types without a nullability flag are returned unchanged.
    pub fn with_nullability(&self, id: TypeId, nullable: bool) -> TypeId {
        let Some(data) = self.lookup(id) else {
            return id;
        };
        match &*data {
            TypeData::Class {
                class,
                args,
                annotations,
                ..
            } => self.intern(TypeData::Class {
                class: *class,
                args: args.clone(),
                nullable,
                annotations: annotations.clone(),
            }),
            TypeData::TypeParameter { param, .. } => self.intern(TypeData::TypeParameter {
                param: *param,
                nullable,
            }),
            _ => id,
        }
    }

    pub fn is_nullable(&self, id: TypeId) -> bool {
        self.lookup(id).is_some_and(|d| d.is_nullable())
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
