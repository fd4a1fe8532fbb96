//! Shared analysis state and per-expression resolution contexts.
//!
//! [`CheckerContext`] borrows everything one unit analysis reads: the AST,
//! strings, types, descriptors, scopes and options. [`ResolutionContext`] is
//! the small immutable snapshot threaded through callable resolution; the
//! `replace_*` methods derive new contexts without touching the original.
//! The binding trace is passed alongside a resolution context rather than
//! stored in it, so speculative layers can borrow it mutably.

use crate::error::{CheckerError, CheckerResult};
use crate::options::CheckerOptions;
use crate::scope::{ResolutionScope, ScopeTable};
use ktc_ast::{NodeArena, NodeIndex, NodeKind};
use ktc_common::{Atom, Interner, SmartMap, merge_maps};
use ktc_solver::class_hierarchy::ClassHierarchy;
use ktc_solver::{
    CallableDescriptor, CallableId, Container, DescriptorTable, KnownNames, TypeData,
    TypeFormatter, TypeId, TypeInterner,
};
use std::sync::Arc;

// =============================================================================
// CheckerContext
// =============================================================================

pub struct CheckerContext<'a> {
    pub arena: &'a NodeArena,
    pub interner: &'a Interner,
    pub types: &'a TypeInterner,
    pub table: &'a DescriptorTable,
    pub names: &'a KnownNames,
    pub scopes: &'a ScopeTable,
    pub options: &'a CheckerOptions,
}

impl<'a> CheckerContext<'a> {
    pub fn new(
        arena: &'a NodeArena,
        interner: &'a Interner,
        types: &'a TypeInterner,
        table: &'a DescriptorTable,
        names: &'a KnownNames,
        scopes: &'a ScopeTable,
        options: &'a CheckerOptions,
    ) -> Self {
        Self {
            arena,
            interner,
            types,
            table,
            names,
            scopes,
            options,
        }
    }

    pub fn name(&self, atom: Atom) -> &'a str {
        self.interner.resolve(atom)
    }

    pub fn callable(&self, id: CallableId) -> CheckerResult<&'a CallableDescriptor> {
        self.table
            .callable(id)
            .ok_or(CheckerError::UnknownCallable(id.0))
    }

    pub fn kind(&self, node: NodeIndex) -> CheckerResult<&'a NodeKind> {
        self.arena.kind(node).ok_or(CheckerError::MalformedAst {
            node: node.0,
            expected: "node",
        })
    }

    pub fn hierarchy(&self) -> ClassHierarchy<'a> {
        ClassHierarchy::new(self.table)
    }

    pub fn formatter(&self) -> TypeFormatter<'a> {
        TypeFormatter::new(self.types, self.table, self.interner)
    }
}

// =============================================================================
// Resolution context pieces
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExpectedType {
    #[default]
    NoExpectedType,
    Known(TypeId),
}

impl ExpectedType {
    pub fn is_unknown(self) -> bool {
        matches!(self, ExpectedType::NoExpectedType)
    }

    /// Parameter count of an expected function type, receiver included.
    pub fn function_arity(self, types: &TypeInterner) -> Option<usize> {
        let ExpectedType::Known(ty) = self else {
            return None;
        };
        match types.lookup(ty).as_deref() {
            Some(TypeData::Function {
                receiver, params, ..
            }) => Some(params.len() + usize::from(receiver.is_some())),
            _ => None,
        }
    }
}

impl From<Option<TypeId>> for ExpectedType {
    fn from(ty: Option<TypeId>) -> Self {
        ty.map_or(ExpectedType::NoExpectedType, ExpectedType::Known)
    }
}

/// Whether the enclosing call still infers types through this expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContextDependency {
    #[default]
    Independent,
    Dependent,
}

/// What argument checking the overload collaborator performs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CheckArgumentTypesMode {
    #[default]
    CheckValueArguments,
    /// Candidates are compared against an expected function type by arity.
    CheckCallableType,
}

/// Smart-cast facts: variables known to hold a narrower type.
///
/// Cloning shares the underlying map; [`with_fact`](Self::with_fact) copies
/// on write.
#[derive(Clone, Debug, Default)]
pub struct DataFlowInfo {
    facts: Arc<SmartMap<CallableId, TypeId>>,
}

impl DataFlowInfo {
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fact(&self, variable: CallableId, ty: TypeId) -> Self {
        let mut facts = (*self.facts).clone();
        facts.insert(variable, ty);
        Self {
            facts: Arc::new(facts),
        }
    }

    pub fn fact(&self, variable: CallableId) -> Option<TypeId> {
        self.facts.get(&variable).copied()
    }

    /// Facts of both; `other` wins where both know a variable.
    #[must_use]
    pub fn and(&self, other: &DataFlowInfo) -> Self {
        Self {
            facts: Arc::new(merge_maps(&self.facts, &other.facts, |_, second| *second)),
        }
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

// =============================================================================
// ResolutionContext
// =============================================================================

#[derive(Clone, Debug)]
pub struct ResolutionContext {
    pub scope: ResolutionScope,
    pub expected_type: ExpectedType,
    pub data_flow_info: DataFlowInfo,
    pub dependency: ContextDependency,
    pub check_arguments: CheckArgumentTypesMode,
}

impl ResolutionContext {
    pub fn new(scope: ResolutionScope) -> Self {
        Self {
            scope,
            expected_type: ExpectedType::NoExpectedType,
            data_flow_info: DataFlowInfo::empty(),
            dependency: ContextDependency::Independent,
            check_arguments: CheckArgumentTypesMode::CheckValueArguments,
        }
    }

    #[must_use]
    pub fn replace_scope(&self, scope: ResolutionScope) -> Self {
        Self {
            scope,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn replace_expected_type(&self, expected_type: ExpectedType) -> Self {
        Self {
            expected_type,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn replace_data_flow_info(&self, data_flow_info: DataFlowInfo) -> Self {
        Self {
            data_flow_info,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn replace_dependency(&self, dependency: ContextDependency) -> Self {
        Self {
            dependency,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn replace_check_arguments(&self, check_arguments: CheckArgumentTypesMode) -> Self {
        Self {
            check_arguments,
            ..self.clone()
        }
    }

    pub fn containing_declaration(&self, scopes: &ScopeTable) -> Container {
        self.scope.containing_declaration(scopes)
    }
}

#[cfg(test)]
#[path = "../tests/context_tests.rs"]
mod tests;
