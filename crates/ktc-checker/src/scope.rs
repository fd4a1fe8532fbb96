//! Lookup scopes for callable resolution.
//!
//! The external resolver hands over the lexical scope chain of a unit as a
//! [`ScopeTable`]: each scope lists the callables it declares and links to
//! its parent. Classes additionally expose two synthetic views, the static
//! scope and the static nested-classifier scope, which are computed from
//! the descriptor table on demand.

use ktc_common::Atom;
use ktc_solver::{CallableId, ClassId, Container, DescriptorTable};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeData {
    pub parent: Option<ScopeId>,
    /// Declaration the scope belongs to.
    pub owner: Container,
    /// Callables declared directly in this scope.
    pub declarations: Vec<CallableId>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeTable {
    scopes: Vec<ScopeData>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, parent: Option<ScopeId>, owner: Container, declarations: Vec<CallableId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeData {
            parent,
            owner,
            declarations,
        });
        id
    }

    pub fn get(&self, id: ScopeId) -> Option<&ScopeData> {
        self.scopes.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// `id` and its ancestors, nearest first. A parent cycle ends the chain.
    pub fn chain(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut current = Some(id);
        while let Some(scope) = current {
            let Some(data) = self.get(scope) else {
                break;
            };
            if !seen.insert(scope) {
                break;
            }
            out.push(scope);
            current = data.parent;
        }
        out
    }

    /// Number of scopes on the chain from `id` to the root, `id` included.
    pub fn depth(&self, id: ScopeId) -> usize {
        self.chain(id).len()
    }

    pub fn owner(&self, id: ScopeId) -> Container {
        self.get(id).map_or(Container::Package, |s| s.owner)
    }
}

/// Where a name is looked up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionScope {
    /// A lexical scope and its ancestors.
    Lexical(ScopeId),
    /// Members of a class reachable without an instance.
    Static(ClassId),
    /// Constructors of the nested classes of a class.
    NestedClassifiers(ClassId),
}

impl ResolutionScope {
    /// Candidates named `name`, grouped by priority level, nearest first.
    ///
    /// A lexical scope contributes one level per scope on its chain; the
    /// class views contribute a single level.
    pub fn candidate_levels(
        self,
        scopes: &ScopeTable,
        table: &DescriptorTable,
        name: Atom,
    ) -> Vec<Vec<CallableId>> {
        match self {
            ResolutionScope::Lexical(id) => scopes
                .chain(id)
                .into_iter()
                .filter_map(|scope| scopes.get(scope))
                .map(|scope| {
                    scope
                        .declarations
                        .iter()
                        .copied()
                        .filter(|c| table.callable(*c).is_some_and(|d| d.name == name))
                        .collect()
                })
                .collect(),
            ResolutionScope::Static(class) => vec![table.static_members_named(class, name)],
            ResolutionScope::NestedClassifiers(class) => {
                vec![table.nested_class_constructors_named(class, name)]
            }
        }
    }

    pub fn lexical(self) -> Option<ScopeId> {
        match self {
            ResolutionScope::Lexical(id) => Some(id),
            _ => None,
        }
    }

    /// Declaration that owns code resolved in this scope.
    pub fn containing_declaration(self, scopes: &ScopeTable) -> Container {
        match self {
            ResolutionScope::Lexical(id) => scopes.owner(id),
            ResolutionScope::Static(class) | ResolutionScope::NestedClassifiers(class) => {
                Container::Class(class)
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/scope_tests.rs"]
mod tests;
