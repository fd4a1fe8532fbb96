//! Class hierarchy queries over the descriptor table.
//!
//! The supertype graph is expected to be acyclic; walks still carry a
//! visited set so malformed input terminates.

use crate::TypeInterner;
use crate::descriptors::{ClassId, DescriptorTable};
use crate::types::{TypeData, TypeId};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

pub struct ClassHierarchy<'a> {
    table: &'a DescriptorTable,
}

impl<'a> ClassHierarchy<'a> {
    pub fn new(table: &'a DescriptorTable) -> Self {
        Self { table }
    }

    /// All transitive supertypes of `class` in breadth-first order, excluding
    /// `class` itself.
    pub fn supertype_closure(&self, class: ClassId) -> Vec<ClassId> {
        let mut visited = FxHashSet::default();
        visited.insert(class);
        let mut queue: VecDeque<ClassId> = VecDeque::new();
        let mut out = Vec::new();
        if let Some(desc) = self.table.class(class) {
            queue.extend(desc.supertypes.iter().copied());
        }
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            out.push(current);
            if let Some(desc) = self.table.class(current) {
                queue.extend(desc.supertypes.iter().copied());
            }
        }
        out
    }

    /// `sub` is `sup` or inherits from it.
    pub fn is_subclass_of(&self, sub: ClassId, sup: ClassId) -> bool {
        sub == sup || self.supertype_closure(sub).contains(&sup)
    }

    /// Whether a value of type `receiver` can be passed where `expected` is
    /// required as a receiver.
    ///
    /// Only classifier identity is compared; type parameters and non-class
    /// types on either side are accepted.
    pub fn is_receiver_applicable(&self, types: &TypeInterner, receiver: TypeId, expected: TypeId) -> bool {
        let (Some(receiver_data), Some(expected_data)) = (types.lookup(receiver), types.lookup(expected))
        else {
            return false;
        };
        match (&*receiver_data, &*expected_data) {
            (TypeData::Class { class: sub, .. }, TypeData::Class { class: sup, .. }) => {
                self.is_subclass_of(*sub, *sup)
            }
            (TypeData::Error, _) | (_, TypeData::Error) => false,
            _ => true,
        }
    }
}

#[cfg(test)]
#[path = "../tests/class_hierarchy_tests.rs"]
mod tests;
