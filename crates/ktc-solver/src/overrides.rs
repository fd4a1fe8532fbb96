//! Traversal of the overrides relation.
//!
//! The relation is a DAG from a callable to the callables it directly
//! overrides. Walks keep a visited set and an iteration budget, so a cycle
//! in malformed input ends the walk instead of looping.

use crate::descriptors::{CallableDescriptor, CallableId, CallableKind, DescriptorTable};
use ktc_common::limits::MAX_OVERRIDE_TRAVERSAL;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::trace;

/// Breadth-first search over `start` and everything it transitively
/// overrides; returns the first callable satisfying `predicate`.
pub fn first_overridden<F>(table: &DescriptorTable, start: CallableId, mut predicate: F) -> Option<CallableId>
where
    F: FnMut(CallableId, &CallableDescriptor) -> bool,
{
    let mut visited = FxHashSet::default();
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        if visited.len() > MAX_OVERRIDE_TRAVERSAL {
            trace!(start = start.0, "override traversal budget exhausted");
            return None;
        }
        let Some(desc) = table.callable(current) else {
            continue;
        };
        if predicate(current, desc) {
            return Some(current);
        }
        queue.extend(desc.overridden.iter().copied());
    }
    None
}

/// Everything `start` transitively overrides, breadth-first, excluding `start`.
pub fn all_overridden(table: &DescriptorTable, start: CallableId) -> Vec<CallableId> {
    let mut out = Vec::new();
    first_overridden(table, start, |id, _| {
        if id != start {
            out.push(id);
        }
        false
    });
    out
}

/// The owning property for an accessor; any other callable maps to itself.
pub fn property_if_accessor(table: &DescriptorTable, callable: CallableId) -> CallableId {
    match table.callable(callable).map(|d| d.kind) {
        Some(CallableKind::PropertyGetter { property } | CallableKind::PropertySetter { property }) => {
            property
        }
        _ => callable,
    }
}

/// Finds a property among `candidates` whose getter or setter is `function`,
/// or, failing that, is an accessor of something `function` overrides.
///
/// Overridden functions are searched depth-first in declaration order, which
/// is the order the "use property access syntax" lookup reports them.
pub fn find_synthetic_property(
    table: &DescriptorTable,
    function: CallableId,
    candidates: &[CallableId],
) -> Option<CallableId> {
    let by_accessor = |accessor: CallableId| {
        candidates.iter().copied().find(|candidate| {
            matches!(
                table.callable(*candidate).map(|d| d.kind),
                Some(CallableKind::Property { getter, setter })
                    if getter == Some(accessor) || setter == Some(accessor)
            )
        })
    };

    let mut visited = FxHashSet::default();
    let mut stack = vec![function];
    while let Some(current) = stack.pop() {
        if !visited.insert(current) || visited.len() > MAX_OVERRIDE_TRAVERSAL {
            continue;
        }
        if let Some(found) = by_accessor(current) {
            return Some(found);
        }
        if let Some(desc) = table.callable(current) {
            stack.extend(desc.overridden.iter().rev().copied());
        }
    }
    None
}

#[cfg(test)]
#[path = "../tests/overrides_tests.rs"]
mod tests;
