//! Small insertion-ordered containers.
//!
//! Most maps and sets in the resolver and the dataflow engine hold a handful
//! of entries (properties of one class, candidates at one scope level). These
//! containers keep such contents in a flat array and only move to a
//! hash-backed representation once they grow past
//! [`SMALL_COLLECTION_THRESHOLD`](crate::limits::SMALL_COLLECTION_THRESHOLD).
//! Both representations iterate in insertion order. Neither supports removal.

mod smart_map;
mod smart_set;

pub use smart_map::SmartMap;
pub use smart_set::SmartSet;

use std::hash::Hash;

/// Union of two maps; keys present in both are combined with `merge`.
///
/// Iteration order is `first`'s keys followed by keys only in `second`.
pub fn merge_maps<K, V, F>(first: &SmartMap<K, V>, second: &SmartMap<K, V>, merge: F) -> SmartMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
    F: Fn(&V, &V) -> V,
{
    let mut result = first.clone();
    merge_maps_into_first(&mut result, second, merge);
    result
}

/// In-place variant of [`merge_maps`]: `first` receives the union.
pub fn merge_maps_into_first<K, V, F>(first: &mut SmartMap<K, V>, second: &SmartMap<K, V>, merge: F)
where
    K: Hash + Eq + Clone,
    V: Clone,
    F: Fn(&V, &V) -> V,
{
    for (key, value2) in second.iter() {
        let merged = match first.get(key) {
            Some(value1) => merge(value1, value2),
            None => value2.clone(),
        };
        first.insert(key.clone(), merged);
    }
}
