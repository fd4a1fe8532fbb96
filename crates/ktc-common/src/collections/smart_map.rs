use crate::limits::SMALL_COLLECTION_THRESHOLD;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::fmt;
use std::hash::Hash;

#[derive(Clone)]
enum Repr<K, V> {
    /// Entries in insertion order; used while `len < SMALL_COLLECTION_THRESHOLD`.
    Array(Vec<(K, V)>),
    Hashed(IndexMap<K, V, FxBuildHasher>),
}

/// An insertion-ordered map optimized for small sizes.
///
/// Below the threshold entries live in a flat vector searched linearly.
/// Inserting a new key when the map already holds `threshold - 1` entries
/// moves every entry, in order, into an `IndexMap`; the map never moves back
/// except through [`SmartMap::clear`]. Removal is not supported.
#[derive(Clone)]
pub struct SmartMap<K, V> {
    repr: Repr<K, V>,
    len: usize,
}

impl<K, V> Default for SmartMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SmartMap<K, V> {
    pub const fn new() -> Self {
        Self {
            repr: Repr::Array(Vec::new()),
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the hash-backed representation is in use.
    #[inline]
    pub fn is_hashed(&self) -> bool {
        matches!(self.repr, Repr::Hashed(_))
    }

    /// Drop all entries and return to the array representation.
    pub fn clear(&mut self) {
        self.repr = Repr::Array(Vec::new());
        self.len = 0;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        match &self.repr {
            Repr::Array(entries) => Iter::Array(entries.iter()),
            Repr::Hashed(map) => Iter::Hashed(map.iter()),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}

impl<K: Hash + Eq, V> SmartMap<K, V> {
    /// Insert `value` under `key`, returning the previous value if the key was present.
    ///
    /// Replacing an existing key keeps its original position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match &mut self.repr {
            Repr::Array(entries) => {
                if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
                    return Some(std::mem::replace(&mut slot.1, value));
                }
                if self.len == SMALL_COLLECTION_THRESHOLD - 1 {
                    let mut map = IndexMap::with_capacity_and_hasher(
                        SMALL_COLLECTION_THRESHOLD * 2,
                        FxBuildHasher,
                    );
                    map.extend(std::mem::take(entries));
                    map.insert(key, value);
                    self.repr = Repr::Hashed(map);
                } else {
                    entries.push((key, value));
                }
                self.len += 1;
                None
            }
            Repr::Hashed(map) => {
                let previous = map.insert(key, value);
                self.len = map.len();
                previous
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.repr {
            Repr::Array(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Repr::Hashed(map) => map.get(key),
        }
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match &mut self.repr {
            Repr::Array(entries) => entries
                .iter_mut()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
            Repr::Hashed(map) => map.get_mut(key),
        }
    }

    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }
}

impl<K: Hash + Eq, V: PartialEq> SmartMap<K, V> {
    pub fn contains_value(&self, value: &V) -> bool {
        self.values().any(|v| v == value)
    }
}

/// Iterator over `(&K, &V)` pairs in insertion order.
pub enum Iter<'a, K, V> {
    Array(std::slice::Iter<'a, (K, V)>),
    Hashed(indexmap::map::Iter<'a, K, V>),
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Array(it) => it.next().map(|(k, v)| (k, v)),
            Iter::Hashed(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Iter::Array(it) => it.size_hint(),
            Iter::Hashed(it) => it.size_hint(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a SmartMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Hash + Eq, V> Extend<(K, V)> for SmartMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for SmartMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = SmartMap::new();
        map.extend(iter);
        map
    }
}

/// Map equality ignores insertion order.
impl<K: Hash + Eq, V: PartialEq> PartialEq for SmartMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Hash + Eq, V: Eq> Eq for SmartMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for SmartMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
