use crate::limits::SMALL_COLLECTION_THRESHOLD;
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use std::fmt;
use std::hash::Hash;

#[derive(Clone)]
enum Repr<T> {
    Empty,
    Single(T),
    /// 2..threshold elements in insertion order.
    Array(Vec<T>),
    Hashed(IndexSet<T, FxBuildHasher>),
}

/// An insertion-ordered set optimized for small sizes.
///
/// Empty and singleton sets carry no allocation; up to `threshold - 1`
/// elements live in a flat vector; adding a new element beyond that moves
/// everything, in order, into an `IndexSet`. Removal is not supported.
#[derive(Clone)]
pub struct SmartSet<T> {
    repr: Repr<T>,
    len: usize,
}

impl<T> Default for SmartSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SmartSet<T> {
    pub const fn new() -> Self {
        Self {
            repr: Repr::Empty,
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

    #[inline]
    pub fn is_hashed(&self) -> bool {
        matches!(self.repr, Repr::Hashed(_))
    }

    pub fn clear(&mut self) {
        self.repr = Repr::Empty;
        self.len = 0;
    }

    pub fn iter(&self) -> Iter<'_, T> {
        match &self.repr {
            Repr::Empty => Iter::Slice(Default::default()),
            Repr::Single(value) => Iter::Slice(std::slice::from_ref(value).iter()),
            Repr::Array(values) => Iter::Slice(values.iter()),
            Repr::Hashed(set) => Iter::Hashed(set.iter()),
        }
    }

    /// The only element, if the set holds exactly one.
    pub fn single(&self) -> Option<&T> {
        match &self.repr {
            Repr::Single(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Hash + Eq> SmartSet<T> {
    /// Add `value`; returns `false` if it was already present.
    pub fn insert(&mut self, value: T) -> bool {
        let repr = std::mem::replace(&mut self.repr, Repr::Empty);
        let (repr, added) = match repr {
            Repr::Empty => (Repr::Single(value), true),
            Repr::Single(existing) => {
                if existing == value {
                    (Repr::Single(existing), false)
                } else {
                    (Repr::Array(vec![existing, value]), true)
                }
            }
            Repr::Array(mut values) => {
                if values.contains(&value) {
                    (Repr::Array(values), false)
                } else if self.len == SMALL_COLLECTION_THRESHOLD - 1 {
                    let mut set = IndexSet::with_capacity_and_hasher(
                        SMALL_COLLECTION_THRESHOLD * 2,
                        FxBuildHasher,
                    );
                    set.extend(values);
                    set.insert(value);
                    (Repr::Hashed(set), true)
                } else {
                    values.push(value);
                    (Repr::Array(values), true)
                }
            }
            Repr::Hashed(mut set) => {
                let added = set.insert(value);
                (Repr::Hashed(set), added)
            }
        };
        self.repr = repr;
        if added {
            self.len += 1;
        }
        added
    }

    pub fn contains(&self, value: &T) -> bool {
        match &self.repr {
            Repr::Empty => false,
            Repr::Single(existing) => existing == value,
            Repr::Array(values) => values.contains(value),
            Repr::Hashed(set) => set.contains(value),
        }
    }
}

pub enum Iter<'a, T> {
    Slice(std::slice::Iter<'a, T>),
    Hashed(indexmap::set::Iter<'a, T>),
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Slice(it) => it.next(),
            Iter::Hashed(it) => it.next(),
        }
    }
}

impl<'a, T> IntoIterator for &'a SmartSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Hash + Eq> Extend<T> for SmartSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Hash + Eq> FromIterator<T> for SmartSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = SmartSet::new();
        set.extend(iter);
        set
    }
}

impl<T: Hash + Eq> PartialEq for SmartSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|v| other.contains(v))
    }
}

impl<T: Hash + Eq> Eq for SmartSet<T> {}

impl<T: fmt::Debug> fmt::Debug for SmartSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
