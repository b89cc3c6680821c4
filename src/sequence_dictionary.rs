//! [`SequenceDictionary`] — an ordered map from [`KeySequence`] to a value,
//! with prefix lookup and logical (cross-product) enumeration (§3, §4.2).

use std::collections::HashMap;

use crate::key_sequence::KeySequence;
use crate::set_expansion::{Set, SetExpansion};

/// An ordered mapping from [`KeySequence<K>`] to `V`.
///
/// Preserves insertion order (used when re-emitting a file byte-identically)
/// while also supporting O(1) direct lookup and prefix lookup.
#[derive(Clone, Debug, Default)]
pub struct SequenceDictionary<K, V> {
    entries: Vec<(KeySequence<K>, V)>,
    index: HashMap<KeySequence<K>, usize>,
    sets: Vec<Set>,
}

impl<K, V> SequenceDictionary<K, V>
where
    K: Clone + Eq + std::hash::Hash,
{
    /// Creates an empty dictionary over the given set list (the dictionary
    /// retains the sets so a reader/writer can compute cross-products on
    /// demand without threading them through separately).
    #[must_use]
    pub fn new(sets: Vec<Set>) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            sets,
        }
    }

    #[must_use]
    pub fn with_capacity(sets: Vec<Set>, capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            sets,
        }
    }

    #[must_use]
    pub fn sets(&self) -> &[Set] {
        &self.sets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a value at `key`, preserving first-seen insertion order. A
    /// repeat insert at an existing key overwrites the value in place
    /// without disturbing iteration order.
    pub fn insert(&mut self, key: KeySequence<K>, value: V) {
        if let Some(&idx) = self.index.get(&key) {
            self.entries[idx].1 = value;
        } else {
            let idx = self.entries.len();
            self.index.insert(key.clone(), idx);
            self.entries.push((key, value));
        }
    }

    /// Direct O(1) lookup by full key.
    #[must_use]
    pub fn get(&self, key: &KeySequence<K>) -> Option<&V> {
        self.index.get(key).map(|&idx| &self.entries[idx].1)
    }

    /// Returns every entry whose key begins with `prefix`. A length-1
    /// prefix over a 3-axis dictionary returns the slice along the first
    /// axis.
    pub fn prefix_get(&self, prefix: &KeySequence<K>) -> Vec<(&KeySequence<K>, &V)> {
        self.entries
            .iter()
            .filter(|(k, _)| prefix.is_prefix_of(k))
            .map(|(k, v)| (k, v))
            .collect()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&KeySequence<K>, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl<V> SequenceDictionary<String, V> {
    /// Iterates entries in *logical enumeration* order: the set
    /// cross-product order (§4.3), rather than insertion order. Entries
    /// missing from the dictionary are skipped (sparse dictionaries do not
    /// materialise a value for every logical key).
    pub fn iter_logical(&self) -> impl Iterator<Item = (KeySequence<String>, &V)> {
        SetExpansion::new(&self.sets).filter_map(move |key| {
            let value = self.get(&key)?;
            Some((key, value))
        })
    }
}
