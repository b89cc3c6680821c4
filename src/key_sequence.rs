//! [`KeySequence`] — an immutable ordered tuple of keys (§4.2).

use std::fmt;
use std::sync::Arc;

/// An immutable ordered tuple of keys, used both as a dictionary key and as
/// a composable index into a multi-dimensional array.
///
/// Two sequences are equal iff element-wise equal. The backing storage is a
/// shared, reference-counted slice so that cloning a `KeySequence` (e.g. to
/// build a prefix) never copies the label strings themselves.
#[derive(Clone, Eq)]
pub struct KeySequence<K> {
    keys: Arc<[K]>,
}

impl<K> KeySequence<K> {
    #[must_use]
    pub fn new(keys: Vec<K>) -> Self {
        Self { keys: keys.into() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[K] {
        &self.keys
    }

    /// Concatenates two sequences into a new one.
    #[must_use]
    pub fn combine(&self, other: &KeySequence<K>) -> KeySequence<K>
    where
        K: Clone,
    {
        let mut combined = Vec::with_capacity(self.len() + other.len());
        combined.extend_from_slice(&self.keys);
        combined.extend_from_slice(&other.keys);
        KeySequence::new(combined)
    }

    /// Returns `true` if `self` is a prefix of `other` (or equal to it).
    #[must_use]
    pub fn is_prefix_of(&self, other: &KeySequence<K>) -> bool
    where
        K: PartialEq,
    {
        self.len() <= other.len() && self.keys.iter().zip(other.keys.iter()).all(|(a, b)| a == b)
    }
}

impl<K: PartialEq> PartialEq for KeySequence<K> {
    fn eq(&self, other: &Self) -> bool {
        self.keys.as_ref() == other.keys.as_ref()
    }
}

impl<K: std::hash::Hash> std::hash::Hash for KeySequence<K> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for k in self.keys.iter() {
            k.hash(state);
        }
    }
}

impl<K> From<K> for KeySequence<K> {
    /// A single key is interchangeable with a length-1 sequence.
    fn from(key: K) -> Self {
        KeySequence::new(vec![key])
    }
}

impl<K> From<Vec<K>> for KeySequence<K> {
    fn from(keys: Vec<K>) -> Self {
        KeySequence::new(keys)
    }
}

impl<K: fmt::Display> fmt::Display for KeySequence<K> {
    /// The canonical string form `[k1][k2]…[kN]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for k in self.keys.iter() {
            write!(f, "[{k}]")?;
        }
        Ok(())
    }
}

impl<K: fmt::Debug> fmt::Debug for KeySequence<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeySequence").field(&self.keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_element_wise() {
        let a = KeySequence::new(vec!["c1".to_string(), "c2".to_string()]);
        let b = KeySequence::new(vec!["c1".to_string(), "c2".to_string()]);
        let c = KeySequence::new(vec!["c2".to_string(), "c1".to_string()]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn single_key_is_length_one() {
        let seq: KeySequence<String> = "c1".to_string().into();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.as_slice(), &["c1".to_string()]);
    }

    #[test]
    fn combine_concatenates() {
        let a = KeySequence::new(vec!["c1".to_string()]);
        let b = KeySequence::new(vec!["c2".to_string()]);
        let combined = a.combine(&b);
        assert_eq!(combined.as_slice(), &["c1".to_string(), "c2".to_string()]);
    }

    #[test]
    fn canonical_string_form() {
        let seq = KeySequence::new(vec!["c1", "c2"]);
        assert_eq!(seq.to_string(), "[c1][c2]");
    }

    #[test]
    fn prefix_matching() {
        let prefix = KeySequence::new(vec!["r1"]);
        let full = KeySequence::new(vec!["r1", "c2"]);
        let other = KeySequence::new(vec!["r2", "c2"]);
        assert!(prefix.is_prefix_of(&full));
        assert!(!prefix.is_prefix_of(&other));
    }
}
