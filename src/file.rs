//! [`HeaderArrayFile`] — the in-memory ordered collection of [`HeaderArray`]
//! values produced by a read and consumed by a write (SPEC_FULL.md §3.1).

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::header_array::{HeaderArray, HeaderArrayMeta};

/// An owned collection of [`HeaderArray`] values, keyed by `header`.
///
/// Preserves insertion order for byte-identical re-emission (`iter`), while
/// also exposing a deterministic ascending-header order (`iter_sorted`) for
/// consumers that enumerate without caring about on-disk order (§5
/// Ordering).
#[derive(Clone, Debug, Default)]
pub struct HeaderArrayFile {
    arrays: Vec<HeaderArray>,
    index: HashMap<String, usize>,
}

impl HeaderArrayFile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from a vector, preserving its order. Fails if
    /// any two arrays share a `header`.
    pub fn from_vec(arrays: Vec<HeaderArray>) -> Result<Self> {
        let mut file = Self::new();
        for array in arrays {
            file.insert(array)?;
        }
        Ok(file)
    }

    /// Inserts an array, preserving insertion order. A duplicate `header`
    /// is an `InvalidArgument` error (§3 "`header` uniquely keys an array
    /// within a file", §7).
    pub fn insert(&mut self, array: HeaderArray) -> Result<()> {
        let header = array.header().to_string();
        if self.index.contains_key(&header) {
            return Err(Error::InvalidArgument(format!(
                "duplicate header {header:?}: header must uniquely key an array within a file"
            )));
        }
        self.index.insert(header, self.arrays.len());
        self.arrays.push(array);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, header: &str) -> Option<&HeaderArray> {
        self.index.get(header).map(|&idx| &self.arrays[idx])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Iterates in insertion/file order.
    pub fn iter(&self) -> impl Iterator<Item = &HeaderArray> {
        self.arrays.iter()
    }

    /// Iterates in ascending-header order (§5 Ordering).
    pub fn iter_sorted(&self) -> impl Iterator<Item = &HeaderArray> {
        let mut sorted: Vec<&HeaderArray> = self.arrays.iter().collect();
        sorted.sort_by(|a, b| a.header().cmp(b.header()));
        sorted.into_iter()
    }
}

impl IntoIterator for HeaderArrayFile {
    type Item = HeaderArray;
    type IntoIter = std::vec::IntoIter<HeaderArray>;

    fn into_iter(self) -> Self::IntoIter {
        self.arrays.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header_array::{HeaderArrayData, RecordType, Storage};
    use crate::key_sequence::KeySequence;
    use crate::sequence_dictionary::SequenceDictionary;
    use crate::set_expansion::Set;

    fn scalar(header: &str) -> HeaderArray {
        let sets = vec![Set::new(header, vec![header.to_string()])];
        let mut dict = SequenceDictionary::new(sets);
        dict.insert(KeySequence::new(vec![header.to_string()]), 1.0f32);
        HeaderArray::new(
            header,
            header,
            "",
            RecordType::Real,
            Storage::Full,
            vec![1],
            HeaderArrayData::Floats(dict),
        )
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_headers() {
        let mut file = HeaderArrayFile::new();
        file.insert(scalar("TEST")).unwrap();
        let err = file.insert(scalar("TEST")).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn preserves_insertion_order() {
        let file = HeaderArrayFile::from_vec(vec![scalar("ZETA"), scalar("ALFA")]).unwrap();
        let headers: Vec<&str> = file.iter().map(HeaderArrayMeta::header).collect();
        assert_eq!(headers, vec!["ZETA", "ALFA"]);
    }

    #[test]
    fn sorted_iteration_is_ascending() {
        let file = HeaderArrayFile::from_vec(vec![scalar("ZETA"), scalar("ALFA")]).unwrap();
        let headers: Vec<&str> = file.iter_sorted().map(HeaderArrayMeta::header).collect();
        assert_eq!(headers, vec!["ALFA", "ZETA"]);
    }
}
