//! Sets and [`SetExpansion`] — the cross-product of an ordered list of sets
//! into [`KeySequence`] values, innermost axis varying fastest (§3, §4.3).

use crate::key_sequence::KeySequence;

/// A named, ordered collection of distinct label strings defining one axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Set {
    name: String,
    labels: Vec<String>,
}

impl Set {
    #[must_use]
    pub fn new(name: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Lazily enumerates the cross product of an ordered list of [`Set`]s as
/// [`KeySequence<String>`] values.
///
/// The **last listed axis varies fastest** (row-major), matching how HAR
/// values are laid out in the dense data block. An empty set list yields a
/// single empty sequence. The iterator never materialises the full
/// cross-product up front.
pub struct SetExpansion<'a> {
    sets: &'a [Set],
    /// Current per-axis label index; `None` once exhausted.
    indices: Option<Vec<usize>>,
    /// `true` only for the very first `next()` call, to emit the
    /// single empty sequence when `sets` is empty.
    emitted_empty: bool,
}

impl<'a> SetExpansion<'a> {
    #[must_use]
    pub fn new(sets: &'a [Set]) -> Self {
        let indices = if sets.is_empty() {
            None
        } else if sets.iter().any(Set::is_empty) {
            None
        } else {
            Some(vec![0; sets.len()])
        };
        Self {
            sets,
            indices,
            emitted_empty: false,
        }
    }

    /// Total number of sequences this expansion will yield:
    /// `product(|sets[i]|)`.
    #[must_use]
    pub fn len(sets: &[Set]) -> usize {
        if sets.is_empty() {
            1
        } else {
            sets.iter().map(Set::len).product()
        }
    }
}

impl<'a> Iterator for SetExpansion<'a> {
    type Item = KeySequence<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.sets.is_empty() {
            return if self.emitted_empty {
                None
            } else {
                self.emitted_empty = true;
                Some(KeySequence::new(Vec::new()))
            };
        }

        let indices = self.indices.as_mut()?;
        let keys: Vec<String> = indices
            .iter()
            .zip(self.sets.iter())
            .map(|(&i, set)| set.labels[i].clone())
            .collect();

        // Advance the odometer: the *last* axis is the fastest-varying.
        let mut axis = indices.len();
        loop {
            if axis == 0 {
                self.indices = None;
                break;
            }
            axis -= 1;
            indices[axis] += 1;
            if indices[axis] < self.sets[axis].len() {
                break;
            }
            indices[axis] = 0;
            if axis == 0 {
                self.indices = None;
                break;
            }
        }

        Some(KeySequence::new(keys))
    }
}

/// Expands the cross product of `sets` restricted to an inclusive, 0-based
/// `[start, end]` range per axis, in the same last-axis-fastest order as
/// [`SetExpansion`]. Used by the `RE`/`2I`/`2R` segment codecs to zip a
/// contiguous on-disk slab onto its labels without materialising the full
/// array (§4.4.2 extents blocks).
#[must_use]
pub fn bounded_expand(sets: &[Set], bounds: &[(usize, usize)]) -> Vec<KeySequence<String>> {
    if sets.is_empty() {
        return vec![KeySequence::new(Vec::new())];
    }
    let mut indices: Vec<usize> = bounds.iter().map(|&(start, _)| start).collect();
    let mut out = Vec::new();
    loop {
        let keys: Vec<String> = indices
            .iter()
            .zip(sets.iter())
            .map(|(&i, set)| set.labels[i].clone())
            .collect();
        out.push(KeySequence::new(keys));

        let mut axis = indices.len();
        loop {
            if axis == 0 {
                return out;
            }
            axis -= 1;
            indices[axis] += 1;
            if indices[axis] <= bounds[axis].1 {
                break;
            }
            indices[axis] = bounds[axis].0;
            if axis == 0 {
                return out;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seqs(sets: &[Set]) -> Vec<Vec<String>> {
        SetExpansion::new(sets)
            .map(|k| k.as_slice().to_vec())
            .collect()
    }

    #[test]
    fn empty_sets_yield_single_empty_sequence() {
        let result = seqs(&[]);
        assert_eq!(result, vec![Vec::<String>::new()]);
    }

    #[test]
    fn single_axis_expands_in_order() {
        let s = Set::new("COM", vec!["c1".into(), "c2".into(), "c3".into()]);
        let result = seqs(&[s]);
        assert_eq!(result, vec![vec!["c1"], vec!["c2"], vec!["c3"]]);
    }

    #[test]
    fn two_axes_innermost_varies_fastest() {
        let a = Set::new("ROW", vec!["r1".into(), "r2".into()]);
        let b = Set::new("COL", vec!["c1".into(), "c2".into()]);
        let result = seqs(&[a, b]);
        assert_eq!(
            result,
            vec![
                vec!["r1", "c1"],
                vec!["r1", "c2"],
                vec!["r2", "c1"],
                vec!["r2", "c2"],
            ]
        );
    }

    #[test]
    fn shared_vocabulary_axes_s3() {
        let a = Set::new("COM", vec!["c1".into(), "c2".into()]);
        let b = Set::new("COM", vec!["c1".into(), "c2".into()]);
        let result = seqs(&[a, b]);
        assert_eq!(
            result,
            vec![
                vec!["c1", "c1"],
                vec!["c1", "c2"],
                vec!["c2", "c1"],
                vec!["c2", "c2"],
            ]
        );
    }

    #[test]
    fn count_matches_product_of_cardinalities() {
        let a = Set::new("A", vec!["1".into(), "2".into(), "3".into()]);
        let b = Set::new("B", vec!["x".into(), "y".into()]);
        assert_eq!(SetExpansion::len(&[a.clone(), b.clone()]), 6);
        assert_eq!(seqs(&[a, b]).len(), 6);
    }

    #[test]
    fn bounded_expand_restricts_to_slab() {
        let a = Set::new("ROW", vec!["r1".into(), "r2".into(), "r3".into()]);
        let b = Set::new("COL", vec!["c1".into(), "c2".into()]);
        let slab = bounded_expand(&[a, b], &[(1, 2), (0, 1)]);
        let labels: Vec<Vec<String>> = slab.into_iter().map(|k| k.as_slice().to_vec()).collect();
        assert_eq!(
            labels,
            vec![
                vec!["r2", "c1"],
                vec!["r2", "c2"],
                vec!["r3", "c1"],
                vec!["r3", "c2"],
            ]
        );
    }

    #[test]
    fn re_entrant() {
        let a = Set::new("A", vec!["1".into(), "2".into()]);
        let first: Vec<_> = seqs(std::slice::from_ref(&a));
        let second: Vec<_> = seqs(std::slice::from_ref(&a));
        assert_eq!(first, second);
    }
}
