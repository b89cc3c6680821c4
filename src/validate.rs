//! Cross-array set consistency diagnostic (§2 `validate_sets`).

use std::collections::HashMap;
use std::io::Write;

use tracing::warn;

use crate::file::HeaderArrayFile;
use crate::header_array::HeaderArrayMeta;
use crate::set_expansion::Set;

/// Walks `collection` and reports, via `sink`, every set name whose label
/// list differs between the arrays that use it. Never raises: a malformed
/// or inconsistent collection is a diagnostic finding, not a parse failure.
///
/// Returns `true` if every set name was used consistently across the whole
/// collection.
pub fn validate_sets(collection: &HeaderArrayFile, mut sink: impl Write) -> bool {
    let mut seen: HashMap<&str, (&str, &Set)> = HashMap::new();
    let mut consistent = true;

    for array in collection.iter() {
        for set in array.sets() {
            match seen.get(set.name()) {
                None => {
                    seen.insert(set.name(), (array.header(), set));
                }
                Some((first_header, first_set)) => {
                    if first_set.labels() != set.labels() {
                        consistent = false;
                        warn!(
                            set = set.name(),
                            first_header,
                            second_header = array.header(),
                            "set label list diverges across arrays"
                        );
                        let _ = writeln!(
                            sink,
                            "set {:?} diverges: {:?} declares {} labels, {:?} declares {}",
                            set.name(),
                            first_header,
                            first_set.len(),
                            array.header(),
                            set.len()
                        );
                    }
                }
            }
        }
    }

    consistent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header_array::{HeaderArray, HeaderArrayData, RecordType, Storage};
    use crate::key_sequence::KeySequence;
    use crate::sequence_dictionary::SequenceDictionary;

    fn array_with_set(header: &str, set_name: &str, labels: &[&str]) -> HeaderArray {
        let sets = vec![Set::new(
            set_name,
            labels.iter().map(|s| s.to_string()).collect(),
        )];
        let mut dict: SequenceDictionary<String, f32> = SequenceDictionary::new(sets);
        for label in labels {
            dict.insert(KeySequence::new(vec![label.to_string()]), 1.0);
        }
        HeaderArray::new(
            header,
            header,
            "",
            RecordType::Real,
            Storage::Full,
            vec![labels.len() as i32],
            HeaderArrayData::Floats(dict),
        )
        .unwrap()
    }

    #[test]
    fn reports_no_divergence_for_consistent_sets() {
        let mut file = HeaderArrayFile::new();
        file.insert(array_with_set("A", "REG", &["r1", "r2"])).unwrap();
        file.insert(array_with_set("B", "REG", &["r1", "r2"])).unwrap();
        let mut sink = Vec::new();
        assert!(validate_sets(&file, &mut sink));
        assert!(sink.is_empty());
    }

    #[test]
    fn reports_divergence_when_labels_differ() {
        let mut file = HeaderArrayFile::new();
        file.insert(array_with_set("A", "REG", &["r1", "r2"])).unwrap();
        file.insert(array_with_set("B", "REG", &["r1", "r2", "r3"]))
            .unwrap();
        let mut sink = Vec::new();
        assert!(!validate_sets(&file, &mut sink));
        let report = String::from_utf8(sink).unwrap();
        assert!(report.contains("REG"));
    }
}
